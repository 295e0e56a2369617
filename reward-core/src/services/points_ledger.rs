//! Points Ledger Service
//!
//! The sole mutator of a donor's cached balance, lifetime donation
//! count and tier. Every mutation appends to the transaction log and
//! writes the donor row inside one SQLite transaction, holding the
//! donor's lock for the whole read-modify-write window, so the ledger
//! reconciliation invariant (`reward_points == SUM(points)`) holds at
//! every observable point, including across restarts.

use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};

use crate::db::repository::{donor, point_transaction};
use crate::loyalty::{milestone_bonus, tier_of, POINTS_PER_DONATION, POINTS_PER_REFERRAL};
use crate::utils::{AppError, AppResult, DonorLocks};
use shared::models::{DonorRewards, PointTransaction, PointTransactionCreate, TransactionType};

/// Points ledger over the donor rewards table and transaction log
#[derive(Clone)]
pub struct PointsLedger {
    pool: SqlitePool,
    locks: Arc<DonorLocks>,
}

impl PointsLedger {
    pub fn new(pool: SqlitePool, locks: Arc<DonorLocks>) -> Self {
        Self { pool, locks }
    }

    /// Award points for a completed donation.
    ///
    /// Credits the donation points, increments the lifetime count and
    /// recomputes the tier. When the post-increment count lands exactly
    /// on a milestone threshold the bonus is credited in the same
    /// operation as a separate MILESTONE row with its own running
    /// balance; the donor row is written once, with the final balance.
    pub async fn award_donation_points(
        &self,
        donor_id: &str,
        donation_id: &str,
    ) -> AppResult<DonorRewards> {
        let _guard = self.locks.acquire(donor_id).await;
        let mut tx = self.pool.begin().await?;

        let current = donor::ensure(&mut tx, donor_id).await?;
        let total_donations = current.total_donations + 1;
        let new_tier = tier_of(total_donations);

        let after_donation = current.reward_points + POINTS_PER_DONATION;
        point_transaction::append(
            &mut tx,
            PointTransactionCreate {
                donor_id: donor_id.to_string(),
                points: POINTS_PER_DONATION,
                transaction_type: TransactionType::Donation,
                description: "Blood Donation".to_string(),
                related_entity_id: Some(donation_id.to_string()),
                balance_after: after_donation,
            },
        )
        .await?;

        let bonus = milestone_bonus(total_donations);
        let final_balance = if bonus > 0 {
            let after_bonus = after_donation + bonus;
            point_transaction::append(
                &mut tx,
                PointTransactionCreate {
                    donor_id: donor_id.to_string(),
                    points: bonus,
                    transaction_type: TransactionType::Milestone,
                    description: format!("{new_tier} Donor Milestone Bonus"),
                    related_entity_id: Some(donation_id.to_string()),
                    balance_after: after_bonus,
                },
            )
            .await?;
            after_bonus
        } else {
            after_donation
        };

        let now = shared::util::now_millis();
        donor::update_stats(&mut tx, donor_id, final_balance, total_donations, &new_tier, now)
            .await?;
        tx.commit().await?;

        tracing::info!(
            donor_id = %donor_id,
            donation_id = %donation_id,
            total_donations,
            bonus,
            balance = final_balance,
            "Donation points awarded"
        );

        Ok(DonorRewards {
            donor_id: donor_id.to_string(),
            reward_points: final_balance,
            total_donations,
            donor_tier: new_tier,
            updated_at: now,
        })
    }

    /// Award the referral bonus. No tier or donation-count effect.
    pub async fn award_referral_points(
        &self,
        donor_id: &str,
        referred_user_id: &str,
    ) -> AppResult<DonorRewards> {
        let _guard = self.locks.acquire(donor_id).await;
        let mut tx = self.pool.begin().await?;
        let updated = credit_in_tx(
            &mut tx,
            donor_id,
            POINTS_PER_REFERRAL,
            TransactionType::Referral,
            "Referral Bonus".to_string(),
            Some(referred_user_id.to_string()),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            donor_id = %donor_id,
            referred_user_id = %referred_user_id,
            balance = updated.reward_points,
            "Referral points awarded"
        );
        Ok(updated)
    }

    /// Debit points, failing with `InsufficientPoints` when the balance
    /// does not cover the amount.
    pub async fn debit(
        &self,
        donor_id: &str,
        points: i64,
        transaction_type: TransactionType,
        description: String,
        related_entity_id: Option<String>,
    ) -> AppResult<DonorRewards> {
        let _guard = self.locks.acquire(donor_id).await;
        let mut tx = self.pool.begin().await?;
        let updated = debit_in_tx(
            &mut tx,
            donor_id,
            points,
            transaction_type,
            description,
            related_entity_id,
        )
        .await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Credit a refund. Refunds are never rejected for insufficiency.
    pub async fn refund(
        &self,
        donor_id: &str,
        points: i64,
        description: String,
        related_entity_id: Option<String>,
    ) -> AppResult<DonorRewards> {
        let _guard = self.locks.acquire(donor_id).await;
        let mut tx = self.pool.begin().await?;
        let updated = credit_in_tx(
            &mut tx,
            donor_id,
            points,
            TransactionType::Refund,
            description,
            related_entity_id,
        )
        .await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Current ledger balance; donors with no row yet read as 0
    pub async fn get_points_balance(&self, donor_id: &str) -> AppResult<i64> {
        let mut conn = self.pool.acquire().await?;
        let row = donor::find(&mut conn, donor_id).await?;
        Ok(row.map(|d| d.reward_points).unwrap_or(0))
    }

    /// Point movement history, newest first
    pub async fn get_point_history(&self, donor_id: &str) -> AppResult<Vec<PointTransaction>> {
        let mut conn = self.pool.acquire().await?;
        Ok(point_transaction::history_by_donor(&mut conn, donor_id).await?)
    }

    /// Create the donor's rewards row with defaults if absent
    pub async fn initialize_rewards(&self, donor_id: &str) -> AppResult<DonorRewards> {
        let _guard = self.locks.acquire(donor_id).await;
        let mut conn = self.pool.acquire().await?;
        Ok(donor::ensure(&mut conn, donor_id).await?)
    }

    /// Check the reconciliation invariant for one donor: cached balance
    /// equals the sum of all log rows. Absent donors reconcile at 0.
    pub async fn verify_reconciliation(&self, donor_id: &str) -> AppResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let cached = donor::find(&mut conn, donor_id)
            .await?
            .map(|d| d.reward_points)
            .unwrap_or(0);
        let logged = point_transaction::sum_points(&mut conn, donor_id).await?;
        Ok(cached == logged)
    }
}

/// Debit primitive: balance check + negative log row + donor write, on
/// the caller's connection. The caller must hold the donor's lock and
/// commit the surrounding transaction (the redemption engine composes
/// this with its own row changes).
pub(crate) async fn debit_in_tx(
    conn: &mut SqliteConnection,
    donor_id: &str,
    points: i64,
    transaction_type: TransactionType,
    description: String,
    related_entity_id: Option<String>,
) -> AppResult<DonorRewards> {
    if points <= 0 {
        return Err(AppError::Validation(format!(
            "Debit amount must be positive, got {points}"
        )));
    }
    let current = donor::ensure(conn, donor_id).await?;
    if current.reward_points < points {
        return Err(AppError::InsufficientPoints {
            required: points,
            available: current.reward_points,
        });
    }
    let new_balance = current.reward_points - points;
    point_transaction::append(
        conn,
        PointTransactionCreate {
            donor_id: donor_id.to_string(),
            points: -points,
            transaction_type,
            description,
            related_entity_id,
            balance_after: new_balance,
        },
    )
    .await?;
    let now = shared::util::now_millis();
    donor::update_balance(conn, donor_id, new_balance, now).await?;
    Ok(DonorRewards {
        reward_points: new_balance,
        updated_at: now,
        ..current
    })
}

/// Credit primitive: positive log row + donor write, on the caller's
/// connection. Same locking contract as [`debit_in_tx`].
pub(crate) async fn credit_in_tx(
    conn: &mut SqliteConnection,
    donor_id: &str,
    points: i64,
    transaction_type: TransactionType,
    description: String,
    related_entity_id: Option<String>,
) -> AppResult<DonorRewards> {
    if points <= 0 {
        return Err(AppError::Validation(format!(
            "Credit amount must be positive, got {points}"
        )));
    }
    let current = donor::ensure(conn, donor_id).await?;
    let new_balance = current.reward_points + points;
    point_transaction::append(
        conn,
        PointTransactionCreate {
            donor_id: donor_id.to_string(),
            points,
            transaction_type,
            description,
            related_entity_id,
            balance_after: new_balance,
        },
    )
    .await?;
    let now = shared::util::now_millis();
    donor::update_balance(conn, donor_id, new_balance, now).await?;
    Ok(DonorRewards {
        reward_points: new_balance,
        updated_at: now,
        ..current
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::DonorTier;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::DbService::migrate(&pool).await.unwrap();
        pool
    }

    fn ledger(pool: &SqlitePool) -> PointsLedger {
        PointsLedger::new(pool.clone(), Arc::new(DonorLocks::new()))
    }

    #[tokio::test]
    async fn test_first_donation_creates_donor_with_defaults_applied() {
        let pool = test_pool().await;
        let ledger = ledger(&pool);

        let donor = ledger.award_donation_points("donor-1", "donation-1").await.unwrap();
        assert_eq!(donor.reward_points, 100);
        assert_eq!(donor.total_donations, 1);
        assert_eq!(donor.donor_tier, DonorTier::Certified);
    }

    #[tokio::test]
    async fn test_referral_has_no_tier_effect() {
        let pool = test_pool().await;
        let ledger = ledger(&pool);

        let donor = ledger.award_referral_points("donor-1", "friend-1").await.unwrap();
        assert_eq!(donor.reward_points, 50);
        assert_eq!(donor.total_donations, 0);
        assert_eq!(donor.donor_tier, DonorTier::New);
    }

    #[tokio::test]
    async fn test_milestone_crossing_appends_two_transactions() {
        let pool = test_pool().await;
        let ledger = ledger(&pool);

        for i in 0..4 {
            ledger
                .award_donation_points("donor-1", &format!("donation-{i}"))
                .await
                .unwrap();
        }
        // 4 → 5 crosses the bronze threshold
        let donor = ledger.award_donation_points("donor-1", "donation-4").await.unwrap();
        assert_eq!(donor.total_donations, 5);
        assert_eq!(donor.donor_tier, DonorTier::Bronze);
        // 5 × 100 donation + 100 bronze bonus
        assert_eq!(donor.reward_points, 600);

        let history = ledger.get_point_history("donor-1").await.unwrap();
        // Newest first: MILESTONE then the 5th DONATION
        assert_eq!(history[0].transaction_type, TransactionType::Milestone);
        assert_eq!(history[0].points, 100);
        assert_eq!(history[0].balance_after, 600);
        assert_eq!(history[1].transaction_type, TransactionType::Donation);
        assert_eq!(history[1].balance_after, 500);
        assert_eq!(history.len(), 6);
    }

    #[tokio::test]
    async fn test_milestone_fires_once() {
        let pool = test_pool().await;
        let ledger = ledger(&pool);

        for i in 0..6 {
            ledger
                .award_donation_points("donor-1", &format!("donation-{i}"))
                .await
                .unwrap();
        }
        // 6th donation: no second bronze bonus
        let donor = ledger.get_points_balance("donor-1").await.unwrap();
        assert_eq!(donor, 700); // 600 after 5th + 100

        let history = ledger.get_point_history("donor-1").await.unwrap();
        let milestones = history
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Milestone)
            .count();
        assert_eq!(milestones, 1);
    }

    #[tokio::test]
    async fn test_debit_insufficient_leaves_ledger_untouched() {
        let pool = test_pool().await;
        let ledger = ledger(&pool);

        ledger.award_referral_points("donor-1", "friend-1").await.unwrap();
        let err = ledger
            .debit(
                "donor-1",
                80,
                TransactionType::Redemption,
                "Gift Card".to_string(),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientPoints {
                required: 80,
                available: 50
            }
        ));
        assert_eq!(ledger.get_points_balance("donor-1").await.unwrap(), 50);
        assert_eq!(ledger.get_point_history("donor-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refund_never_rejected() {
        let pool = test_pool().await;
        let ledger = ledger(&pool);

        // Refund to a donor that has never earned a point
        let donor = ledger
            .refund("donor-1", 75, "Voucher rejected".to_string(), None)
            .await
            .unwrap();
        assert_eq!(donor.reward_points, 75);
    }

    #[tokio::test]
    async fn test_ledger_reconciles_after_mixed_operations() {
        let pool = test_pool().await;
        let ledger = ledger(&pool);

        ledger.award_donation_points("donor-1", "d1").await.unwrap();
        ledger.award_referral_points("donor-1", "u1").await.unwrap();
        ledger
            .debit("donor-1", 120, TransactionType::Redemption, "Gift".into(), None)
            .await
            .unwrap();
        ledger.refund("donor-1", 120, "refund".into(), None).await.unwrap();

        assert!(ledger.verify_reconciliation("donor-1").await.unwrap());
        assert_eq!(ledger.get_points_balance("donor-1").await.unwrap(), 150);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let pool = test_pool().await;
        let ledger = ledger(&pool);

        let first = ledger.initialize_rewards("donor-1").await.unwrap();
        assert_eq!(first.reward_points, 0);
        assert_eq!(first.donor_tier, DonorTier::New);

        ledger.award_donation_points("donor-1", "d1").await.unwrap();
        // A second initialize must not reset anything
        let again = ledger.initialize_rewards("donor-1").await.unwrap();
        assert_eq!(again.reward_points, 100);
        assert_eq!(again.total_donations, 1);
    }

    #[tokio::test]
    async fn test_balance_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("rewards.db");
        let db_path = db_path.to_str().unwrap();

        {
            let db = crate::db::DbService::new(db_path).await.unwrap();
            let ledger = PointsLedger::new(db.pool.clone(), Arc::new(DonorLocks::new()));
            ledger.award_donation_points("donor-1", "d1").await.unwrap();
            ledger.award_referral_points("donor-1", "u1").await.unwrap();
            db.pool.close().await;
        }

        // Reopen: cached balance must still equal the log sum
        let db = crate::db::DbService::new(db_path).await.unwrap();
        let ledger = PointsLedger::new(db.pool.clone(), Arc::new(DonorLocks::new()));
        assert_eq!(ledger.get_points_balance("donor-1").await.unwrap(), 150);
        assert!(ledger.verify_reconciliation("donor-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_debits_never_over_debit() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("rewards.db");
        let db = crate::db::DbService::new(db_path.to_str().unwrap()).await.unwrap();
        let ledger = PointsLedger::new(db.pool.clone(), Arc::new(DonorLocks::new()));

        ledger.award_donation_points("donor-1", "d1").await.unwrap();
        ledger.award_referral_points("donor-1", "u1").await.unwrap();
        // Balance 150; two concurrent 100-point debits → exactly one wins
        let a = ledger.clone();
        let b = ledger.clone();
        let (ra, rb) = tokio::join!(
            tokio::spawn(async move {
                a.debit("donor-1", 100, TransactionType::Redemption, "Gift".into(), None)
                    .await
            }),
            tokio::spawn(async move {
                b.debit("donor-1", 100, TransactionType::Redemption, "Gift".into(), None)
                    .await
            }),
        );
        let results = [ra.unwrap(), rb.unwrap()];
        let oks = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(oks, 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(AppError::InsufficientPoints { .. })
        )));
        assert_eq!(ledger.get_points_balance("donor-1").await.unwrap(), 50);
        assert!(ledger.verify_reconciliation("donor-1").await.unwrap());
    }
}
