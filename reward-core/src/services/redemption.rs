//! Redemption Engine
//!
//! Owns the redemption lifecycle: PENDING → PROCESSING → COMPLETED,
//! PENDING → CANCELLED (refund), and the medical-service cancellation
//! path from any non-terminal state. Every operation that moves points
//! runs the debit/refund and the redemption row change inside one
//! SQLite transaction while holding the donor's lock, so a failure
//! leaves both the balance and the redemption exactly as they were.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::db::repository::redemption::{self, RedemptionCreate};
use crate::loyalty::{blood_type_from_title, generate_voucher_code, hospital_id_from_reason};
use crate::services::inventory::InventoryCoordinator;
use crate::services::points_ledger::{credit_in_tx, debit_in_tx};
use crate::utils::{AppError, AppResult, DonorLocks};
use shared::models::{
    RedeemRequest, RedeemableAt, RedemptionStatus, RewardRedemption, RewardType,
    TransactionType, VoucherLocation,
};

/// Attempts at drawing an unused voucher code before giving up
const VOUCHER_CODE_ATTEMPTS: usize = 16;

/// Redemption lifecycle engine
#[derive(Clone)]
pub struct RedemptionEngine {
    pool: SqlitePool,
    locks: Arc<DonorLocks>,
}

impl RedemptionEngine {
    pub fn new(pool: SqlitePool, locks: Arc<DonorLocks>) -> Self {
        Self { pool, locks }
    }

    /// Redeem a reward: debit the donor and create the PENDING record
    /// in one transaction. Voucher-carrying reward kinds (blood bag,
    /// gift card, medical service) get a unique `RDS-XXXXXXXX` code.
    pub async fn redeem(&self, donor_id: &str, req: RedeemRequest) -> AppResult<RewardRedemption> {
        if req.points_cost <= 0 {
            return Err(AppError::Validation(format!(
                "Points cost must be positive, got {}",
                req.points_cost
            )));
        }

        let _guard = self.locks.acquire(donor_id).await;
        let mut tx = self.pool.begin().await?;

        let voucher_code = if req.reward_type.has_voucher_code() {
            Some(self.draw_voucher_code(&mut tx).await?)
        } else {
            None
        };

        // Voucher expires one month after redemption
        let expiry_date = shared::util::months_from_now_millis(1);
        let created = redemption::create(
            &mut tx,
            RedemptionCreate {
                donor_id: donor_id.to_string(),
                reward_title: req.reward_title.clone(),
                reward_type: req.reward_type,
                tier: req.tier,
                redeemable_at: req.redeemable_at,
                points_cost: req.points_cost,
                voucher_code,
                expiry_date: Some(expiry_date),
            },
        )
        .await?;

        debit_in_tx(
            &mut tx,
            donor_id,
            req.points_cost,
            TransactionType::Redemption,
            req.reward_title,
            Some(created.id.to_string()),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            donor_id = %donor_id,
            redemption_id = created.id,
            points_cost = created.points_cost,
            reward_type = ?created.reward_type,
            "Reward redeemed"
        );
        Ok(created)
    }

    /// Accept a blood-bag voucher at a blood bank.
    ///
    /// Reserves one unit of the voucher's blood type (availability
    /// check + decrement, atomically with the status change) and moves
    /// the redemption to PROCESSING. The inventory is decremented here,
    /// once; completion does not touch it again.
    pub async fn accept_blood_bag_voucher(
        &self,
        redemption_id: i64,
        blood_bank_id: &str,
    ) -> AppResult<RewardRedemption> {
        let mut tx = self.pool.begin().await?;

        let voucher = redemption::find_by_id(&mut tx, redemption_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Redemption {redemption_id} not found")))?;

        if voucher.reward_type != RewardType::BloodBagVoucher {
            return Err(AppError::Validation(
                "Not a blood bag voucher".to_string(),
            ));
        }
        if voucher.status != RedemptionStatus::Pending {
            return Err(AppError::InvalidStateTransition(format!(
                "Voucher {redemption_id} is {:?}, only PENDING vouchers can be accepted",
                voucher.status
            )));
        }

        let blood_type = blood_type_from_title(&voucher.reward_title).ok_or_else(|| {
            AppError::Validation(format!(
                "Voucher title '{}' does not name a blood type",
                voucher.reward_title
            ))
        })?;

        let reserved =
            InventoryCoordinator::reserve_if_available(&mut tx, blood_bank_id, &blood_type, 1)
                .await?;
        if !reserved {
            return Err(AppError::InsufficientInventory {
                blood_bank_id: blood_bank_id.to_string(),
                blood_type,
            });
        }

        let now = shared::util::now_millis();
        // delivered_date here is the acceptance stamp, not final handoff;
        // the voucher must be picked up within 30 days
        let expiry = shared::util::days_from_now_millis(30);
        let updated =
            redemption::mark_processing(&mut tx, redemption_id, blood_bank_id, now, Some(expiry), now)
                .await?;
        tx.commit().await?;

        tracing::info!(
            redemption_id,
            blood_bank_id = %blood_bank_id,
            blood_type = %blood_type,
            "Blood bag voucher accepted, 1 unit reserved"
        );
        Ok(updated)
    }

    /// Accept a non-blood-bag voucher at a blood bank. No inventory
    /// interaction.
    pub async fn accept_general_voucher(
        &self,
        redemption_id: i64,
        blood_bank_id: &str,
    ) -> AppResult<RewardRedemption> {
        let mut tx = self.pool.begin().await?;

        let voucher = redemption::find_by_id(&mut tx, redemption_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Redemption {redemption_id} not found")))?;

        if voucher.reward_type == RewardType::BloodBagVoucher {
            return Err(AppError::Validation(
                "Blood bag vouchers must be accepted through the inventory-checked path".to_string(),
            ));
        }
        if voucher.status != RedemptionStatus::Pending {
            return Err(AppError::InvalidStateTransition(format!(
                "Voucher {redemption_id} is {:?}, only PENDING vouchers can be accepted",
                voucher.status
            )));
        }

        let now = shared::util::now_millis();
        let updated =
            redemption::mark_processing(&mut tx, redemption_id, blood_bank_id, now, None, now)
                .await?;
        tx.commit().await?;

        tracing::info!(
            redemption_id,
            blood_bank_id = %blood_bank_id,
            "General voucher accepted"
        );
        Ok(updated)
    }

    /// Complete a PROCESSING voucher redeemable at blood banks,
    /// stamping the final handoff date.
    pub async fn complete_voucher(&self, redemption_id: i64) -> AppResult<RewardRedemption> {
        let mut tx = self.pool.begin().await?;

        let voucher = redemption::find_by_id(&mut tx, redemption_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Redemption {redemption_id} not found")))?;

        if !matches!(
            voucher.redeemable_at,
            RedeemableAt::Bloodbank | RedeemableAt::Both
        ) {
            return Err(AppError::LocationMismatch(
                "This voucher is not redeemable at blood banks".to_string(),
            ));
        }
        if voucher.status != RedemptionStatus::Processing {
            return Err(AppError::InvalidStateTransition(format!(
                "Voucher {redemption_id} is {:?}, must be PROCESSING to complete",
                voucher.status
            )));
        }

        let now = shared::util::now_millis();
        let updated = redemption::mark_completed(&mut tx, redemption_id, now, now).await?;
        tx.commit().await?;

        tracing::info!(redemption_id, "Voucher completed");
        Ok(updated)
    }

    /// Reject a PENDING voucher at a blood bank and refund the points.
    /// A second reject fails with `InvalidStateTransition`; the refund
    /// must never be paid twice.
    pub async fn reject_voucher(
        &self,
        redemption_id: i64,
        reason: Option<&str>,
        blood_bank_id: &str,
    ) -> AppResult<RewardRedemption> {
        // Resolve the donor before locking; re-read inside the
        // transaction for the actual state checks
        let donor_id = {
            let mut conn = self.pool.acquire().await?;
            redemption::find_by_id(&mut conn, redemption_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Redemption {redemption_id} not found")))?
                .donor_id
        };

        let _guard = self.locks.acquire(&donor_id).await;
        let mut tx = self.pool.begin().await?;

        let voucher = redemption::find_by_id(&mut tx, redemption_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Redemption {redemption_id} not found")))?;

        if voucher.redeemable_at == RedeemableAt::Hospital {
            return Err(AppError::LocationMismatch(
                "This voucher is only redeemable at hospitals, not blood banks".to_string(),
            ));
        }
        if voucher.status != RedemptionStatus::Pending {
            return Err(AppError::InvalidStateTransition(format!(
                "Voucher {redemption_id} is {:?}, only PENDING vouchers can be rejected",
                voucher.status
            )));
        }

        let notes = match reason {
            Some(reason) => format!("Rejected: {reason}"),
            None => "Rejected by blood bank".to_string(),
        };
        let now = shared::util::now_millis();
        let updated = redemption::mark_cancelled(
            &mut tx,
            redemption_id,
            &notes,
            Some(blood_bank_id),
            None,
            now,
        )
        .await?;

        credit_in_tx(
            &mut tx,
            &donor_id,
            voucher.points_cost,
            TransactionType::Refund,
            "Voucher rejected - Points refunded".to_string(),
            Some(redemption_id.to_string()),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            redemption_id,
            donor_id = %donor_id,
            blood_bank_id = %blood_bank_id,
            refunded = voucher.points_cost,
            "Voucher rejected, points refunded"
        );
        Ok(updated)
    }

    /// Cancel a medical-service voucher from any non-terminal state and
    /// refund the points. The issuing hospital may tag the reason with
    /// `[Hospital ID: …]` to stamp itself on the record.
    pub async fn cancel_medical_service_voucher(
        &self,
        redemption_id: i64,
        reason: Option<&str>,
    ) -> AppResult<RewardRedemption> {
        let donor_id = {
            let mut conn = self.pool.acquire().await?;
            redemption::find_by_id(&mut conn, redemption_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Redemption {redemption_id} not found")))?
                .donor_id
        };

        let _guard = self.locks.acquire(&donor_id).await;
        let mut tx = self.pool.begin().await?;

        let voucher = redemption::find_by_id(&mut tx, redemption_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Redemption {redemption_id} not found")))?;

        if voucher.reward_type != RewardType::MedicalService {
            return Err(AppError::Validation(
                "Not a medical service voucher".to_string(),
            ));
        }
        if voucher.status.is_terminal() {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot cancel a voucher that is already {:?}",
                voucher.status
            )));
        }

        let hospital_id = reason.and_then(hospital_id_from_reason);
        let notes = match reason {
            Some(reason) => format!("Cancelled: {reason}"),
            None => "Cancelled by hospital".to_string(),
        };
        let now = shared::util::now_millis();
        let updated = redemption::mark_cancelled(
            &mut tx,
            redemption_id,
            &notes,
            None,
            hospital_id.as_deref(),
            now,
        )
        .await?;

        credit_in_tx(
            &mut tx,
            &donor_id,
            voucher.points_cost,
            TransactionType::Refund,
            format!(
                "Medical service voucher cancelled - Points refunded: {}",
                voucher.reward_title
            ),
            Some(redemption_id.to_string()),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            redemption_id,
            donor_id = %donor_id,
            refunded = voucher.points_cost,
            "Medical service voucher cancelled, points refunded"
        );
        Ok(updated)
    }

    /// Look up a voucher by code and check it may be honored at the
    /// presenting location kind.
    pub async fn validate_voucher_code(
        &self,
        voucher_code: &str,
        location: VoucherLocation,
    ) -> AppResult<RewardRedemption> {
        let mut conn = self.pool.acquire().await?;
        let voucher = redemption::find_by_code(&mut conn, voucher_code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Voucher code {voucher_code} not found")))?;

        if !voucher.redeemable_at.permits(&location) {
            // BOTH permits every location, so a mismatch is one of these
            let msg = match voucher.redeemable_at {
                RedeemableAt::Hospital => "This voucher is only redeemable at hospitals",
                _ => "This voucher is only redeemable at blood banks",
            };
            return Err(AppError::LocationMismatch(msg.to_string()));
        }
        Ok(voucher)
    }

    /// Donor redemption history, newest first
    pub async fn get_redemption_history(
        &self,
        donor_id: &str,
    ) -> AppResult<Vec<RewardRedemption>> {
        let mut conn = self.pool.acquire().await?;
        Ok(redemption::list_by_donor(&mut conn, donor_id).await?)
    }

    /// All redemptions, newest first (admin view)
    pub async fn get_all_redemptions(&self) -> AppResult<Vec<RewardRedemption>> {
        let mut conn = self.pool.acquire().await?;
        Ok(redemption::list_all(&mut conn).await?)
    }

    /// Blood bag vouchers, optionally narrowed by status
    pub async fn get_blood_bag_vouchers(
        &self,
        status: Option<RedemptionStatus>,
    ) -> AppResult<Vec<RewardRedemption>> {
        let mut conn = self.pool.acquire().await?;
        Ok(
            redemption::list_by_type(&mut conn, &RewardType::BloodBagVoucher, status.as_ref())
                .await?,
        )
    }

    /// Vouchers validated (accepted or rejected) by one blood bank
    pub async fn get_vouchers_by_blood_bank(
        &self,
        blood_bank_id: &str,
        status: Option<RedemptionStatus>,
    ) -> AppResult<Vec<RewardRedemption>> {
        let mut conn = self.pool.acquire().await?;
        Ok(redemption::list_by_blood_bank(&mut conn, blood_bank_id, status.as_ref()).await?)
    }

    /// Draw a voucher code that is not already taken. Collisions are
    /// vanishingly rare (8 hex chars), the retry bound is a backstop.
    async fn draw_voucher_code(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    ) -> AppResult<String> {
        for _ in 0..VOUCHER_CODE_ATTEMPTS {
            let code = generate_voucher_code();
            if redemption::find_by_code(tx, &code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(AppError::Database(
            "Could not generate an unused voucher code".to_string(),
        ))
    }
}
