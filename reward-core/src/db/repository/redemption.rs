//! Reward Redemption Repository
//!
//! Rows are created PENDING and only ever move forward through the
//! lifecycle; the status-transition guards live in the redemption
//! engine, which reads and updates inside one transaction.

use super::{RepoError, RepoResult};
use shared::models::{
    DonorTier, RedeemableAt, RedemptionStatus, RewardRedemption, RewardType,
};
use sqlx::SqliteConnection;

const REDEMPTION_SELECT: &str =
    "SELECT id, donor_id, reward_title, reward_type, tier, redeemable_at, points_cost, \
     status, redeemed_date, delivered_date, voucher_code, expiry_date, notes, \
     validated_by_blood_bank_id, validated_by_hospital_id, created_at, updated_at \
     FROM reward_redemptions";

/// Create redemption payload (engine-internal)
#[derive(Debug, Clone)]
pub struct RedemptionCreate {
    pub donor_id: String,
    pub reward_title: String,
    pub reward_type: RewardType,
    pub tier: DonorTier,
    pub redeemable_at: RedeemableAt,
    pub points_cost: i64,
    pub voucher_code: Option<String>,
    pub expiry_date: Option<i64>,
}

pub async fn create(
    conn: &mut SqliteConnection,
    data: RedemptionCreate,
) -> RepoResult<RewardRedemption> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO reward_redemptions \
         (id, donor_id, reward_title, reward_type, tier, redeemable_at, points_cost, \
          status, redeemed_date, voucher_code, expiry_date, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'PENDING', ?8, ?9, ?10, ?8, ?8)",
    )
    .bind(id)
    .bind(&data.donor_id)
    .bind(&data.reward_title)
    .bind(&data.reward_type)
    .bind(&data.tier)
    .bind(&data.redeemable_at)
    .bind(data.points_cost)
    .bind(now)
    .bind(&data.voucher_code)
    .bind(data.expiry_date)
    .execute(&mut *conn)
    .await?;

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::Database(format!("Failed to create redemption {id}")))
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<RewardRedemption>> {
    let sql = format!("{REDEMPTION_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, RewardRedemption>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_by_code(
    conn: &mut SqliteConnection,
    voucher_code: &str,
) -> RepoResult<Option<RewardRedemption>> {
    let sql = format!("{REDEMPTION_SELECT} WHERE voucher_code = ?");
    let row = sqlx::query_as::<_, RewardRedemption>(&sql)
        .bind(voucher_code)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Donor history, newest redemption first
pub async fn list_by_donor(
    conn: &mut SqliteConnection,
    donor_id: &str,
) -> RepoResult<Vec<RewardRedemption>> {
    let sql = format!("{REDEMPTION_SELECT} WHERE donor_id = ? ORDER BY redeemed_date DESC, id DESC");
    let rows = sqlx::query_as::<_, RewardRedemption>(&sql)
        .bind(donor_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// All redemptions, newest first (admin view)
pub async fn list_all(conn: &mut SqliteConnection) -> RepoResult<Vec<RewardRedemption>> {
    let sql = format!("{REDEMPTION_SELECT} ORDER BY redeemed_date DESC, id DESC");
    let rows = sqlx::query_as::<_, RewardRedemption>(&sql)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Redemptions of one reward type, optionally narrowed by status
pub async fn list_by_type(
    conn: &mut SqliteConnection,
    reward_type: &RewardType,
    status: Option<&RedemptionStatus>,
) -> RepoResult<Vec<RewardRedemption>> {
    let rows = match status {
        Some(status) => {
            let sql = format!(
                "{REDEMPTION_SELECT} WHERE reward_type = ? AND status = ? \
                 ORDER BY redeemed_date DESC, id DESC"
            );
            sqlx::query_as::<_, RewardRedemption>(&sql)
                .bind(reward_type)
                .bind(status)
                .fetch_all(conn)
                .await?
        }
        None => {
            let sql = format!(
                "{REDEMPTION_SELECT} WHERE reward_type = ? ORDER BY redeemed_date DESC, id DESC"
            );
            sqlx::query_as::<_, RewardRedemption>(&sql)
                .bind(reward_type)
                .fetch_all(conn)
                .await?
        }
    };
    Ok(rows)
}

/// Vouchers validated (accepted or rejected) by one blood bank
pub async fn list_by_blood_bank(
    conn: &mut SqliteConnection,
    blood_bank_id: &str,
    status: Option<&RedemptionStatus>,
) -> RepoResult<Vec<RewardRedemption>> {
    let rows = match status {
        Some(status) => {
            let sql = format!(
                "{REDEMPTION_SELECT} WHERE validated_by_blood_bank_id = ? AND status = ? \
                 ORDER BY redeemed_date DESC, id DESC"
            );
            sqlx::query_as::<_, RewardRedemption>(&sql)
                .bind(blood_bank_id)
                .bind(status)
                .fetch_all(conn)
                .await?
        }
        None => {
            let sql = format!(
                "{REDEMPTION_SELECT} WHERE validated_by_blood_bank_id = ? \
                 ORDER BY redeemed_date DESC, id DESC"
            );
            sqlx::query_as::<_, RewardRedemption>(&sql)
                .bind(blood_bank_id)
                .fetch_all(conn)
                .await?
        }
    };
    Ok(rows)
}

/// PENDING → PROCESSING: stamp the accepting blood bank, acceptance
/// date, and the post-acceptance expiry window
pub async fn mark_processing(
    conn: &mut SqliteConnection,
    id: i64,
    blood_bank_id: &str,
    delivered_date: i64,
    expiry_date: Option<i64>,
    now: i64,
) -> RepoResult<RewardRedemption> {
    match expiry_date {
        Some(expiry) => {
            sqlx::query(
                "UPDATE reward_redemptions SET status = 'PROCESSING', \
                 validated_by_blood_bank_id = ?1, delivered_date = ?2, expiry_date = ?3, \
                 updated_at = ?4 WHERE id = ?5",
            )
            .bind(blood_bank_id)
            .bind(delivered_date)
            .bind(expiry)
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?
        }
        None => {
            sqlx::query(
                "UPDATE reward_redemptions SET status = 'PROCESSING', \
                 validated_by_blood_bank_id = ?1, delivered_date = ?2, \
                 updated_at = ?3 WHERE id = ?4",
            )
            .bind(blood_bank_id)
            .bind(delivered_date)
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?
        }
    };

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Redemption {id} not found")))
}

/// PROCESSING → COMPLETED: stamp the final handoff date
pub async fn mark_completed(
    conn: &mut SqliteConnection,
    id: i64,
    delivered_date: i64,
    now: i64,
) -> RepoResult<RewardRedemption> {
    sqlx::query(
        "UPDATE reward_redemptions SET status = 'COMPLETED', delivered_date = ?1, \
         updated_at = ?2 WHERE id = ?3",
    )
    .bind(delivered_date)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Redemption {id} not found")))
}

/// → CANCELLED: terminal; stamps notes plus whichever validator
/// (blood bank or hospital) drove the cancellation
pub async fn mark_cancelled(
    conn: &mut SqliteConnection,
    id: i64,
    notes: &str,
    blood_bank_id: Option<&str>,
    hospital_id: Option<&str>,
    now: i64,
) -> RepoResult<RewardRedemption> {
    sqlx::query(
        "UPDATE reward_redemptions SET status = 'CANCELLED', notes = ?1, \
         validated_by_blood_bank_id = COALESCE(?2, validated_by_blood_bank_id), \
         validated_by_hospital_id = COALESCE(?3, validated_by_hospital_id), \
         updated_at = ?4 WHERE id = ?5",
    )
    .bind(notes)
    .bind(blood_bank_id)
    .bind(hospital_id)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Redemption {id} not found")))
}
