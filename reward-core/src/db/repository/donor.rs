//! Donor Rewards Repository
//!
//! The donor row is a materialized view of the transaction log; only
//! the points ledger service writes it, always in the same transaction
//! as the log rows it summarizes.

use super::{RepoError, RepoResult};
use shared::models::{DonorRewards, DonorTier};
use sqlx::SqliteConnection;

const DONOR_SELECT: &str =
    "SELECT donor_id, reward_points, total_donations, donor_tier, updated_at \
     FROM donor_rewards WHERE donor_id = ?";

pub async fn find(conn: &mut SqliteConnection, donor_id: &str) -> RepoResult<Option<DonorRewards>> {
    let row = sqlx::query_as::<_, DonorRewards>(DONOR_SELECT)
        .bind(donor_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Fetch the donor row, lazily creating it with defaults (0 points,
/// 0 donations, NEW tier) on first touch.
pub async fn ensure(conn: &mut SqliteConnection, donor_id: &str) -> RepoResult<DonorRewards> {
    let now = shared::util::now_millis();
    // INSERT OR IGNORE: only inserts if the donor has no row yet
    sqlx::query(
        "INSERT OR IGNORE INTO donor_rewards \
         (donor_id, reward_points, total_donations, donor_tier, updated_at) \
         VALUES (?1, 0, 0, 'NEW', ?2)",
    )
    .bind(donor_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    find(conn, donor_id)
        .await?
        .ok_or_else(|| RepoError::Database(format!("Failed to ensure donor rewards row for {donor_id}")))
}

/// Overwrite the cached balance only (referral, debit, refund paths)
pub async fn update_balance(
    conn: &mut SqliteConnection,
    donor_id: &str,
    reward_points: i64,
    now: i64,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE donor_rewards SET reward_points = ?1, updated_at = ?2 WHERE donor_id = ?3",
    )
    .bind(reward_points)
    .bind(now)
    .bind(donor_id)
    .execute(conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Donor {donor_id} not found")));
    }
    Ok(())
}

/// Overwrite balance, donation count and tier in one statement
/// (donation award path)
pub async fn update_stats(
    conn: &mut SqliteConnection,
    donor_id: &str,
    reward_points: i64,
    total_donations: i64,
    donor_tier: &DonorTier,
    now: i64,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE donor_rewards SET reward_points = ?1, total_donations = ?2, \
         donor_tier = ?3, updated_at = ?4 WHERE donor_id = ?5",
    )
    .bind(reward_points)
    .bind(total_donations)
    .bind(donor_tier.as_str())
    .bind(now)
    .bind(donor_id)
    .execute(conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Donor {donor_id} not found")));
    }
    Ok(())
}
