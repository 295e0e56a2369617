//! Point Transaction Repository
//!
//! Append-only access to the point movement log. Rows are never updated
//! or deleted after insert; storage failures propagate so the caller's
//! transaction rolls back instead of leaving the ledger inconsistent.
//! Unlike every other table, ids here are plain rowids: the ledger
//! needs insertion order, not globally unique resource IDs.

use super::RepoResult;
use shared::models::{PointTransaction, PointTransactionCreate};
use sqlx::SqliteConnection;

const TRANSACTION_SELECT: &str =
    "SELECT id, donor_id, points, transaction_type, description, related_entity_id, \
     balance_after, created_at FROM point_transactions";

/// Append one movement to the log, assigning id and created_at.
///
/// The id is the table's rowid: rows are never deleted, so ids are
/// monotonic and `(created_at, id)` reproduces insertion order even
/// when two movements land in the same millisecond.
pub async fn append(
    conn: &mut SqliteConnection,
    data: PointTransactionCreate,
) -> RepoResult<PointTransaction> {
    let created_at = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO point_transactions \
         (donor_id, points, transaction_type, description, related_entity_id, \
          balance_after, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&data.donor_id)
    .bind(data.points)
    .bind(&data.transaction_type)
    .bind(&data.description)
    .bind(&data.related_entity_id)
    .bind(data.balance_after)
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(PointTransaction {
        id: result.last_insert_rowid(),
        donor_id: data.donor_id,
        points: data.points,
        transaction_type: data.transaction_type,
        description: data.description,
        related_entity_id: data.related_entity_id,
        balance_after: data.balance_after,
        created_at,
    })
}

/// Ledger view: oldest-first, ties broken by insertion order
pub async fn list_by_donor(
    conn: &mut SqliteConnection,
    donor_id: &str,
) -> RepoResult<Vec<PointTransaction>> {
    let sql = format!("{TRANSACTION_SELECT} WHERE donor_id = ? ORDER BY created_at, id");
    let rows = sqlx::query_as::<_, PointTransaction>(&sql)
        .bind(donor_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// History view: newest-first
pub async fn history_by_donor(
    conn: &mut SqliteConnection,
    donor_id: &str,
) -> RepoResult<Vec<PointTransaction>> {
    let sql = format!("{TRANSACTION_SELECT} WHERE donor_id = ? ORDER BY created_at DESC, id DESC");
    let rows = sqlx::query_as::<_, PointTransaction>(&sql)
        .bind(donor_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Sum of all movements for a donor, the ledger's source of truth for
/// the balance (reconciliation checks compare this against the cached
/// donor row).
pub async fn sum_points(conn: &mut SqliteConnection, donor_id: &str) -> RepoResult<i64> {
    let sum: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(points), 0) FROM point_transactions WHERE donor_id = ?",
    )
    .bind(donor_id)
    .fetch_one(conn)
    .await?;
    Ok(sum.0)
}
