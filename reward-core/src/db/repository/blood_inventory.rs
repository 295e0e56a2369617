//! Blood Inventory Repository
//!
//! Access to the blood bank subsystem's inventory batches, restricted
//! to what the voucher flow needs: availability sums, largest-first
//! depletion, and restocking (tests and the inventory-owner side of the
//! contract).

use super::RepoResult;
use shared::models::BloodInventoryItem;
use sqlx::SqliteConnection;

const INVENTORY_SELECT: &str =
    "SELECT id, blood_bank_id, blood_type, quantity, status, created_at, updated_at \
     FROM blood_inventory";

/// Sum of units across AVAILABLE batches of one type at one bank
pub async fn available_units(
    conn: &mut SqliteConnection,
    blood_bank_id: &str,
    blood_type: &str,
) -> RepoResult<i64> {
    let sum: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(quantity), 0) FROM blood_inventory \
         WHERE blood_bank_id = ? AND blood_type = ? AND status = 'AVAILABLE'",
    )
    .bind(blood_bank_id)
    .bind(blood_type)
    .fetch_one(conn)
    .await?;
    Ok(sum.0)
}

/// AVAILABLE batches, largest first (depletion order)
pub async fn available_batches(
    conn: &mut SqliteConnection,
    blood_bank_id: &str,
    blood_type: &str,
) -> RepoResult<Vec<BloodInventoryItem>> {
    let sql = format!(
        "{INVENTORY_SELECT} WHERE blood_bank_id = ? AND blood_type = ? \
         AND status = 'AVAILABLE' ORDER BY quantity DESC, id"
    );
    let rows = sqlx::query_as::<_, BloodInventoryItem>(&sql)
        .bind(blood_bank_id)
        .bind(blood_type)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Deplete `units` from the largest batches first. A batch reaching 0
/// flips to UNAVAILABLE. A shortfall (requested > available) depletes
/// whatever exists and is not an error; callers that need the units to
/// actually exist must pre-check `available_units` in the same
/// transaction. Returns the number of units actually removed.
pub async fn deplete(
    conn: &mut SqliteConnection,
    blood_bank_id: &str,
    blood_type: &str,
    units: i64,
) -> RepoResult<i64> {
    let batches = available_batches(conn, blood_bank_id, blood_type).await?;
    let mut remaining = units;
    for batch in batches {
        if remaining <= 0 {
            break;
        }
        let take = remaining.min(batch.quantity);
        let left = batch.quantity - take;
        let status = if left <= 0 { "UNAVAILABLE" } else { "AVAILABLE" };
        sqlx::query(
            "UPDATE blood_inventory SET quantity = ?1, status = ?2, updated_at = ?3 \
             WHERE id = ?4",
        )
        .bind(left)
        .bind(status)
        .bind(shared::util::now_millis())
        .bind(batch.id)
        .execute(&mut *conn)
        .await?;
        remaining -= take;
    }
    Ok(units - remaining)
}

/// Add a new AVAILABLE batch
pub async fn restock(
    conn: &mut SqliteConnection,
    blood_bank_id: &str,
    blood_type: &str,
    units: i64,
) -> RepoResult<BloodInventoryItem> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO blood_inventory \
         (id, blood_bank_id, blood_type, quantity, status, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 'AVAILABLE', ?5, ?5)",
    )
    .bind(id)
    .bind(blood_bank_id)
    .bind(blood_type)
    .bind(units)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(BloodInventoryItem {
        id,
        blood_bank_id: blood_bank_id.to_string(),
        blood_type: blood_type.to_string(),
        quantity: units,
        status: shared::models::InventoryStatus::Available,
        created_at: now,
        updated_at: now,
    })
}
