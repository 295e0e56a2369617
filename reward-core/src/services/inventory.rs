//! Inventory Coordinator
//!
//! Thin contract wrapper around the blood bank subsystem's inventory
//! store, used only by the redemption engine for blood-bag vouchers
//! (plus the restock entry point the inventory owner drives).
//!
//! `available_units` fails open to 0 on lookup errors: callers already
//! have to treat 0 as "not available", and a voucher acceptance should
//! degrade to "no stock" rather than surface a storage error to the
//! donor-facing flow. This is the one deliberate error swallow in the
//! crate; everything else propagates.

use sqlx::{SqliteConnection, SqlitePool};

use crate::db::repository::blood_inventory;
use crate::utils::AppResult;
use shared::models::BloodInventoryItem;

/// Contract wrapper over the external blood inventory store
#[derive(Clone)]
pub struct InventoryCoordinator {
    pool: SqlitePool,
}

impl InventoryCoordinator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Units of one blood type available at one bank. Fails open to 0:
    /// a lookup error reads as "not available", never as a failure.
    pub async fn available_units(&self, blood_bank_id: &str, blood_type: &str) -> i64 {
        let result = async {
            let mut conn = self.pool.acquire().await?;
            Ok::<_, crate::utils::AppError>(
                blood_inventory::available_units(&mut conn, blood_bank_id, blood_type).await?,
            )
        }
        .await;

        match result {
            Ok(units) => units,
            Err(e) => {
                tracing::warn!(
                    blood_bank_id = %blood_bank_id,
                    blood_type = %blood_type,
                    error = %e,
                    "Inventory lookup failed, treating as 0 units available"
                );
                0
            }
        }
    }

    /// Deplete units, largest batches first. A shortfall depletes what
    /// exists without error; pre-check `available_units` when the units
    /// must exist. Returns the number of units actually removed.
    pub async fn decrement(
        &self,
        blood_bank_id: &str,
        blood_type: &str,
        units: i64,
    ) -> AppResult<i64> {
        let mut tx = self.pool.begin().await?;
        let removed = blood_inventory::deplete(&mut tx, blood_bank_id, blood_type, units).await?;
        tx.commit().await?;
        if removed < units {
            tracing::warn!(
                blood_bank_id = %blood_bank_id,
                blood_type = %blood_type,
                requested = units,
                removed,
                "Inventory decrement short-fall"
            );
        }
        Ok(removed)
    }

    /// Add a new available batch (the inventory-owner side of the
    /// contract; also what tests seed stock with)
    pub async fn restock(
        &self,
        blood_bank_id: &str,
        blood_type: &str,
        units: i64,
    ) -> AppResult<BloodInventoryItem> {
        let mut conn = self.pool.acquire().await?;
        Ok(blood_inventory::restock(&mut conn, blood_bank_id, blood_type, units).await?)
    }

    /// Atomic reserve: availability check + decrement on the caller's
    /// connection, so blood-bag acceptance cannot race another
    /// acceptance into the same last unit. The availability read keeps
    /// the fail-open contract (an error reads as "nothing available");
    /// the depletion itself propagates errors so the caller's
    /// transaction rolls back.
    pub(crate) async fn reserve_if_available(
        conn: &mut SqliteConnection,
        blood_bank_id: &str,
        blood_type: &str,
        units: i64,
    ) -> AppResult<bool> {
        let available =
            match blood_inventory::available_units(conn, blood_bank_id, blood_type).await {
                Ok(units) => units,
                Err(e) => {
                    tracing::warn!(
                        blood_bank_id = %blood_bank_id,
                        blood_type = %blood_type,
                        error = %e,
                        "Inventory lookup failed, treating as 0 units available"
                    );
                    0
                }
            };
        if available < units {
            return Ok(false);
        }
        blood_inventory::deplete(conn, blood_bank_id, blood_type, units).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::InventoryStatus;
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

    #[tokio::test]
    async fn test_available_units_sums_available_batches_only() {
        let pool = test_pool().await;
        let inv = InventoryCoordinator::new(pool.clone());

        inv.restock("bank-1", "A+", 3).await.unwrap();
        inv.restock("bank-1", "A+", 2).await.unwrap();
        inv.restock("bank-1", "O-", 7).await.unwrap();
        inv.restock("bank-2", "A+", 4).await.unwrap();

        assert_eq!(inv.available_units("bank-1", "A+").await, 5);
        assert_eq!(inv.available_units("bank-1", "O-").await, 7);
        assert_eq!(inv.available_units("bank-1", "B+").await, 0);
        assert_eq!(inv.available_units("bank-2", "A+").await, 4);
    }

    #[tokio::test]
    async fn test_decrement_depletes_largest_batch_first() {
        let pool = test_pool().await;
        let inv = InventoryCoordinator::new(pool.clone());

        let small = inv.restock("bank-1", "A+", 2).await.unwrap();
        let large = inv.restock("bank-1", "A+", 6).await.unwrap();

        let removed = inv.decrement("bank-1", "A+", 4).await.unwrap();
        assert_eq!(removed, 4);

        let mut conn = pool.acquire().await.unwrap();
        let batches = blood_inventory::available_batches(&mut conn, "bank-1", "A+")
            .await
            .unwrap();
        // Large batch went 6 → 2; small batch untouched
        let large_left = batches.iter().find(|b| b.id == large.id).unwrap();
        assert_eq!(large_left.quantity, 2);
        let small_left = batches.iter().find(|b| b.id == small.id).unwrap();
        assert_eq!(small_left.quantity, 2);
    }

    #[tokio::test]
    async fn test_depleted_batch_flips_unavailable() {
        let pool = test_pool().await;
        let inv = InventoryCoordinator::new(pool.clone());

        inv.restock("bank-1", "AB-", 1).await.unwrap();
        let removed = inv.decrement("bank-1", "AB-", 1).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(inv.available_units("bank-1", "AB-").await, 0);

        // The row still exists, marked UNAVAILABLE with 0 units
        let mut conn = pool.acquire().await.unwrap();
        let rows = sqlx::query_as::<_, shared::models::BloodInventoryItem>(
            "SELECT id, blood_bank_id, blood_type, quantity, status, created_at, updated_at \
             FROM blood_inventory WHERE blood_bank_id = 'bank-1' AND blood_type = 'AB-'",
        )
        .fetch_all(&mut *conn)
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 0);
        assert_eq!(rows[0].status, InventoryStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_decrement_shortfall_is_not_an_error() {
        let pool = test_pool().await;
        let inv = InventoryCoordinator::new(pool.clone());

        inv.restock("bank-1", "B-", 2).await.unwrap();
        let removed = inv.decrement("bank-1", "B-", 5).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(inv.available_units("bank-1", "B-").await, 0);
    }

    #[tokio::test]
    async fn test_reserve_fails_without_touching_stock() {
        let pool = test_pool().await;
        let inv = InventoryCoordinator::new(pool.clone());
        inv.restock("bank-1", "A+", 1).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        // Asking for 2 with only 1 available: nothing is depleted
        let reserved = InventoryCoordinator::reserve_if_available(&mut conn, "bank-1", "A+", 2)
            .await
            .unwrap();
        assert!(!reserved);
        drop(conn);
        assert_eq!(inv.available_units("bank-1", "A+").await, 1);

        let mut conn = pool.acquire().await.unwrap();
        let reserved = InventoryCoordinator::reserve_if_available(&mut conn, "bank-1", "A+", 1)
            .await
            .unwrap();
        assert!(reserved);
        drop(conn);
        assert_eq!(inv.available_units("bank-1", "A+").await, 0);
    }
}
