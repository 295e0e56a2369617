//! Blood Inventory Model
//!
//! The inventory store is owned by the blood bank subsystem; the reward
//! core only touches it through the inventory coordinator contract
//! (availability check + decrement for blood-bag voucher acceptance).

use serde::{Deserialize, Serialize};

/// Availability state of an inventory batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum InventoryStatus {
    Available,
    Unavailable,
}

/// One inventory batch of a blood type held by a blood bank
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BloodInventoryItem {
    pub id: i64,
    pub blood_bank_id: String,
    pub blood_type: String,
    pub quantity: i64,
    pub status: InventoryStatus,
    pub created_at: i64,
    pub updated_at: i64,
}
