//! Point Transaction Model

use serde::{Deserialize, Serialize};

/// Kind of point movement recorded in the transaction log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TransactionType {
    Donation,
    Referral,
    Milestone,
    Redemption,
    Refund,
}

/// Point transaction entity: one row per point movement.
///
/// Append-only: rows are never updated or deleted. `points` is signed
/// (positive = credit, negative = debit) and `balance_after` records the
/// donor's balance immediately after this row was applied. Ledger order
/// for a donor is `created_at`, ties broken by insertion order (`id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PointTransaction {
    pub id: i64,
    pub donor_id: String,
    pub points: i64,
    pub transaction_type: TransactionType,
    pub description: String,
    /// ID of the related donation, referred user, or redemption
    pub related_entity_id: Option<String>,
    pub balance_after: i64,
    pub created_at: i64,
}

/// Create point transaction payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointTransactionCreate {
    pub donor_id: String,
    pub points: i64,
    pub transaction_type: TransactionType,
    pub description: String,
    pub related_entity_id: Option<String>,
    pub balance_after: i64,
}
