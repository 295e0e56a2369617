//! Data models
//!
//! Shared between the reward core and its consumers (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Rows owned by this service use `i64` snowflake IDs; donor, blood bank
//! and hospital IDs reference the external directory stores and are
//! opaque `String`s.

pub mod blood_inventory;
pub mod donor;
pub mod point_transaction;
pub mod redemption;
pub mod reward;

// Re-exports
pub use blood_inventory::*;
pub use donor::*;
pub use point_transaction::*;
pub use redemption::*;
pub use reward::*;
