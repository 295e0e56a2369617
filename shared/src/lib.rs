//! Shared types for the donor rewards platform
//!
//! Data models and small utilities used by the reward core and its
//! consumers (API handlers, admin tooling). DB row types use
//! `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]` so non-DB
//! consumers can depend on this crate without pulling in sqlx.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
