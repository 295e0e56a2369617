//! Repository Module
//!
//! CRUD operations over the SQLite tables. All functions take a
//! `&mut SqliteConnection` so callers can compose several repository
//! calls inside one transaction (`&mut *tx`); the ledger invariant
//! depends on "append transaction rows + write donor balance" being a
//! single atomic unit.

pub mod blood_inventory;
pub mod donor;
pub mod point_transaction;
pub mod redemption;
pub mod reward;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
