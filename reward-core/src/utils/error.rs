//! Unified error handling
//!
//! Application-level error type for the reward core. Request handlers
//! map these onto transport responses; inside this crate nothing
//! catches-and-ignores a failure that would leave the ledger invariant
//! broken. The single deliberate exception is the inventory
//! availability lookup, which fails open to zero units (see
//! `services::inventory`).

use crate::db::repository::RepoError;

/// Application error taxonomy
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Donor, redemption, or voucher code unresolvable
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Debit exceeds the donor's ledger balance
    #[error("Insufficient points: need {required}, have {available}")]
    InsufficientPoints { required: i64, available: i64 },

    /// Blood-bag acceptance against stock that does not exist
    #[error("Insufficient inventory: blood type {blood_type} is not available at blood bank {blood_bank_id}")]
    InsufficientInventory {
        blood_bank_id: String,
        blood_type: String,
    },

    /// Operation attempted from a state that does not permit it
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Voucher presented at the wrong kind of location
    #[error("Location mismatch: {0}")]
    LocationMismatch(String),

    /// Request payload failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Underlying persistence failure
    #[error("Database error: {0}")]
    Database(String),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Validation(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Application-level Result type
pub type AppResult<T> = Result<T, AppError>;
