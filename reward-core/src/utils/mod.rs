//! Utility module - error types, logging, concurrency helpers

pub mod error;
pub mod locks;
pub mod logger;

pub use error::{AppError, AppResult};
pub use locks::DonorLocks;
