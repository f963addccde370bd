//! # Error Types
//!
//! Typed errors for the record store and notification collaborators, plus the
//! service-level error surfaced to callers.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use thiserror::Error;

/// Failure against the record store. Surfaced to the caller, never retried.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlite::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record already exists: {0}")]
    Duplicate(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

/// Notification permission request failed. Treated as "not granted".
#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Authorization request failed: {0}")]
    RequestFailed(String),
}

/// An individual schedule/cancel call failed. Logged only.
#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlite::Error),

    #[error("Notification rejected: {0}")]
    Rejected(String),

    #[error("Notification center unavailable: {0}")]
    Unavailable(String),
}

/// Error returned by lens service operations
#[derive(Error, Debug)]
pub enum LensError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Lens not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, LensError>;
