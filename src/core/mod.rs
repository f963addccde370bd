//! # Core Module
//!
//! Configuration and error types shared by every lenscare layer.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Split collaborator errors into StorageError, AuthorizationError and SchedulingError
//! - 1.0.0: Initial creation with config module

pub mod clock;
pub mod config;
pub mod error;

// Re-export commonly used items
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{AuthorizationError, LensError, SchedulingError, StorageError};
