//! # Notification Delivery
//!
//! The local-notification primitive the reminder scheduler drives. Requests are keyed
//! by identifier: scheduling an identifier that is already pending replaces it.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Added SQLite-backed queue for the reminder daemon
//! - 1.0.0: Initial release with in-memory center

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::{AuthorizationError, SchedulingError};

pub use memory::MemoryNotificationCenter;
pub use sqlite::SqliteNotificationCenter;

/// Permission state for local notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    NotDetermined,
    Authorized,
    Denied,
    Provisional,
}

impl AuthorizationStatus {
    /// Whether notifications may be scheduled
    pub fn allows_delivery(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Authorized | AuthorizationStatus::Provisional
        )
    }
}

/// A single local notification fired at a wall-clock time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: String,
    /// Local date and time the notification fires
    pub trigger_at: NaiveDateTime,
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationCenter: Send + Sync {
    /// Ask the user for permission. `Ok(false)` means the user declined.
    async fn request_authorization(&self) -> Result<bool, AuthorizationError>;

    async fn authorization_status(&self) -> AuthorizationStatus;

    /// Identifiers of every request not yet delivered
    async fn pending_requests(&self) -> Result<Vec<String>, SchedulingError>;

    /// Add a request, replacing any pending request with the same identifier
    async fn schedule(&self, request: NotificationRequest) -> Result<(), SchedulingError>;

    /// Remove pending requests. Unknown identifiers are ignored.
    async fn cancel(&self, identifiers: &[String]) -> Result<(), SchedulingError>;
}
