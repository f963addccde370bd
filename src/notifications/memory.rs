//! In-memory notification center for embedding and tests.
//!
//! Supports failure injection so callers can exercise degraded scheduling.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use dashmap::DashMap;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{AuthorizationStatus, NotificationCenter, NotificationRequest};
use crate::core::{AuthorizationError, SchedulingError};

pub struct MemoryNotificationCenter {
    pending: DashMap<String, NotificationRequest>,
    status: Mutex<AuthorizationStatus>,
    /// Answer given when authorization is requested
    grant_on_request: AtomicBool,
    fail_authorization: AtomicBool,
    fail_schedule: AtomicBool,
    schedule_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl Default for MemoryNotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNotificationCenter {
    /// An already-authorized center
    pub fn new() -> Self {
        Self::with_status(AuthorizationStatus::Authorized)
    }

    pub fn with_status(status: AuthorizationStatus) -> Self {
        Self {
            pending: DashMap::new(),
            status: Mutex::new(status),
            grant_on_request: AtomicBool::new(true),
            fail_authorization: AtomicBool::new(false),
            fail_schedule: AtomicBool::new(false),
            schedule_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_grant_on_request(&self, grant: bool) {
        self.grant_on_request.store(grant, Ordering::SeqCst);
    }

    pub fn set_fail_authorization(&self, fail: bool) {
        self.fail_authorization.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_schedule(&self, fail: bool) {
        self.fail_schedule.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, identifier: &str) -> Option<NotificationRequest> {
        self.pending.get(identifier).map(|r| r.clone())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of successful `schedule` calls so far
    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    /// Remove and return every request due at or before `now`
    pub fn take_due(&self, now: NaiveDateTime) -> Vec<NotificationRequest> {
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|r| r.trigger_at <= now)
            .map(|r| r.identifier.clone())
            .collect();

        let mut delivered: Vec<NotificationRequest> = due
            .iter()
            .filter_map(|id| self.pending.remove(id).map(|(_, r)| r))
            .collect();
        delivered.sort_by(|a, b| a.trigger_at.cmp(&b.trigger_at));
        delivered
    }

    fn current_status(&self) -> AuthorizationStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: AuthorizationStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

#[async_trait]
impl NotificationCenter for MemoryNotificationCenter {
    async fn request_authorization(&self) -> Result<bool, AuthorizationError> {
        if self.fail_authorization.load(Ordering::SeqCst) {
            return Err(AuthorizationError::RequestFailed(
                "authorization prompt unavailable".to_string(),
            ));
        }

        let granted = self.grant_on_request.load(Ordering::SeqCst);
        self.set_status(if granted {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        });
        Ok(granted)
    }

    async fn authorization_status(&self) -> AuthorizationStatus {
        self.current_status()
    }

    async fn pending_requests(&self) -> Result<Vec<String>, SchedulingError> {
        Ok(self.pending.iter().map(|r| r.key().clone()).collect())
    }

    async fn schedule(&self, request: NotificationRequest) -> Result<(), SchedulingError> {
        if self.fail_schedule.load(Ordering::SeqCst) {
            return Err(SchedulingError::Rejected(request.identifier));
        }
        debug!(
            "Pending notification {} at {}",
            request.identifier, request.trigger_at
        );
        self.pending.insert(request.identifier.clone(), request);
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel(&self, identifiers: &[String]) -> Result<(), SchedulingError> {
        for identifier in identifiers {
            self.pending.remove(identifier);
        }
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
