//! # Feature: Reminder Scheduler
//!
//! Turns lens change dates into local notifications and keeps the pending set in
//! sync with the record store. Each record owns two identifiers,
//! `{id}-day-before` and `{id}-day-of`, so work on one record never touches another
//! record's reminders.
//!
//! Work on a single record runs under that record's lock; different records are
//! reconciled as parallel tasks. Scheduling failures are logged and counted, never
//! returned to the caller. Once a record's reminders are cancelled its id is retired
//! and later schedule attempts for it are ignored.
//!
//! - **Version**: 1.4.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.4.0: Retired record ids, lock entries dropped only when unused
//! - 1.3.0: Per-record locks, parallel reconcile tasks
//! - 1.2.0: Incremental mode only fills records with nothing pending
//! - 1.1.0: Day-before reminder with configurable lead time
//! - 1.0.0: Initial release with day-of reminders

use chrono::{Days, NaiveDateTime, NaiveTime};
use dashmap::{DashMap, DashSet};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use super::content::{ReminderContent, ReminderKind};
use crate::features::lenses::LensRecord;
use crate::notifications::{AuthorizationStatus, NotificationCenter, NotificationRequest};

pub const DAY_BEFORE_SUFFIX: &str = "-day-before";
pub const DAY_OF_SUFFIX: &str = "-day-of";

/// When reminders fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderSettings {
    /// Days before the change date for the early reminder. 0 disables it.
    pub lead_days: u32,
    pub hour: u32,
    pub minute: u32,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            lead_days: 1,
            hour: 10,
            minute: 0,
        }
    }
}

impl ReminderSettings {
    /// Local time of day reminders fire at. Out-of-range values fall back to 10:00.
    pub fn fire_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
            .or_else(|| NaiveTime::from_hms_opt(10, 0, 0))
            .unwrap_or_default()
    }
}

/// The pair of notification identifiers owned by one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderIds {
    pub day_before: String,
    pub day_of: String,
}

impl ReminderIds {
    pub fn for_record(record_id: &str) -> Self {
        Self {
            day_before: format!("{record_id}{DAY_BEFORE_SUFFIX}"),
            day_of: format!("{record_id}{DAY_OF_SUFFIX}"),
        }
    }

    pub fn both(&self) -> Vec<String> {
        vec![self.day_before.clone(), self.day_of.clone()]
    }
}

/// Record id a reminder identifier belongs to, if it is a lens reminder
pub fn owner_of(identifier: &str) -> Option<&str> {
    identifier
        .strip_suffix(DAY_BEFORE_SUFFIX)
        .or_else(|| identifier.strip_suffix(DAY_OF_SUFFIX))
        .filter(|id| !id.is_empty())
}

/// Every reminder a record should have, regardless of whether it is in the past
pub fn plan(record: &LensRecord, settings: &ReminderSettings) -> Vec<NotificationRequest> {
    let ids = ReminderIds::for_record(record.id());
    let change_date = record.change_date();
    let fire_time = settings.fire_time();
    let mut requests = Vec::with_capacity(2);

    if settings.lead_days > 0 {
        if let Some(lead_date) =
            change_date.checked_sub_days(Days::new(u64::from(settings.lead_days)))
        {
            let content = ReminderContent::for_dates(&record.name, lead_date, change_date);
            requests.push(NotificationRequest {
                identifier: ids.day_before,
                trigger_at: lead_date.and_time(fire_time),
                title: content.title,
                body: content.body,
            });
        }
    }

    let content = ReminderContent::new(ReminderKind::Expired, &record.name, change_date);
    requests.push(NotificationRequest {
        identifier: ids.day_of,
        trigger_at: change_date.and_time(fire_time),
        title: content.title,
        body: content.body,
    });

    requests
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Only schedule records with neither identifier pending
    Incremental,
    /// Cancel every pending lens reminder, then schedule all records
    Force,
}

/// Outcome counters for a scheduling pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Notification requests handed to the center
    pub scheduled: usize,
    /// Reminders not scheduled because their time has passed
    pub past_due: usize,
    /// Records left alone because their reminders are already pending
    pub up_to_date: usize,
    /// Schedule/cancel calls that failed
    pub failed: usize,
}

impl ReconcileReport {
    fn merge(&mut self, other: ReconcileReport) {
        self.scheduled += other.scheduled;
        self.past_due += other.past_due;
        self.up_to_date += other.up_to_date;
        self.failed += other.failed;
    }
}

#[derive(Clone)]
pub struct ReminderScheduler {
    center: Arc<dyn NotificationCenter>,
    settings: ReminderSettings,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    retired: Arc<DashSet<String>>,
}

impl ReminderScheduler {
    pub fn new(center: Arc<dyn NotificationCenter>, settings: ReminderSettings) -> Self {
        Self {
            center,
            settings,
            locks: Arc::new(DashMap::new()),
            retired: Arc::new(DashSet::new()),
        }
    }

    pub fn settings(&self) -> &ReminderSettings {
        &self.settings
    }

    /// Check permission, prompting once if the user has not decided yet
    pub async fn ensure_authorized(&self) -> bool {
        match self.center.authorization_status().await {
            AuthorizationStatus::NotDetermined => {
                match self.center.request_authorization().await {
                    Ok(granted) => {
                        if !granted {
                            info!("Notification permission declined, reminders disabled");
                        }
                        granted
                    }
                    Err(e) => {
                        warn!("Notification authorization failed: {}", e);
                        false
                    }
                }
            }
            status => {
                if !status.allows_delivery() {
                    debug!("Notifications not authorized ({:?})", status);
                }
                status.allows_delivery()
            }
        }
    }

    /// Replace both reminders of one record. Used on every save.
    pub async fn schedule_record(&self, record: &LensRecord, now: NaiveDateTime) -> ReconcileReport {
        if !self.ensure_authorized().await {
            return ReconcileReport::default();
        }
        self.schedule_locked(record, now).await
    }

    /// Cancel both reminders of a deleted record and retire its id
    pub async fn cancel_record(&self, record_id: &str) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        self.retired.insert(record_id.to_string());
        let lock = self.record_lock(record_id);
        {
            let _guard = lock.lock().await;
            let ids = ReminderIds::for_record(record_id).both();
            if let Err(e) = self.center.cancel(&ids).await {
                warn!("Failed to cancel reminders for lens {}: {}", record_id, e);
                report.failed += 1;
            } else {
                debug!("Cancelled reminders for lens {}", record_id);
            }
        }
        drop(lock);
        // Another task may still hold or wait on this lock
        self.locks
            .remove_if(record_id, |_, lock| Arc::strong_count(lock) == 1);
        report
    }

    pub fn is_retired(&self, record_id: &str) -> bool {
        self.retired.contains(record_id)
    }

    pub async fn reconcile(
        &self,
        records: &[LensRecord],
        mode: ReconcileMode,
        now: NaiveDateTime,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        if !self.ensure_authorized().await {
            return report;
        }

        let pending = match self.center.pending_requests().await {
            Ok(pending) => pending,
            Err(e) => {
                warn!("Could not read pending reminders: {}", e);
                report.failed += 1;
                if mode == ReconcileMode::Incremental {
                    return report;
                }
                Vec::new()
            }
        };

        let to_schedule: Vec<LensRecord> = match mode {
            ReconcileMode::Force => {
                let stale: Vec<String> = pending
                    .into_iter()
                    .filter(|id| owner_of(id).is_some())
                    .collect();
                if !stale.is_empty() {
                    if let Err(e) = self.center.cancel(&stale).await {
                        warn!("Failed to clear {} pending reminders: {}", stale.len(), e);
                        report.failed += 1;
                    }
                }
                records.to_vec()
            }
            ReconcileMode::Incremental => {
                let pending: HashSet<String> = pending.into_iter().collect();
                records
                    .iter()
                    .filter(|record| {
                        let ids = ReminderIds::for_record(record.id());
                        let has_any =
                            pending.contains(&ids.day_before) || pending.contains(&ids.day_of);
                        if has_any {
                            report.up_to_date += 1;
                        }
                        !has_any
                    })
                    .cloned()
                    .collect()
            }
        };

        let mut tasks = JoinSet::new();
        for record in to_schedule {
            let scheduler = self.clone();
            tasks.spawn(async move { scheduler.schedule_locked(&record, now).await });
        }
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(outcome) => report.merge(outcome),
                Err(e) => {
                    warn!("Reminder task failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Reminder reconcile ({:?}): {} scheduled, {} up to date, {} past due, {} failed",
            mode, report.scheduled, report.up_to_date, report.past_due, report.failed
        );
        report
    }

    fn record_lock(&self, record_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(record_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn schedule_locked(&self, record: &LensRecord, now: NaiveDateTime) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let lock = self.record_lock(record.id());
        let _guard = lock.lock().await;
        if self.is_retired(record.id()) {
            debug!("Lens {} was deleted, not scheduling", record.id());
            return report;
        }

        // Cancel is always issued before the replacement schedule
        let ids = ReminderIds::for_record(record.id()).both();
        if let Err(e) = self.center.cancel(&ids).await {
            warn!("Failed to cancel reminders for lens {}: {}", record.id(), e);
            report.failed += 1;
        }

        for request in plan(record, &self.settings) {
            if request.trigger_at <= now {
                debug!("Skipping past reminder {}", request.identifier);
                report.past_due += 1;
                continue;
            }
            let identifier = request.identifier.clone();
            match self.center.schedule(request).await {
                Ok(()) => report.scheduled += 1,
                Err(e) => {
                    warn!("Failed to schedule reminder {}: {}", identifier, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
