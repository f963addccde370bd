//! # Feature: Lens Service
//!
//! Entry point for every user action on lens records. Each mutation is committed to
//! the record store first; the matching reminder work runs afterwards and can never
//! fail the mutation. Mutations run one at a time, from the first read through the
//! reminder update, and a failed mutation leaves nothing staged behind.
//!
//! - **Version**: 1.3.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.3.0: Serialized mutations; staged changes are discarded when an operation fails
//! - 1.2.0: Replace flow starts a fresh pair and retires the old record
//! - 1.1.0: Only one lens may be marked as currently worn
//! - 1.0.0: Initial release

use log::{debug, info};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::expiration::LensStatus;
use super::record::{LensDraft, LensEdit, LensRecord};
use crate::core::error::{LensError, Result};
use crate::core::Clock;
use crate::features::reminders::{ReconcileMode, ReconcileReport, ReminderScheduler};
use crate::store::RecordStore;

pub struct LensService {
    store: Arc<dyn RecordStore>,
    scheduler: ReminderScheduler,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl LensService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        scheduler: ReminderScheduler,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            scheduler,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Result<Vec<LensRecord>> {
        Ok(self.store.fetch_all().await?)
    }

    pub async fn get(&self, id: &str) -> Result<LensRecord> {
        self.store
            .fetch(id)
            .await?
            .ok_or_else(|| LensError::NotFound(id.to_string()))
    }

    /// The lens currently marked as worn, if any
    pub async fn current(&self) -> Result<Option<LensRecord>> {
        Ok(self
            .store
            .fetch_all()
            .await?
            .into_iter()
            .find(|r| r.is_wearing))
    }

    pub async fn create(&self, draft: LensDraft) -> Result<LensRecord> {
        let _guard = self.write_lock.lock().await;
        let record = LensRecord::new(draft, self.clock.today());
        let staged = self.stage_create(&record).await;
        self.commit(staged).await?;

        info!(
            "Created lens {} ({}, {}) changing on {}",
            record.id(),
            record.name,
            record.wear_duration(),
            record.change_date()
        );

        self.scheduler
            .schedule_record(&record, self.clock.now())
            .await;
        Ok(record)
    }

    /// Start a fresh pair with the same parameters and retire the old record
    pub async fn replace(&self, id: &str) -> Result<LensRecord> {
        let _guard = self.write_lock.lock().await;
        let old = self.get(id).await?;
        let fresh = old.replacement(self.clock.today());
        let staged = self.stage_replace(&old, &fresh).await;
        self.commit(staged).await?;

        info!("Replaced lens {} with {}", old.id(), fresh.id());

        self.scheduler.cancel_record(old.id()).await;
        self.scheduler
            .schedule_record(&fresh, self.clock.now())
            .await;
        Ok(fresh)
    }

    pub async fn edit(&self, id: &str, edit: LensEdit) -> Result<LensRecord> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.get(id).await?;
        let touches_schedule = edit.touches_schedule();
        record.apply_edit(edit);

        let staged = self.store.update(&record).await.map_err(LensError::from);
        self.commit(staged).await?;

        if touches_schedule {
            info!(
                "Lens {} now changes on {}",
                record.id(),
                record.change_date()
            );
        } else {
            debug!("Updated lens {}", record.id());
        }

        // The save path always reschedules, even if the dates did not move
        self.scheduler
            .schedule_record(&record, self.clock.now())
            .await;
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let record = self.get(id).await?;
        let staged = self.store.delete(record.id()).await.map_err(LensError::from);
        self.commit(staged).await?;
        info!("Deleted lens {} ({})", record.id(), record.name);

        self.scheduler.cancel_record(record.id()).await;
        Ok(())
    }

    /// Mark one lens as worn and clear the flag everywhere else
    pub async fn set_wearing(&self, id: &str) -> Result<LensRecord> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.get(id).await?;
        let staged = self.stage_wearing(&mut record).await;
        self.commit(staged).await?;
        debug!("Lens {} marked as worn", record.id());
        Ok(record)
    }

    pub async fn increment_used(&self, id: &str) -> Result<LensRecord> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.get(id).await?;
        if record.increment_used() {
            let staged = self.store.update(&record).await.map_err(LensError::from);
            self.commit(staged).await?;
        }
        Ok(record)
    }

    pub async fn decrement_used(&self, id: &str) -> Result<LensRecord> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.get(id).await?;
        if record.decrement_used() {
            let staged = self.store.update(&record).await.map_err(LensError::from);
            self.commit(staged).await?;
        }
        Ok(record)
    }

    /// Computed status of every lens as of today
    pub async fn dashboard(&self) -> Result<Vec<LensStatus>> {
        let today = self.clock.today();
        Ok(self
            .store
            .fetch_all()
            .await?
            .iter()
            .map(|r| LensStatus::evaluate(r, today))
            .collect())
    }

    /// Fill in reminders for records that have none pending
    pub async fn refresh_reminders(&self) -> Result<ReconcileReport> {
        let records = self.store.fetch_all().await?;
        Ok(self
            .scheduler
            .reconcile(&records, ReconcileMode::Incremental, self.clock.now())
            .await)
    }

    /// Rebuild every reminder from scratch
    pub async fn reconcile_all(&self) -> Result<ReconcileReport> {
        let records = self.store.fetch_all().await?;
        Ok(self
            .scheduler
            .reconcile(&records, ReconcileMode::Force, self.clock.now())
            .await)
    }

    /// Save what was staged, or drop it when staging failed part way
    async fn commit(&self, staged: Result<()>) -> Result<()> {
        if let Err(e) = staged {
            self.store.discard().await;
            return Err(e);
        }
        Ok(self.store.save().await?)
    }

    async fn stage_create(&self, record: &LensRecord) -> Result<()> {
        self.store.insert(record).await?;
        if record.is_wearing {
            self.stage_stop_wearing_except(record.id()).await?;
        }
        Ok(())
    }

    async fn stage_replace(&self, old: &LensRecord, fresh: &LensRecord) -> Result<()> {
        self.store.insert(fresh).await?;
        self.stage_stop_wearing_except(fresh.id()).await?;
        self.store.delete(old.id()).await?;
        Ok(())
    }

    async fn stage_wearing(&self, record: &mut LensRecord) -> Result<()> {
        if !record.is_wearing {
            record.is_wearing = true;
            self.store.update(record).await?;
        }
        self.stage_stop_wearing_except(record.id()).await
    }

    async fn stage_stop_wearing_except(&self, keep_id: &str) -> Result<()> {
        for mut other in self.store.fetch_all().await? {
            if other.is_wearing && other.id() != keep_id {
                other.is_wearing = false;
                self.store.update(&other).await?;
            }
        }
        Ok(())
    }
}
