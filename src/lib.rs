// Core layer - config, errors, clock
pub mod core;

// Features layer - lens tracking and reminders
pub mod features;

// Collaborators - persistence and notification delivery
pub mod notifications;
pub mod store;

pub use crate::core::{Config, LensError};

pub use features::{
    // Lenses
    LensRecord, LensService, LensStatus, UsedPeriod, WearDuration,
    // Reminders
    ReconcileMode, ReconcileReport, ReminderScheduler, ReminderSettings,
};

pub use notifications::{NotificationCenter, NotificationRequest};
pub use store::RecordStore;
