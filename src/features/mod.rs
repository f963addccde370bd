//! # Features
//!
//! Lens tracking and reminder features.

pub mod lenses;
pub mod reminders;

pub use lenses::{LensRecord, LensService, LensStatus, UsedPeriod, WearDuration};
pub use reminders::{ReconcileMode, ReconcileReport, ReminderScheduler, ReminderSettings};
