//! # Reminders Feature
//!
//! Local reminder notifications ahead of and on each lens change date.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 2.0.0: Reminders keyed per lens record, reconciled against pending notifications
//! - 1.0.0: Initial release

pub mod content;
pub mod scheduler;

pub use content::{format_change_date, ReminderContent, ReminderKind};
pub use scheduler::{
    owner_of, plan, ReconcileMode, ReconcileReport, ReminderIds, ReminderScheduler,
    ReminderSettings,
};
