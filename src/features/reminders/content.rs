//! # Reminder Content
//!
//! Title/body text for lens reminders.

use chrono::NaiveDate;

/// Which message a reminder carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    /// Fires one calendar day before the change date
    ReplaceTomorrow,
    /// Fires on the change date
    Expired,
    /// Fires further ahead of the change date
    Upcoming,
}

impl ReminderKind {
    /// Pick the message for a reminder firing on `fire_date`
    pub fn for_dates(fire_date: NaiveDate, change_date: NaiveDate) -> Self {
        match (change_date - fire_date).num_days() {
            1 => ReminderKind::ReplaceTomorrow,
            0 => ReminderKind::Expired,
            _ => ReminderKind::Upcoming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderContent {
    pub kind: ReminderKind,
    pub title: String,
    pub body: String,
}

impl ReminderContent {
    pub fn new(kind: ReminderKind, lens_name: &str, change_date: NaiveDate) -> Self {
        let (title, body) = match kind {
            ReminderKind::ReplaceTomorrow => (
                "Prepare New Lenses".to_string(),
                format!("Your {lens_name} lenses need to be replaced by tomorrow."),
            ),
            ReminderKind::Expired => (
                "Lenses Expired".to_string(),
                format!("Your {lens_name} lenses have expired. Time to switch to a fresh pair."),
            ),
            ReminderKind::Upcoming => (
                "Lens Change Coming Up".to_string(),
                format!(
                    "Your {lens_name} lenses need replacing on {}.",
                    format_change_date(change_date)
                ),
            ),
        };
        Self { kind, title, body }
    }

    /// Content for a reminder firing on `fire_date`
    pub fn for_dates(lens_name: &str, fire_date: NaiveDate, change_date: NaiveDate) -> Self {
        Self::new(
            ReminderKind::for_dates(fire_date, change_date),
            lens_name,
            change_date,
        )
    }
}

/// e.g. "Jan 31, 2024"
pub fn format_change_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
