//! # Expiration Calculator
//!
//! Pure functions deriving wear state from a record and the current date.
//! Daily lenses expire by pack count, every other category by calendar date.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Added LensStatus snapshot for dashboards
//! - 1.0.0: Initial release

use chrono::NaiveDate;
use serde::Serialize;

use super::record::LensRecord;

/// How close a lens is to its change date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsedPeriod {
    /// More than 6 days left
    New,
    /// 3 to 6 days left
    Used,
    /// 0 to 2 days left
    ReadyToExpire,
}

impl UsedPeriod {
    pub fn from_remaining_days(remaining_days: i64) -> Self {
        match remaining_days {
            i64::MIN..=2 => UsedPeriod::ReadyToExpire,
            3..=6 => UsedPeriod::Used,
            _ => UsedPeriod::New,
        }
    }

    /// Display color used by the dashboard
    pub fn color(&self) -> &'static str {
        match self {
            UsedPeriod::New => "green",
            UsedPeriod::Used => "yellow",
            UsedPeriod::ReadyToExpire => "red",
        }
    }
}

impl std::fmt::Display for UsedPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsedPeriod::New => write!(f, "new"),
            UsedPeriod::Used => write!(f, "used"),
            UsedPeriod::ReadyToExpire => write!(f, "ready_to_expire"),
        }
    }
}

pub fn change_date(record: &LensRecord) -> NaiveDate {
    record.change_date()
}

/// Whole days until the change date, never negative
pub fn remaining_days(record: &LensRecord, today: NaiveDate) -> i64 {
    (record.change_date() - today).num_days().max(0)
}

pub fn is_expired(record: &LensRecord, today: NaiveDate) -> bool {
    if record.wear_duration().is_daily() {
        // A pack without a configured size never expires
        match record.total_count() {
            Some(total) => record.used_count() >= total,
            None => false,
        }
    } else {
        remaining_days(record, today) <= 0
    }
}

/// Fraction of the lens lifetime already used. Not clamped.
pub fn progress(record: &LensRecord, today: NaiveDate) -> f64 {
    if record.wear_duration().is_daily() {
        match record.total_count() {
            Some(total) if total > 0 => f64::from(record.used_count()) / f64::from(total),
            _ => 0.0,
        }
    } else {
        let limit = f64::from(record.wear_duration().limit_days());
        1.0 - remaining_days(record, today) as f64 / limit
    }
}

pub fn used_period(record: &LensRecord, today: NaiveDate) -> UsedPeriod {
    UsedPeriod::from_remaining_days(remaining_days(record, today))
}

/// Snapshot of a record's computed state on a given day
#[derive(Debug, Clone, Serialize)]
pub struct LensStatus {
    pub id: String,
    pub name: String,
    pub change_date: NaiveDate,
    pub remaining_days: i64,
    /// Raw progress fraction
    pub progress: f64,
    /// Progress clamped to 0.0..=1.0 for progress bars
    pub display_progress: f64,
    pub used_period: UsedPeriod,
    pub is_expired: bool,
    pub is_wearing: bool,
}

impl LensStatus {
    pub fn evaluate(record: &LensRecord, today: NaiveDate) -> Self {
        let progress = progress(record, today);
        Self {
            id: record.id().to_string(),
            name: record.name.clone(),
            change_date: record.change_date(),
            remaining_days: remaining_days(record, today),
            progress,
            display_progress: progress.clamp(0.0, 1.0),
            used_period: used_period(record, today),
            is_expired: is_expired(record, today),
            is_wearing: record.is_wearing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lenses::record::{EyeSide, LensDraft};
    use crate::features::lenses::wear_duration::WearDuration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_from_new_year() -> LensRecord {
        let mut draft = LensDraft::new("Monthly", EyeSide::Both, WearDuration::Monthly);
        draft.start_date = Some(date(2024, 1, 1));
        LensRecord::new(draft, date(2024, 1, 1))
    }

    fn daily_pack(total: Option<u32>, used: u32) -> LensRecord {
        let mut draft = LensDraft::new("Dailies", EyeSide::Both, WearDuration::Daily);
        draft.total_count = total;
        let mut record = LensRecord::new(draft, date(2024, 1, 1));
        for _ in 0..used {
            record.increment_used();
        }
        record
    }

    #[test]
    fn test_used_period_thresholds() {
        assert_eq!(UsedPeriod::from_remaining_days(0), UsedPeriod::ReadyToExpire);
        assert_eq!(UsedPeriod::from_remaining_days(1), UsedPeriod::ReadyToExpire);
        assert_eq!(UsedPeriod::from_remaining_days(2), UsedPeriod::ReadyToExpire);
        assert_eq!(UsedPeriod::from_remaining_days(3), UsedPeriod::Used);
        assert_eq!(UsedPeriod::from_remaining_days(6), UsedPeriod::Used);
        assert_eq!(UsedPeriod::from_remaining_days(7), UsedPeriod::New);
        assert_eq!(UsedPeriod::from_remaining_days(300), UsedPeriod::New);
    }

    #[test]
    fn test_used_period_colors() {
        assert_eq!(UsedPeriod::New.color(), "green");
        assert_eq!(UsedPeriod::Used.color(), "yellow");
        assert_eq!(UsedPeriod::ReadyToExpire.color(), "red");
    }

    #[test]
    fn test_monthly_scenario() {
        let record = monthly_from_new_year();
        let today = date(2024, 1, 29);

        assert_eq!(change_date(&record), date(2024, 1, 31));
        assert_eq!(remaining_days(&record, today), 2);
        assert_eq!(used_period(&record, today), UsedPeriod::ReadyToExpire);
        assert!((progress(&record, today) - 0.9333).abs() < 0.001);
        assert!(!is_expired(&record, today));
    }

    #[test]
    fn test_remaining_days_never_negative() {
        let record = monthly_from_new_year();
        for offset in -40..80 {
            let today = date(2024, 1, 31) + chrono::Duration::days(offset);
            assert!(remaining_days(&record, today) >= 0);
        }
        assert_eq!(remaining_days(&record, date(2024, 6, 1)), 0);
    }

    #[test]
    fn test_expired_on_and_after_change_date() {
        let record = monthly_from_new_year();
        assert!(!is_expired(&record, date(2024, 1, 30)));
        assert!(is_expired(&record, date(2024, 1, 31)));
        assert!(is_expired(&record, date(2024, 3, 1)));
    }

    #[test]
    fn test_progress_before_start_is_unclamped() {
        let record = monthly_from_new_year();
        // 40 days left of a 30-day lens
        let raw = progress(&record, date(2023, 12, 22));
        assert!(raw < 0.0);

        let status = LensStatus::evaluate(&record, date(2023, 12, 22));
        assert_eq!(status.display_progress, 0.0);
    }

    #[test]
    fn test_daily_full_pack_is_expired() {
        let record = daily_pack(Some(10), 10);
        // Dates are irrelevant for daily lenses
        assert!(is_expired(&record, date(2020, 1, 1)));
        assert_eq!(progress(&record, date(2020, 1, 1)), 1.0);
    }

    #[test]
    fn test_daily_partial_pack_progress() {
        let record = daily_pack(Some(10), 4);
        assert!((progress(&record, date(2024, 1, 1)) - 0.4).abs() < f64::EPSILON);
        assert!(!is_expired(&record, date(2030, 1, 1)));
    }

    #[test]
    fn test_daily_without_total_count() {
        let record = daily_pack(None, 0);
        assert_eq!(progress(&record, date(2024, 1, 1)), 0.0);
        assert!(!is_expired(&record, date(2024, 1, 1)));
    }

    #[test]
    fn test_daily_with_zero_total_count() {
        let record = daily_pack(Some(0), 0);
        assert_eq!(progress(&record, date(2024, 1, 1)), 0.0);
    }

    #[test]
    fn test_status_snapshot() {
        let record = monthly_from_new_year();
        let status = LensStatus::evaluate(&record, date(2024, 1, 20));

        assert_eq!(status.id, record.id());
        assert_eq!(status.remaining_days, 11);
        assert_eq!(status.used_period, UsedPeriod::New);
        assert!(!status.is_expired);
        assert!(status.display_progress > 0.6 && status.display_progress < 0.7);
    }
}
