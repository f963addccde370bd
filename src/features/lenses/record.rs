//! # Lens Record
//!
//! The tracked lens entity. The change date is derived from the start date and
//! wear duration and is recomputed by every setter that touches either of them.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Added LensEdit for partial updates from the edit form
//! - 1.1.0: Sphere and optical detail attached 1:1
//! - 1.0.0: Initial release

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::wear_duration::WearDuration;

/// Which eye a lens is worn in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeSide {
    Left,
    Right,
    Both,
}

impl std::fmt::Display for EyeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EyeSide::Left => write!(f, "left"),
            EyeSide::Right => write!(f, "right"),
            EyeSide::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for EyeSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "left" => Ok(EyeSide::Left),
            "right" => Ok(EyeSide::Right),
            "both" => Ok(EyeSide::Both),
            _ => Err(anyhow::anyhow!("Invalid eye side: {}", s)),
        }
    }
}

/// Spherical power per eye, in diopters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sphere {
    pub left: Option<f32>,
    pub right: Option<f32>,
}

/// Fitting parameters printed on the lens box
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpticalDetail {
    pub base_curve: Option<f32>,
    pub diameter: Option<f32>,
    pub cylinder: Option<f32>,
    pub axis: Option<u16>,
    pub brand: Option<String>,
}

/// Input for creating a new lens record
#[derive(Debug, Clone)]
pub struct LensDraft {
    pub name: String,
    pub eye_side: EyeSide,
    pub wear_duration: WearDuration,
    /// Defaults to today when not given
    pub start_date: Option<NaiveDate>,
    pub total_count: Option<u32>,
    pub is_wearing: bool,
    pub sphere: Option<Sphere>,
    pub optical_detail: Option<OpticalDetail>,
}

impl LensDraft {
    pub fn new(name: impl Into<String>, eye_side: EyeSide, wear_duration: WearDuration) -> Self {
        Self {
            name: name.into(),
            eye_side,
            wear_duration,
            start_date: None,
            total_count: None,
            is_wearing: false,
            sphere: None,
            optical_detail: None,
        }
    }
}

/// Partial update from the edit form. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct LensEdit {
    pub name: Option<String>,
    pub eye_side: Option<EyeSide>,
    pub wear_duration: Option<WearDuration>,
    pub start_date: Option<NaiveDate>,
    /// `Some(None)` clears the pack size
    pub total_count: Option<Option<u32>>,
    pub sphere: Option<Sphere>,
    pub optical_detail: Option<OpticalDetail>,
}

impl LensEdit {
    /// Whether applying this edit can move the change date
    pub fn touches_schedule(&self) -> bool {
        self.start_date.is_some() || self.wear_duration.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredLens")]
pub struct LensRecord {
    id: String,
    pub name: String,
    pub eye_side: EyeSide,
    wear_duration: WearDuration,
    start_date: NaiveDate,
    change_date: NaiveDate,
    used_count: u32,
    total_count: Option<u32>,
    pub is_wearing: bool,
    pub sphere: Option<Sphere>,
    pub optical_detail: Option<OpticalDetail>,
    created_at: DateTime<Utc>,
}

/// Persisted shape of a record. The change date is never trusted from storage.
#[derive(Deserialize)]
struct StoredLens {
    id: String,
    name: String,
    eye_side: EyeSide,
    wear_duration: WearDuration,
    start_date: NaiveDate,
    #[serde(default)]
    used_count: u32,
    #[serde(default)]
    total_count: Option<u32>,
    #[serde(default)]
    is_wearing: bool,
    #[serde(default)]
    sphere: Option<Sphere>,
    #[serde(default)]
    optical_detail: Option<OpticalDetail>,
    created_at: DateTime<Utc>,
}

impl From<StoredLens> for LensRecord {
    fn from(stored: StoredLens) -> Self {
        let mut record = LensRecord {
            id: stored.id,
            name: stored.name,
            eye_side: stored.eye_side,
            wear_duration: stored.wear_duration,
            start_date: stored.start_date,
            change_date: stored.start_date,
            used_count: stored.used_count,
            total_count: stored.total_count,
            is_wearing: stored.is_wearing,
            sphere: stored.sphere,
            optical_detail: stored.optical_detail,
            created_at: stored.created_at,
        };
        record.recompute_change_date();
        record.clamp_used_count();
        record
    }
}

impl LensRecord {
    /// Create a record with a fresh id. The start date defaults to `today`.
    pub fn new(draft: LensDraft, today: NaiveDate) -> Self {
        let start_date = draft.start_date.unwrap_or(today);
        let mut record = LensRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            eye_side: draft.eye_side,
            wear_duration: draft.wear_duration,
            start_date,
            change_date: start_date,
            used_count: 0,
            total_count: draft.total_count,
            is_wearing: draft.is_wearing,
            sphere: draft.sphere,
            optical_detail: draft.optical_detail,
            created_at: Utc::now(),
        };
        record.recompute_change_date();
        record
    }

    /// Start a fresh pair with the same parameters, starting `today`
    pub fn replacement(&self, today: NaiveDate) -> Self {
        let draft = LensDraft {
            name: self.name.clone(),
            eye_side: self.eye_side,
            wear_duration: self.wear_duration,
            start_date: Some(today),
            total_count: self.total_count,
            is_wearing: true,
            sphere: self.sphere.clone(),
            optical_detail: self.optical_detail.clone(),
        };
        LensRecord::new(draft, today)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn wear_duration(&self) -> WearDuration {
        self.wear_duration
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn change_date(&self) -> NaiveDate {
        self.change_date
    }

    pub fn used_count(&self) -> u32 {
        self.used_count
    }

    pub fn total_count(&self) -> Option<u32> {
        self.total_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_start_date(&mut self, start_date: NaiveDate) {
        self.start_date = start_date;
        self.recompute_change_date();
    }

    pub fn set_wear_duration(&mut self, wear_duration: WearDuration) {
        self.wear_duration = wear_duration;
        self.recompute_change_date();
    }

    /// Set the pack size. The used count is clamped to the new total.
    pub fn set_total_count(&mut self, total_count: Option<u32>) {
        self.total_count = total_count;
        self.clamp_used_count();
    }

    /// Record one more lens taken from the pack. Daily lenses only.
    ///
    /// Returns `true` if the count changed.
    pub fn increment_used(&mut self) -> bool {
        if !self.wear_duration.is_daily() {
            return false;
        }
        let total = self.total_count.unwrap_or(0);
        if self.used_count >= total {
            return false;
        }
        self.used_count += 1;
        true
    }

    /// Undo one used lens. Daily lenses only.
    ///
    /// Returns `true` if the count changed.
    pub fn decrement_used(&mut self) -> bool {
        if !self.wear_duration.is_daily() || self.used_count == 0 {
            return false;
        }
        self.used_count -= 1;
        true
    }

    pub fn apply_edit(&mut self, edit: LensEdit) {
        if let Some(name) = edit.name {
            self.name = name;
        }
        if let Some(eye_side) = edit.eye_side {
            self.eye_side = eye_side;
        }
        if let Some(wear_duration) = edit.wear_duration {
            self.set_wear_duration(wear_duration);
        }
        if let Some(start_date) = edit.start_date {
            self.set_start_date(start_date);
        }
        if let Some(total_count) = edit.total_count {
            self.set_total_count(total_count);
        }
        if let Some(sphere) = edit.sphere {
            self.sphere = Some(sphere);
        }
        if let Some(optical_detail) = edit.optical_detail {
            self.optical_detail = Some(optical_detail);
        }
    }

    fn recompute_change_date(&mut self) {
        self.change_date = change_date_for(self.start_date, self.wear_duration);
    }

    fn clamp_used_count(&mut self) {
        let total = self.total_count.unwrap_or(0);
        if self.used_count > total {
            self.used_count = total;
        }
    }
}

/// Calendar-day arithmetic: `start + limit days`, independent of DST
pub fn change_date_for(start_date: NaiveDate, wear_duration: WearDuration) -> NaiveDate {
    let days = Days::new(u64::from(wear_duration.limit_days()));
    start_date.checked_add_days(days).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(total: u32) -> LensRecord {
        let mut draft = LensDraft::new("Dailies", EyeSide::Both, WearDuration::Daily);
        draft.total_count = Some(total);
        LensRecord::new(draft, date(2024, 1, 1))
    }

    #[test]
    fn test_new_defaults_start_to_today() {
        let draft = LensDraft::new("Acuvue", EyeSide::Left, WearDuration::Monthly);
        let record = LensRecord::new(draft, date(2024, 1, 1));
        assert_eq!(record.start_date(), date(2024, 1, 1));
        assert_eq!(record.change_date(), date(2024, 1, 31));
        assert_eq!(record.used_count(), 0);
        assert!(!record.id().is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = daily(10);
        let b = daily(10);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_change_date_tracks_setters() {
        let draft = LensDraft::new("Acuvue", EyeSide::Right, WearDuration::Biweekly);
        let mut record = LensRecord::new(draft, date(2024, 1, 1));
        assert_eq!(record.change_date(), date(2024, 1, 15));

        record.set_wear_duration(WearDuration::Quarterly);
        assert_eq!(record.change_date(), date(2024, 3, 31));

        record.set_start_date(date(2024, 2, 1));
        assert_eq!(record.change_date(), date(2024, 5, 1));
    }

    #[test]
    fn test_change_date_across_dst_boundary() {
        // 2024-03-10 is the US spring-forward day
        let start = date(2024, 3, 9);
        assert_eq!(
            change_date_for(start, WearDuration::Monthly),
            date(2024, 4, 8)
        );
        // 2024-03-31 is the EU spring-forward day
        assert_eq!(
            change_date_for(date(2024, 3, 30), WearDuration::Monthly),
            date(2024, 4, 29)
        );
    }

    #[test]
    fn test_change_date_for_every_category() {
        let start = date(2024, 1, 1);
        for duration in WearDuration::ALL {
            let expected = start + chrono::Duration::days(i64::from(duration.limit_days()));
            assert_eq!(change_date_for(start, duration), expected);
        }
    }

    #[test]
    fn test_increment_clamped_to_total() {
        let mut record = daily(2);
        assert!(record.increment_used());
        assert!(record.increment_used());
        assert!(!record.increment_used());
        assert_eq!(record.used_count(), 2);
    }

    #[test]
    fn test_decrement_clamped_to_zero() {
        let mut record = daily(2);
        assert!(!record.decrement_used());
        record.increment_used();
        assert!(record.decrement_used());
        assert_eq!(record.used_count(), 0);
    }

    #[test]
    fn test_counts_ignored_for_non_daily() {
        let mut draft = LensDraft::new("Monthly", EyeSide::Both, WearDuration::Monthly);
        draft.total_count = Some(6);
        let mut record = LensRecord::new(draft, date(2024, 1, 1));
        assert!(!record.increment_used());
        assert_eq!(record.used_count(), 0);
    }

    #[test]
    fn test_without_total_count_cannot_increment() {
        let draft = LensDraft::new("Dailies", EyeSide::Both, WearDuration::Daily);
        let mut record = LensRecord::new(draft, date(2024, 1, 1));
        assert!(!record.increment_used());
    }

    #[test]
    fn test_shrinking_total_clamps_used() {
        let mut record = daily(10);
        for _ in 0..8 {
            record.increment_used();
        }
        record.set_total_count(Some(5));
        assert_eq!(record.used_count(), 5);
    }

    #[test]
    fn test_apply_edit() {
        let draft = LensDraft::new("Old", EyeSide::Left, WearDuration::Monthly);
        let mut record = LensRecord::new(draft, date(2024, 1, 1));
        let edit = LensEdit {
            name: Some("New".to_string()),
            wear_duration: Some(WearDuration::Biweekly),
            start_date: Some(date(2024, 2, 1)),
            ..Default::default()
        };
        assert!(edit.touches_schedule());
        record.apply_edit(edit);

        assert_eq!(record.name, "New");
        assert_eq!(record.eye_side, EyeSide::Left);
        assert_eq!(record.change_date(), date(2024, 2, 15));
    }

    #[test]
    fn test_edit_resizes_and_clears_pack() {
        let mut record = daily(30);
        for _ in 0..12 {
            record.increment_used();
        }

        record.apply_edit(LensEdit {
            total_count: Some(Some(10)),
            ..Default::default()
        });
        assert_eq!(record.total_count(), Some(10));
        assert_eq!(record.used_count(), 10);

        record.apply_edit(LensEdit::default());
        assert_eq!(record.total_count(), Some(10));

        record.apply_edit(LensEdit {
            total_count: Some(None),
            ..Default::default()
        });
        assert_eq!(record.total_count(), None);
        assert_eq!(record.used_count(), 0);
        assert!(!record.increment_used());
    }

    #[test]
    fn test_replacement_copies_parameters() {
        let mut draft = LensDraft::new("Air Optix", EyeSide::Right, WearDuration::Monthly);
        draft.sphere = Some(Sphere {
            left: None,
            right: Some(-2.5),
        });
        let old = LensRecord::new(draft, date(2024, 1, 1));
        let fresh = old.replacement(date(2024, 2, 1));

        assert_ne!(fresh.id(), old.id());
        assert_eq!(fresh.name, old.name);
        assert_eq!(fresh.sphere, old.sphere);
        assert_eq!(fresh.start_date(), date(2024, 2, 1));
        assert_eq!(fresh.change_date(), date(2024, 3, 2));
        assert!(fresh.is_wearing);
    }

    #[test]
    fn test_deserialize_recomputes_change_date() {
        let record = daily(10);
        let mut json = serde_json::to_value(&record).unwrap();
        json["change_date"] = serde_json::json!("1999-01-01");
        json["used_count"] = serde_json::json!(50);

        let restored: LensRecord = serde_json::from_value(json).unwrap();
        assert_eq!(restored.change_date(), date(2024, 1, 2));
        assert_eq!(restored.used_count(), 10);
        assert_eq!(restored.id(), record.id());
    }

    #[test]
    fn test_eye_side_parse() {
        assert_eq!("LEFT".parse::<EyeSide>().unwrap(), EyeSide::Left);
        assert_eq!(EyeSide::Both.to_string(), "both");
        assert!("middle".parse::<EyeSide>().is_err());
    }
}
