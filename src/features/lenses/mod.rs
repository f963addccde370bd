//! # Lenses Feature
//!
//! Lens records, the wear-duration policy, expiration math, and the service that
//! applies user actions to the store and the reminder schedule.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Added LensService replace flow
//! - 1.1.0: Daily lenses tracked by pack count
//! - 1.0.0: Initial release

pub mod expiration;
pub mod record;
pub mod service;
pub mod wear_duration;

pub use expiration::{LensStatus, UsedPeriod};
pub use record::{EyeSide, LensDraft, LensEdit, LensRecord, OpticalDetail, Sphere};
pub use service::LensService;
pub use wear_duration::WearDuration;
