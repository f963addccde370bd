//! # Wear Duration Policy
//!
//! Fixed day limits for each lens replacement category.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use serde::{Deserialize, Serialize};

/// Replacement category of a lens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WearDuration {
    Daily,
    Biweekly,
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl WearDuration {
    pub const ALL: [WearDuration; 6] = [
        WearDuration::Daily,
        WearDuration::Biweekly,
        WearDuration::Monthly,
        WearDuration::Quarterly,
        WearDuration::HalfYearly,
        WearDuration::Yearly,
    ];

    /// Number of calendar days a lens of this category may be worn
    pub const fn limit_days(self) -> u32 {
        match self {
            WearDuration::Daily => 1,
            WearDuration::Biweekly => 14,
            WearDuration::Monthly => 30,
            WearDuration::Quarterly => 90,
            WearDuration::HalfYearly => 180,
            WearDuration::Yearly => 360,
        }
    }

    /// Daily lenses are tracked by pack count instead of by date
    pub fn is_daily(self) -> bool {
        matches!(self, WearDuration::Daily)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WearDuration::Daily => "daily",
            WearDuration::Biweekly => "biweekly",
            WearDuration::Monthly => "monthly",
            WearDuration::Quarterly => "quarterly",
            WearDuration::HalfYearly => "half_yearly",
            WearDuration::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for WearDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WearDuration {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(WearDuration::Daily),
            "biweekly" => Ok(WearDuration::Biweekly),
            "monthly" => Ok(WearDuration::Monthly),
            "quarterly" => Ok(WearDuration::Quarterly),
            "half_yearly" => Ok(WearDuration::HalfYearly),
            "yearly" => Ok(WearDuration::Yearly),
            _ => Err(anyhow::anyhow!("Invalid wear duration: {}", s)),
        }
    }
}
