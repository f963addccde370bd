//! # Configuration
//!
//! Environment-driven settings for the reminder daemon and the lens service.
//! Call `dotenvy::dotenv().ok()` before `Config::from_env()` to pick up a `.env` file.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Added REMINDER_MINUTE and REFRESH_INTERVAL_SECS
//! - 1.0.0: Initial release

use anyhow::{anyhow, Result};
use std::env;
use std::str::FromStr;

use crate::features::reminders::ReminderSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub log_level: String,
    /// Days before the change date to send the first reminder (0 disables it)
    pub reminder_lead_days: u32,
    pub reminder_hour: u32,
    pub reminder_minute: u32,
    /// How often the daemon refreshes reminders and delivers due notifications
    pub refresh_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path =
            lookup("LENSCARE_DATABASE_PATH").unwrap_or_else(|| "lenscare.db".to_string());
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let reminder_lead_days = parse_var(&lookup, "REMINDER_LEAD_DAYS", 1)?;
        let reminder_hour = parse_var(&lookup, "REMINDER_HOUR", 10)?;
        let reminder_minute = parse_var(&lookup, "REMINDER_MINUTE", 0)?;
        let refresh_interval_secs = parse_var(&lookup, "REFRESH_INTERVAL_SECS", 60)?;

        if reminder_hour > 23 {
            return Err(anyhow!(
                "REMINDER_HOUR must be between 0 and 23, got {}",
                reminder_hour
            ));
        }
        if reminder_minute > 59 {
            return Err(anyhow!(
                "REMINDER_MINUTE must be between 0 and 59, got {}",
                reminder_minute
            ));
        }
        if refresh_interval_secs == 0 {
            return Err(anyhow!("REFRESH_INTERVAL_SECS must be greater than 0"));
        }

        Ok(Config {
            database_path,
            log_level,
            reminder_lead_days,
            reminder_hour,
            reminder_minute,
            refresh_interval_secs,
        })
    }

    pub fn reminder_settings(&self) -> ReminderSettings {
        ReminderSettings {
            lead_days: self.reminder_lead_days,
            hour: self.reminder_hour,
            minute: self.reminder_minute,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
