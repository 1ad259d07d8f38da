//! Engine configuration.
//!
//! All fields have defaults matching the calendar's stock behaviour, so an
//! empty JSON object or an empty environment yields a working config.

use std::time::Duration;

use chrono::Weekday;
use serde::Deserialize;

use crate::error::{BookingError, Result};
use crate::schedule::{parse_weekday, ScheduleProfile};

/// Default bookable slot length, matching a 30-minute calendar step.
pub const DEFAULT_SLOT_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Granularity of [`bookable_slots`](crate::availability::bookable_slots).
    pub slot_minutes: u32,
    /// Upper bound on a single repository call. `None` waits indefinitely.
    pub repository_timeout_ms: Option<u64>,
    /// Working days offered to a newly registering master.
    pub default_working_days: Vec<String>,
    pub default_start_time: String,
    pub default_end_time: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_minutes: DEFAULT_SLOT_MINUTES,
            repository_timeout_ms: None,
            default_working_days: ["monday", "tuesday", "wednesday", "thursday", "friday"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            default_start_time: "09:00".to_string(),
            default_end_time: "18:00".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Config`] on malformed JSON or invalid values.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| BookingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default       |
    /// |---------------------------------|---------------|
    /// | `BOOKING_SLOT_MINUTES`          | `30`          |
    /// | `BOOKING_REPOSITORY_TIMEOUT_MS` | unset (none)  |
    /// | `BOOKING_DEFAULT_HOURS`         | `09:00-18:00` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("BOOKING_SLOT_MINUTES") {
            config.slot_minutes = raw.trim().parse().map_err(|_| {
                BookingError::Config(format!("BOOKING_SLOT_MINUTES must be a u32, got '{raw}'"))
            })?;
        }

        if let Some(raw) = lookup("BOOKING_REPOSITORY_TIMEOUT_MS") {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                BookingError::Config(format!(
                    "BOOKING_REPOSITORY_TIMEOUT_MS must be a u64, got '{raw}'"
                ))
            })?;
            config.repository_timeout_ms = Some(ms);
        }

        if let Some(raw) = lookup("BOOKING_DEFAULT_HOURS") {
            let (start, end) = raw.split_once('-').ok_or_else(|| {
                BookingError::Config(format!(
                    "BOOKING_DEFAULT_HOURS must be HH:mm-HH:mm, got '{raw}'"
                ))
            })?;
            config.default_start_time = start.trim().to_string();
            config.default_end_time = end.trim().to_string();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.slot_minutes == 0 || self.slot_minutes > 24 * 60 {
            return Err(BookingError::Config(format!(
                "slot_minutes must be between 1 and 1440, got {}",
                self.slot_minutes
            )));
        }
        if self.repository_timeout_ms == Some(0) {
            return Err(BookingError::Config(
                "repository_timeout_ms must be positive".to_string(),
            ));
        }
        self.default_schedule()
            .working_window()
            .map_err(|e| BookingError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn repository_timeout(&self) -> Option<Duration> {
        self.repository_timeout_ms.map(Duration::from_millis)
    }

    /// The schedule a new master starts with.
    ///
    /// Unknown weekday tokens in the config are skipped.
    pub fn default_schedule(&self) -> ScheduleProfile {
        let days: Vec<Weekday> = self
            .default_working_days
            .iter()
            .filter_map(|d| parse_weekday(d))
            .collect();
        ScheduleProfile::new(
            days,
            self.default_start_time.clone(),
            self.default_end_time.clone(),
        )
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.slot_minutes, 30);
        assert!(config.repository_timeout().is_none());
        let schedule = config.default_schedule();
        assert_eq!(schedule.sorted_working_days().len(), 5);
        assert!(!schedule.works_on(Weekday::Sat));
        assert_eq!(schedule.start_time.as_deref(), Some("09:00"));
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json_str(r#"{"slot_minutes": 15}"#).unwrap();
        assert_eq!(config.slot_minutes, 15);
        assert_eq!(config.default_end_time, "18:00");
    }

    #[test]
    fn test_from_json_rejects_zero_slot() {
        let err = EngineConfig::from_json_str(r#"{"slot_minutes": 0}"#).unwrap_err();
        assert!(matches!(err, BookingError::Config(_)));
    }

    #[test]
    fn test_from_env_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("BOOKING_SLOT_MINUTES", "45"),
            ("BOOKING_REPOSITORY_TIMEOUT_MS", "2500"),
            ("BOOKING_DEFAULT_HOURS", "10:00-16:30"),
        ]))
        .unwrap();
        assert_eq!(config.slot_minutes, 45);
        assert_eq!(config.repository_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.default_start_time, "10:00");
        assert_eq!(config.default_end_time, "16:30");
    }

    #[test]
    fn test_from_env_rejects_inverted_hours() {
        let err =
            EngineConfig::from_lookup(lookup_from(&[("BOOKING_DEFAULT_HOURS", "18:00-09:00")]))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"), "got: {err}");
    }

    #[test]
    fn test_from_env_rejects_garbage_number() {
        let err = EngineConfig::from_lookup(lookup_from(&[("BOOKING_SLOT_MINUTES", "half")]))
            .unwrap_err();
        assert!(matches!(err, BookingError::Config(_)));
    }
}
