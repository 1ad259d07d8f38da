//! A master's weekly working schedule.
//!
//! The profile is the input to every availability computation: which weekdays
//! the master works, and the daily `HH:mm` bounds of the working window.
//! Times are wall-clock local; there is no timezone handling anywhere in the
//! engine.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// Weekdays in canonical display order (Monday = 0 … Sunday = 6).
pub const CANONICAL_WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Parse a weekday token: `"monday"`, `"Mon"`, `"MONDAY"`.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// The lowercase token stored in profile documents.
pub fn weekday_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Parse a 24-hour `"HH:mm"` string.
///
/// # Errors
///
/// Returns [`BookingError::ProfileParse`] for anything that is not a valid
/// hour/minute pair.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let padded = bytes.len() == 5
        && bytes[2] == b':'
        && bytes.iter().enumerate().all(|(i, b)| i == 2 || b.is_ascii_digit());
    if !padded {
        return Err(BookingError::ProfileParse(format!("'{s}': expected HH:mm")));
    }

    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| BookingError::ProfileParse(format!("'{s}': {e}")))
}

/// Format a time of day as `"HH:mm"`.
pub fn format_hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

// ── WorkingWindow ───────────────────────────────────────────────────────────

/// The visible vertical range of the calendar: `[min_time, max_time]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkingWindow {
    #[serde(serialize_with = "serialize_hhmm")]
    pub min_time: NaiveTime,
    #[serde(serialize_with = "serialize_hhmm")]
    pub max_time: NaiveTime,
}

impl WorkingWindow {
    /// The "no restriction" window, 00:00–23:59.
    pub fn unrestricted() -> Self {
        Self {
            min_time: NaiveTime::MIN,
            max_time: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Whether `t` falls inside the window (both ends inclusive).
    pub fn contains(&self, t: NaiveTime) -> bool {
        t >= self.min_time && t <= self.max_time
    }
}

fn serialize_hhmm<S: serde::Serializer>(
    t: &NaiveTime,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format_hhmm(*t))
}

// ── ScheduleProfile ─────────────────────────────────────────────────────────

/// Working days plus the daily working hours of one master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleProfile {
    /// Days the master works, in input order, without duplicates.
    #[serde(with = "weekday_tokens", default)]
    pub working_days: Vec<Weekday>,
    /// Start of the working window as `"HH:mm"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// End of the working window as `"HH:mm"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl ScheduleProfile {
    pub fn new(
        working_days: impl IntoIterator<Item = Weekday>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            working_days: dedup_days(working_days),
            start_time: Some(start_time.into()),
            end_time: Some(end_time.into()),
        }
    }

    /// Build a profile from lowercase weekday tokens as stored on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::ProfileParse`] if a token is not a weekday name.
    pub fn from_tokens<S: AsRef<str>>(
        tokens: &[S],
        start_time: Option<String>,
        end_time: Option<String>,
    ) -> Result<Self> {
        let days = tokens
            .iter()
            .map(|t| {
                parse_weekday(t.as_ref()).ok_or_else(|| {
                    BookingError::ProfileParse(format!("unknown weekday '{}'", t.as_ref()))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            working_days: dedup_days(days),
            start_time,
            end_time,
        })
    }

    pub fn works_on(&self, day: Weekday) -> bool {
        self.working_days.contains(&day)
    }

    /// Working days in canonical order, Monday first.
    pub fn sorted_working_days(&self) -> Vec<Weekday> {
        CANONICAL_WEEK
            .iter()
            .copied()
            .filter(|d| self.works_on(*d))
            .collect()
    }

    /// Working days as lowercase tokens in canonical order.
    pub fn working_day_tokens(&self) -> Vec<String> {
        self.sorted_working_days()
            .into_iter()
            .map(|d| weekday_token(d).to_string())
            .collect()
    }

    /// The strictly parsed working window.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::ProfileParse`] if either bound is absent or
    /// malformed, or if `start_time >= end_time` (cross-midnight schedules are
    /// not supported).
    pub fn working_window(&self) -> Result<WorkingWindow> {
        let start = self
            .start_time
            .as_deref()
            .ok_or_else(|| BookingError::ProfileParse("start time is not set".to_string()))?;
        let end = self
            .end_time
            .as_deref()
            .ok_or_else(|| BookingError::ProfileParse("end time is not set".to_string()))?;

        let min_time = parse_hhmm(start)?;
        let max_time = parse_hhmm(end)?;
        if min_time >= max_time {
            return Err(BookingError::ProfileParse(format!(
                "start time {start} must be before end time {end}"
            )));
        }

        Ok(WorkingWindow { min_time, max_time })
    }
}

fn dedup_days(days: impl IntoIterator<Item = Weekday>) -> Vec<Weekday> {
    let mut out: Vec<Weekday> = Vec::with_capacity(7);
    for day in days {
        if !out.contains(&day) {
            out.push(day);
        }
    }
    out
}

/// Serde adapter: `Vec<Weekday>` ⇄ `["monday", "friday"]`.
mod weekday_tokens {
    use chrono::Weekday;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::{dedup_days, parse_weekday, weekday_token};

    pub fn serialize<S: Serializer>(days: &[Weekday], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(days.iter().map(|d| weekday_token(*d)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Weekday>, D::Error> {
        let tokens = Vec::<String>::deserialize(d)?;
        let days = tokens
            .iter()
            .map(|t| {
                parse_weekday(t)
                    .ok_or_else(|| D::Error::custom(format!("unknown weekday '{t}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dedup_days(days))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
