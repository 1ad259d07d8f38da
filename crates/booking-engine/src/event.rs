//! Appointment records and their stored document shape.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Lifecycle marker written with every stored event.
///
/// The engine only ever writes `Active`; it does not branch on the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Active,
}

/// A booked appointment in the master's calendar.
///
/// `id` is empty until the record has been persisted. For timed events
/// `end > start`; for all-day events `start` is midnight and `end` is
/// 23:59:59.999 of their respective dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub owner_id: String,
}

impl EventRecord {
    /// A new, not yet persisted, timed event.
    pub fn new(title: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            start,
            end,
            all_day: false,
            owner_id: String::new(),
        }
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Whether the record covers any part of `date`.
    pub fn touches_date(&self, date: NaiveDate) -> bool {
        self.start.date() <= date && self.end.date() >= date
    }
}

/// 00:00:00.000 of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 of `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(last_milli)
}

// ── Stored document ─────────────────────────────────────────────────────────

/// The shape an event takes in the document store.
///
/// The store keys documents by id, so the id is not part of the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDocument {
    pub title: String,
    pub owner_id: String,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    #[serde(default, alias = "is_whole_day")]
    pub whole_day: bool,
    #[serde(default)]
    pub status: EventStatus,
}

impl EventDocument {
    /// Build the document written for `record` on behalf of `owner_id`.
    ///
    /// The status is always [`EventStatus::Active`] on write.
    pub fn from_record(record: &EventRecord, owner_id: &str) -> Self {
        Self {
            title: record.title.clone(),
            owner_id: owner_id.to_string(),
            start_datetime: record.start,
            end_datetime: record.end,
            whole_day: record.all_day,
            status: EventStatus::Active,
        }
    }

    pub fn into_record(self, id: impl Into<String>) -> EventRecord {
        EventRecord {
            id: id.into(),
            title: self.title,
            start: self.start_datetime,
            end: self.end_datetime,
            all_day: self.whole_day,
            owner_id: self.owner_id,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
