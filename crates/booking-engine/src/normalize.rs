//! Validation and normalization of user-edited events.
//!
//! The edit form works on an [`EventDraft`], whose fields may still be empty.
//! The setters apply the interactive repair rules as the user types;
//! [`validate`] turns a complete draft into a normalized [`EventRecord`] or
//! refuses it with [`BookingError::Validation`].
//!
//! Repair rules:
//!
//! - Switching `all_day` on forces `start` to 00:00:00.000 and `end` to
//!   23:59:59.999 of their dates. Prior times are discarded; switching it off
//!   again does not restore them.
//! - For timed events, an `end` at or before `start` is pushed to
//!   `start + 1h`. `start` is never moved.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::event::{end_of_day, start_of_day, EventRecord};

/// How far `end` is advanced past `start` when the two collide.
pub const AUTO_ADVANCE_MINUTES: i64 = 60;

/// Working copy of an event inside the edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Empty for a new event, otherwise the id of the record being edited.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
    #[serde(default)]
    pub all_day: bool,
}

impl EventDraft {
    /// A blank draft for a selected calendar slot.
    pub fn for_slot(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    /// A copy of an existing record, ready for editing.
    pub fn from_record(record: &EventRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            start: Some(record.start),
            end: Some(record.end),
            all_day: record.all_day,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Toggle the all-day flag. Turning it on overwrites both bounds.
    pub fn set_all_day(&mut self, all_day: bool) {
        self.all_day = all_day;
        if all_day {
            if let (Some(start), Some(end)) = (self.start, self.end) {
                let (start, end) = all_day_bounds(start, end);
                self.start = Some(start);
                self.end = Some(end);
            } else {
                self.start = self.start.map(|s| start_of_day(s.date()));
                self.end = self.end.map(|e| end_of_day(e.date()));
            }
        }
    }

    pub fn set_start(&mut self, start: NaiveDateTime) {
        self.start = Some(start);
        self.repair();
    }

    pub fn set_end(&mut self, end: NaiveDateTime) {
        self.end = Some(end);
        self.repair();
    }

    fn repair(&mut self) {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            let (start, end) = normalize_bounds(start, end, self.all_day);
            self.start = Some(start);
            self.end = Some(end);
        }
    }
}

/// Full-day bounds for an all-day event spanning `start`'s date to `end`'s.
///
/// An end date before the start date collapses onto the start date.
pub fn all_day_bounds(start: NaiveDateTime, end: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let first = start.date();
    let last = end.date().max(first);
    (start_of_day(first), end_of_day(last))
}

/// Apply the ordering rules to a pair of bounds.
pub fn normalize_bounds(
    start: NaiveDateTime,
    end: NaiveDateTime,
    all_day: bool,
) -> (NaiveDateTime, NaiveDateTime) {
    if all_day {
        all_day_bounds(start, end)
    } else if end <= start {
        (start, start + Duration::minutes(AUTO_ADVANCE_MINUTES))
    } else {
        (start, end)
    }
}

/// Normalize a record in place of its bounds. Idempotent.
pub fn normalize(mut record: EventRecord) -> EventRecord {
    let (start, end) = normalize_bounds(record.start, record.end, record.all_day);
    if (start, end) != (record.start, record.end) {
        tracing::debug!(
            title = %record.title,
            from_start = %record.start,
            from_end = %record.end,
            to_start = %start,
            to_end = %end,
            "event bounds normalized"
        );
    }
    record.start = start;
    record.end = end;
    record
}

/// Check a draft for completeness and produce the normalized record.
///
/// The returned record has no owner; the caller attaches it before writing.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] if the title is blank or either bound
/// is missing.
pub fn validate(draft: &EventDraft) -> Result<EventRecord> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(BookingError::Validation("title is required".to_string()));
    }
    let start = draft
        .start
        .ok_or_else(|| BookingError::Validation("start is required".to_string()))?;
    let end = draft
        .end
        .ok_or_else(|| BookingError::Validation("end is required".to_string()))?;

    let record = EventRecord {
        id: draft.id.clone(),
        title: title.to_string(),
        start,
        end,
        all_day: draft.all_day,
        owner_id: String::new(),
    };
    Ok(normalize(record))
}

// ── Tests ───────────────────────────────────────────────────────────────────
