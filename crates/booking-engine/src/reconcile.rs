//! Edit sessions and reconciliation with the event repository.
//!
//! A [`ReconciliationController`] owns one session's view of a master's
//! calendar: the profile, the owner id resolved from the session identity,
//! the reference date and the event list last fetched from the repository.
//!
//! Session states:
//!
//! ```text
//! Idle ──begin──▶ Editing ──save──▶ Saving ──ok──▶ Idle
//!                   ▲                  │
//!                   └──────failure─────┘
//! ```
//!
//! After every successful write the controller discards its event list and
//! re-queries all of the owner's events. It never merges a write result into
//! the local list.

use std::future::Future;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::availability::{bookable_slots, Availability, AvailabilityCalculator, Slot};
use crate::config::EngineConfig;
use crate::error::{BookingError, Result};
use crate::event::EventRecord;
use crate::normalize::{validate, EventDraft};
use crate::repository::EventRepository;
use crate::schedule::{ScheduleProfile, WorkingWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Editing,
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Booking,
    NonWorkingDay,
}

/// One item of the rendered calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEntry {
    pub kind: EntryKind,
    /// Repository id for bookings; `None` for derived markers.
    pub id: Option<String>,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
}

pub struct ReconciliationController<R> {
    repo: R,
    owner_id: Option<String>,
    calculator: AvailabilityCalculator,
    reference: NaiveDate,
    config: EngineConfig,
    state: SessionState,
    draft: Option<EventDraft>,
    events: Vec<EventRecord>,
}

impl<R: EventRepository> ReconciliationController<R> {
    /// Create a session for `owner_id`'s calendar.
    ///
    /// `owner_id` is `None` when the session identity has not been resolved;
    /// reads and writes then fail with [`BookingError::MissingOwner`].
    pub fn new(
        repo: R,
        profile: ScheduleProfile,
        owner_id: Option<String>,
        reference: NaiveDate,
        config: EngineConfig,
    ) -> Self {
        Self {
            repo,
            owner_id,
            calculator: AvailabilityCalculator::new(profile),
            reference,
            config,
            state: SessionState::Idle,
            draft: None,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference
    }

    pub fn profile(&self) -> &ScheduleProfile {
        self.calculator.profile()
    }

    pub fn draft(&self) -> Option<&EventDraft> {
        self.draft.as_ref()
    }

    /// The working copy while `Editing`. The draft's setters apply the
    /// all-day and end-advance repairs.
    pub fn draft_mut(&mut self) -> Option<&mut EventDraft> {
        match self.state {
            SessionState::Editing => self.draft.as_mut(),
            _ => None,
        }
    }

    // ── Availability ────────────────────────────────────────────────────

    /// Availability for the reference month; recomputed only when the
    /// profile or the month changed.
    pub fn availability(&mut self) -> &Availability {
        self.calculator.for_date(self.reference)
    }

    /// Move the calendar to another date.
    pub fn navigate(&mut self, date: NaiveDate) {
        self.reference = date;
    }

    /// Swap in an edited profile (or another master's).
    pub fn set_profile(&mut self, profile: ScheduleProfile) {
        self.calculator.set_profile(profile);
    }

    /// Bookable slots on `date` at the configured granularity.
    pub fn slots(&self, date: NaiveDate) -> Vec<Slot> {
        bookable_slots(self.calculator.profile(), date, self.config.slot_minutes)
    }

    /// Persisted events and non-working markers for the reference month.
    ///
    /// A timed booking is split into one entry per covered day of the month,
    /// each clipped to that day's working window; pieces lying entirely
    /// outside the window are not displayed. All-day bookings and markers
    /// are exempt from the window.
    pub fn calendar_entries(&mut self) -> Vec<CalendarEntry> {
        let availability = self.calculator.for_date(self.reference).clone();
        let month_days = crate::availability::days_in_month(self.reference);
        let (Some(first), Some(last)) = (month_days.first(), month_days.last()) else {
            return Vec::new();
        };

        let mut entries: Vec<CalendarEntry> = self
            .events
            .iter()
            .filter(|e| e.start.date() <= *last && e.end.date() >= *first)
            .flat_map(|e| booking_entries(e, &availability.window, *first, *last))
            .collect();

        entries.extend(availability.non_working_days.iter().map(|m| CalendarEntry {
            kind: EntryKind::NonWorkingDay,
            id: None,
            title: m.title().to_string(),
            start: m.start,
            end: m.end,
            all_day: true,
        }));

        entries.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.end.cmp(&b.end)));
        entries
    }

    // ── Repository round-trips ──────────────────────────────────────────

    /// Replace the event list with a fresh query of all the owner's events.
    ///
    /// # Errors
    ///
    /// [`BookingError::MissingOwner`] without an owner id; repository errors
    /// and timeouts leave the previous list in place.
    pub async fn refresh(&mut self) -> Result<&[EventRecord]> {
        let owner_id = self.owner_id.as_deref().ok_or(BookingError::MissingOwner)?;
        let events = with_timeout(
            self.config.repository_timeout(),
            "query_by_owner",
            self.repo.query_by_owner(owner_id),
        )
        .await?;

        tracing::info!(owner_id, count = events.len(), "events refreshed");
        self.events = events;
        Ok(&self.events)
    }

    /// Open the form on a new event. Discards any unsaved draft.
    pub fn begin_new(&mut self, draft: EventDraft) -> Result<()> {
        self.ensure_not_saving("begin a new event")?;
        let draft = EventDraft {
            id: String::new(),
            ..draft
        };
        self.draft = Some(draft);
        self.state = SessionState::Editing;
        Ok(())
    }

    /// Open the form on a copy of the loaded event `id`.
    pub fn begin_edit(&mut self, id: &str) -> Result<()> {
        self.ensure_not_saving("edit an event")?;
        let record = self
            .events
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| BookingError::NotFound(format!("event '{id}'")))?;
        self.draft = Some(EventDraft::from_record(record));
        self.state = SessionState::Editing;
        Ok(())
    }

    /// Close the form without saving.
    pub fn cancel(&mut self) {
        if self.state == SessionState::Editing {
            self.draft = None;
            self.state = SessionState::Idle;
        }
    }

    /// Validate the draft, write it, then re-fetch the owner's events.
    ///
    /// Returns the id of the written event. On validation, owner, repository
    /// or timeout failure the session stays in `Editing` with the draft
    /// intact. Dropping the future before the write completes also returns
    /// the session to `Editing`. If the write succeeds but the refresh fails,
    /// the session is `Idle` and the refresh error is returned; the event
    /// list is stale until the next successful refresh.
    pub async fn save(&mut self) -> Result<String> {
        if self.state != SessionState::Editing {
            return Err(BookingError::InvalidTransition(format!(
                "cannot save while {:?}",
                self.state
            )));
        }
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| BookingError::InvalidTransition("no draft to save".to_string()))?;

        let record = validate(draft).inspect_err(|e| {
            tracing::warn!(error = %e, "save blocked by validation");
        })?;

        let Some(owner_id) = self.owner_id.clone() else {
            tracing::warn!(title = %record.title, "save aborted: owner id not resolved");
            return Err(BookingError::MissingOwner);
        };

        let saving = SavingGuard::enter(&mut self.state);
        let limit = self.config.repository_timeout();
        let written = if record.is_persisted() {
            with_timeout(limit, "update", self.repo.update(&record.id, &record, &owner_id))
                .await
                .map(|()| record.id.clone())
        } else {
            with_timeout(limit, "create", self.repo.create(&record, &owner_id)).await
        };
        saving.finish(if written.is_ok() {
            SessionState::Idle
        } else {
            SessionState::Editing
        });
        let id = written?;

        tracing::info!(event_id = %id, owner_id = %owner_id, "event saved");
        self.draft = None;
        self.refresh().await?;
        Ok(id)
    }

    /// Delete event `id`, then re-fetch the owner's events.
    ///
    /// Deleting the event currently open in the form closes the form.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.ensure_not_saving("delete an event")?;
        if self.owner_id.is_none() {
            tracing::warn!(event_id = %id, "delete aborted: owner id not resolved");
            return Err(BookingError::MissingOwner);
        }

        with_timeout(self.config.repository_timeout(), "delete", self.repo.delete(id)).await?;
        tracing::info!(event_id = %id, "event deleted");

        if self.draft.as_ref().is_some_and(|d| d.id == id) {
            self.cancel();
        }
        self.refresh().await?;
        Ok(())
    }

    fn ensure_not_saving(&self, action: &str) -> Result<()> {
        if self.state == SessionState::Saving {
            return Err(BookingError::InvalidTransition(format!(
                "cannot {action} while a save is in flight"
            )));
        }
        Ok(())
    }
}

/// Marks a session `Saving` until [`SavingGuard::finish`] settles the next
/// state. A guard dropped unfinished (the save future was abandoned) puts the
/// session back in `Editing`.
struct SavingGuard<'a> {
    state: &'a mut SessionState,
    finished: bool,
}

impl<'a> SavingGuard<'a> {
    fn enter(state: &'a mut SessionState) -> Self {
        *state = SessionState::Saving;
        Self {
            state,
            finished: false,
        }
    }

    fn finish(mut self, next: SessionState) {
        *self.state = next;
        self.finished = true;
    }
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("save abandoned before completion, form reopened");
            *self.state = SessionState::Editing;
        }
    }
}

/// Display pieces of a booking within the days `first..=last`.
///
/// All-day bookings are shown as stored. Timed bookings yield one piece per
/// covered day, clipped to `window`; empty pieces are dropped.
fn booking_entries(
    record: &EventRecord,
    window: &WorkingWindow,
    first: NaiveDate,
    last: NaiveDate,
) -> Vec<CalendarEntry> {
    let entry = |start, end| CalendarEntry {
        kind: EntryKind::Booking,
        id: Some(record.id.clone()),
        title: record.title.clone(),
        start,
        end,
        all_day: record.all_day,
    };

    if record.all_day {
        return vec![entry(record.start, record.end)];
    }

    let from = record.start.date().max(first);
    let to = record.end.date().min(last);
    from.iter_days()
        .take_while(|day| *day <= to)
        .filter_map(|day| {
            let start = record.start.max(day.and_time(window.min_time));
            let end = record.end.min(day.and_time(window.max_time));
            (start < end).then(|| entry(start, end))
        })
        .collect()
}

/// Run a repository call, bounded by `limit` when one is configured.
async fn with_timeout<T>(
    limit: Option<Duration>,
    op: &'static str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or_else(|_| Err(BookingError::Timeout(limit.as_millis() as u64))),
        None => call.await,
    };
    if let Err(e) = &result {
        tracing::error!(op, error = %e, "repository call failed");
    }
    result
}

// ── Tests ───────────────────────────────────────────────────────────────────
