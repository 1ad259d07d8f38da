//! Availability derived from a [`ScheduleProfile`].
//!
//! Given a profile and a reference date, compute the calendar's visible time
//! window and one non-working-day marker for every day of the reference month
//! whose weekday the master does not work. Nothing here fails: a profile with
//! absent or malformed hours degrades to the unrestricted 00:00–23:59 window.
//!
//! # Functions
//!
//! - [`compute_availability`]: window + markers for one month
//! - [`bookable_slots`]: fixed-length slots inside the window for one day
//! - [`AvailabilityCalculator`]: caches the result per profile and month

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;

use crate::event::{end_of_day, start_of_day};
use crate::schedule::{weekday_token, ScheduleProfile, WorkingWindow};

/// Display title carried by every non-working-day marker.
pub const NON_WORKING_TITLE: &str = "Non-working day";

/// A synthetic all-day entry for a day outside the master's working days.
///
/// Markers are derived on every recomputation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NonWorkingDayMarker {
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl NonWorkingDayMarker {
    fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            weekday: weekday_token(date.weekday()),
            start: start_of_day(date),
            end: end_of_day(date),
        }
    }

    pub fn title(&self) -> &'static str {
        NON_WORKING_TITLE
    }
}

/// Calendar month as `(year, month)`.
pub type MonthKey = (i32, u32);

/// The result of one availability computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    /// Visible vertical range for timed events.
    pub window: WorkingWindow,
    /// `false` when the profile's hours were absent or malformed and the
    /// window fell back to the full day.
    pub restricted: bool,
    pub year: i32,
    pub month: u32,
    /// One marker per non-working day, in date order.
    pub non_working_days: Vec<NonWorkingDayMarker>,
}

impl Availability {
    pub fn month_key(&self) -> MonthKey {
        (self.year, self.month)
    }

    pub fn is_non_working(&self, date: NaiveDate) -> bool {
        self.non_working_days.iter().any(|m| m.date == date)
    }
}

/// Every calendar day of the month containing `reference`, first to last.
pub fn days_in_month(reference: NaiveDate) -> Vec<NaiveDate> {
    let month = reference.month();
    let Some(first) = reference.with_day(1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect()
}

/// The profile's working window, or the unrestricted window when the hours
/// cannot be used. Returns whether the profile's hours were applied.
pub fn effective_window(profile: &ScheduleProfile) -> (WorkingWindow, bool) {
    match profile.working_window() {
        Ok(window) => (window, true),
        Err(e) => {
            tracing::warn!(error = %e, "working hours unusable, showing full day");
            (WorkingWindow::unrestricted(), false)
        }
    }
}

/// Compute the working window and non-working-day markers for the month that
/// contains `reference`.
///
/// # Examples
///
/// ```
/// use booking_engine::availability::compute_availability;
/// use booking_engine::schedule::ScheduleProfile;
/// use chrono::{NaiveDate, Weekday::*};
///
/// let profile = ScheduleProfile::new([Mon, Tue, Wed, Thu, Fri], "09:00", "18:00");
/// let april = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
/// let availability = compute_availability(&profile, april);
/// assert_eq!(availability.non_working_days.len(), 8);
/// ```
pub fn compute_availability(profile: &ScheduleProfile, reference: NaiveDate) -> Availability {
    let (window, restricted) = effective_window(profile);

    let non_working_days: Vec<NonWorkingDayMarker> = days_in_month(reference)
        .into_iter()
        .filter(|d| !profile.works_on(d.weekday()))
        .map(NonWorkingDayMarker::for_date)
        .collect();

    tracing::debug!(
        year = reference.year(),
        month = reference.month(),
        markers = non_working_days.len(),
        restricted,
        "availability computed"
    );

    Availability {
        window,
        restricted,
        year: reference.year(),
        month: reference.month(),
        non_working_days,
    }
}

// ── Bookable slots ──────────────────────────────────────────────────────────

/// A half-open `[start, end)` interval a client may book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Fixed-length slots inside the working window on `date`.
///
/// Returns nothing for a non-working day or a zero slot length. A trailing
/// slot that would run past the window end is dropped. Existing bookings are
/// not subtracted.
pub fn bookable_slots(profile: &ScheduleProfile, date: NaiveDate, slot_minutes: u32) -> Vec<Slot> {
    if slot_minutes == 0 || !profile.works_on(date.weekday()) {
        return Vec::new();
    }

    let (window, _) = effective_window(profile);
    let step = Duration::minutes(i64::from(slot_minutes));
    let close = date.and_time(window.max_time);

    let mut slots = Vec::new();
    let mut cursor = date.and_time(window.min_time);
    while cursor + step <= close {
        slots.push(Slot {
            start: cursor,
            end: cursor + step,
        });
        cursor += step;
    }
    slots
}

// ── Calculator ──────────────────────────────────────────────────────────────

/// Holds a profile and recomputes availability only when the profile or the
/// reference month changes.
#[derive(Debug, Clone)]
pub struct AvailabilityCalculator {
    profile: ScheduleProfile,
    cached: Option<Availability>,
}

impl AvailabilityCalculator {
    pub fn new(profile: ScheduleProfile) -> Self {
        Self {
            profile,
            cached: None,
        }
    }

    pub fn profile(&self) -> &ScheduleProfile {
        &self.profile
    }

    /// Replace the profile (edit, or a different master viewed).
    ///
    /// Invalidates the cache when the profile actually differs.
    pub fn set_profile(&mut self, profile: ScheduleProfile) {
        if profile != self.profile {
            self.profile = profile;
            self.cached = None;
        }
    }

    /// Availability for the month containing `reference`.
    pub fn for_date(&mut self, reference: NaiveDate) -> &Availability {
        let key = (reference.year(), reference.month());
        if self.cached.as_ref().map(Availability::month_key) != Some(key) {
            self.cached = None;
        }
        self.cached
            .get_or_insert_with(|| compute_availability(&self.profile, reference))
    }

    pub fn works_on(&self, day: Weekday) -> bool {
        self.profile.works_on(day)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
