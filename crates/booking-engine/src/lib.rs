//! # booking-engine
//!
//! Availability and booking reconciliation for a master's weekly calendar.
//!
//! A master publishes the weekdays they work and their daily working hours;
//! clients view that calendar and book appointments into it. The engine
//! derives what the calendar may show, validates and repairs edited
//! appointments, and keeps a session's event list consistent with the backing
//! store by re-fetching after every write. All times are wall-clock local.
//!
//! ## Modules
//!
//! - [`schedule`]: working days and `HH:mm` working hours of a master
//! - [`availability`]: visible time window, non-working-day markers, bookable slots
//! - [`event`]: appointment records and their stored document shape
//! - [`normalize`]: draft validation, all-day and end-time repair rules
//! - [`repository`]: storage traits the engine calls
//! - [`memory`]: in-process implementations of the storage traits
//! - [`profile`]: master registration, editing and phone search
//! - [`reconcile`]: edit sessions with full re-fetch after writes
//! - [`config`]: engine configuration
//! - [`error`]: Error types

pub mod availability;
pub mod config;
pub mod error;
pub mod event;
pub mod memory;
pub mod normalize;
pub mod profile;
pub mod reconcile;
pub mod repository;
pub mod schedule;

pub use availability::{
    bookable_slots, compute_availability, Availability, AvailabilityCalculator,
    NonWorkingDayMarker, Slot,
};
pub use config::EngineConfig;
pub use error::{BookingError, Result};
pub use event::{EventDocument, EventRecord, EventStatus};
pub use memory::{InMemoryEventStore, InMemoryProfileStore};
pub use normalize::{normalize, validate, EventDraft};
pub use profile::{find_masters, register_master, update_master, MasterProfile, ProfileDocument};
pub use reconcile::{CalendarEntry, EntryKind, ReconciliationController, SessionState};
pub use repository::{EventRepository, ProfileRepository};
pub use schedule::{ScheduleProfile, WorkingWindow};
