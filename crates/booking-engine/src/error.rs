//! Error types for booking-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// A required event or profile field is missing or blank. Blocks the save.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A write was attempted without a resolved owner identity.
    #[error("Missing owner: cannot save without a resolved owner id")]
    MissingOwner,

    /// Any failure reported by the backing store.
    #[error("Repository error: {0}")]
    Repository(String),

    /// Malformed `HH:mm` working hours.
    #[error("Invalid working hours: {0}")]
    ProfileParse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The edit session was asked to do something its current state forbids.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Repository call timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BookingError>;
