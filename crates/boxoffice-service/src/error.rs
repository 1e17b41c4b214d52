//! Domain errors for the booking and waitlist flows.
//!
//! Each variant has a stable machine-readable code and a class. Callers
//! decide whether to retry from [`BookingError::is_retryable`]; nothing in
//! this crate retries on their behalf.

use thiserror::Error;

use boxoffice_core::error::AppError;
use boxoffice_core::types::{BookingId, EventId, UserId};

/// Broad category of a domain error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Lost a race for a lock or a version; safe to retry.
    Contention,
    /// The request is invalid in the current state.
    Business,
    /// Persisted state contradicts an invariant.
    Integrity,
    /// Infrastructure failure.
    Internal,
}

/// Rejection or failure of a booking or cancellation.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Another booking for this user and event is in progress")]
    LockBusy,

    #[error("Event {0} does not exist or is not open for booking")]
    EventNotFound(EventId),

    #[error("Event {0} has already taken place")]
    EventPast(EventId),

    #[error("User already holds a confirmed booking for this event")]
    DuplicateBooking,

    #[error("Event is sold out")]
    SoldOut,

    #[error("Only {available} seat(s) available, {requested} requested")]
    InsufficientSeats { available: i32, requested: i32 },

    #[error("Seat inventory changed concurrently")]
    VersionConflict,

    #[error("User {0} does not exist")]
    UserNotFound(UserId),

    #[error("Quantity must be between 1 and {max}, got {requested}")]
    InvalidQuantity { requested: i32, max: i32 },

    #[error("Booking {0} does not exist or is not confirmed")]
    NotFound(BookingId),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl BookingError {
    /// Stable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LockBusy => "LOCK_BUSY",
            Self::EventNotFound(_) => "EVENT_NOT_FOUND",
            Self::EventPast(_) => "EVENT_PAST",
            Self::DuplicateBooking => "DUPLICATE_BOOKING",
            Self::SoldOut => "SOLD_OUT",
            Self::InsufficientSeats { .. } => "INSUFFICIENT_SEATS",
            Self::VersionConflict => "VERSION_CONFLICT",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Integrity(_) => "INTEGRITY",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Category of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::LockBusy | Self::VersionConflict => ErrorClass::Contention,
            Self::Integrity(_) => ErrorClass::Integrity,
            Self::Internal(_) => ErrorClass::Internal,
            _ => ErrorClass::Business,
        }
    }

    /// Whether the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Contention
    }
}

/// Rejection or failure of a waitlist operation.
#[derive(Debug, Error)]
pub enum WaitlistError {
    #[error("Event {0} does not exist")]
    EventNotFound(EventId),

    #[error("User {0} does not exist")]
    UserNotFound(UserId),

    #[error("{available} seat(s) are still available; book directly")]
    SeatsAvailable { available: i32 },

    #[error("User is already on the waitlist for this event")]
    AlreadyOnWaitlist,

    #[error("User is not on the waitlist for this event")]
    NotOnWaitlist,

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl WaitlistError {
    /// Stable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EventNotFound(_) => "EVENT_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::SeatsAvailable { .. } => "SEATS_AVAILABLE",
            Self::AlreadyOnWaitlist => "ALREADY_ON_WAITLIST",
            Self::NotOnWaitlist => "NOT_ON_WAITLIST",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Category of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Internal(_) => ErrorClass::Internal,
            _ => ErrorClass::Business,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_contention_is_retryable() {
        assert!(BookingError::LockBusy.is_retryable());
        assert!(BookingError::VersionConflict.is_retryable());
        assert!(!BookingError::SoldOut.is_retryable());
        assert!(!BookingError::Integrity("x".into()).is_retryable());
        assert!(!BookingError::Internal(AppError::database("down")).is_retryable());
    }

    #[test]
    fn test_codes_are_stable() {
        let err = BookingError::InsufficientSeats {
            available: 2,
            requested: 3,
        };
        assert_eq!(err.code(), "INSUFFICIENT_SEATS");
        assert_eq!(err.class(), ErrorClass::Business);
        assert_eq!(err.to_string(), "Only 2 seat(s) available, 3 requested");
        assert_eq!(WaitlistError::AlreadyOnWaitlist.code(), "ALREADY_ON_WAITLIST");
    }
}
