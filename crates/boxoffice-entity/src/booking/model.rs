//! Booking entity model.

use boxoffice_core::types::{BookingId, EventId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::BookingStatus;

/// A purchase of one or more seats for an event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// Human-facing unique reference, e.g. `EVTLX2K9QABCD`.
    pub booking_reference: String,
    /// The purchasing user.
    pub user_id: UserId,
    /// The booked event.
    pub event_id: EventId,
    /// Number of seats.
    pub quantity: i32,
    /// Price times quantity, in cents.
    pub total_amount: i64,
    /// Booking status.
    pub status: BookingStatus,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a confirmed booking.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_reference: String,
    pub user_id: UserId,
    pub event_id: EventId,
    pub quantity: i32,
    pub total_amount: i64,
}

impl NewBooking {
    /// Materialize the row as it will be stored.
    pub fn into_booking(self, now: DateTime<Utc>) -> Booking {
        Booking {
            id: BookingId::new(),
            booking_reference: self.booking_reference,
            user_id: self.user_id,
            event_id: self.event_id,
            quantity: self.quantity,
            total_amount: self.total_amount,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }
}
