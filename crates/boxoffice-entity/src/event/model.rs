//! Event entity model.

use boxoffice_core::types::EventId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::EventStatus;

/// A ticketed event with a fixed seat capacity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Venue name.
    pub venue: String,
    /// Free-form description.
    pub description: Option<String>,
    /// When the event takes place.
    pub event_date: DateTime<Utc>,
    /// Price per seat in cents.
    pub price: i64,
    /// Seats the venue holds. Never changes.
    pub total_capacity: i32,
    /// Seats still for sale.
    pub available_seats: i32,
    /// Optimistic concurrency counter, bumped on every seat write.
    pub version: i32,
    /// Lifecycle status.
    pub status: EventStatus,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
    /// When the event was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event accepts bookings at `now`.
    pub fn is_bookable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == EventStatus::Active && self.event_date > now
    }

    /// Whether every seat has been sold.
    pub fn is_sold_out(&self) -> bool {
        self.available_seats == 0
    }

    /// Seats currently held by confirmed bookings.
    pub fn seats_sold(&self) -> i32 {
        self.total_capacity - self.available_seats
    }
}

/// Data required to create a new event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvent {
    /// Display name.
    pub name: String,
    /// Venue name.
    pub venue: String,
    /// Free-form description.
    pub description: Option<String>,
    /// When the event takes place.
    pub event_date: DateTime<Utc>,
    /// Price per seat in cents.
    pub price: i64,
    /// Seats the venue holds.
    pub total_capacity: i32,
}

impl CreateEvent {
    /// Build the initial row: every seat available, version 1.
    pub fn into_event(self, now: DateTime<Utc>) -> Event {
        Event {
            id: EventId::new(),
            name: self.name,
            venue: self.venue,
            description: self.description,
            event_date: self.event_date,
            price: self.price,
            total_capacity: self.total_capacity,
            available_seats: self.total_capacity,
            version: 1,
            status: EventStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(now: DateTime<Utc>) -> Event {
        CreateEvent {
            name: "Recital".into(),
            venue: "Hall A".into(),
            description: None,
            event_date: now + Duration::days(7),
            price: 5_000,
            total_capacity: 100,
        }
        .into_event(now)
    }

    #[test]
    fn test_new_event_is_fully_available() {
        let event = sample(Utc::now());
        assert_eq!(event.available_seats, 100);
        assert_eq!(event.version, 1);
        assert_eq!(event.seats_sold(), 0);
        assert!(!event.is_sold_out());
    }

    #[test]
    fn test_bookable_window() {
        let now = Utc::now();
        let mut event = sample(now);
        assert!(event.is_bookable_at(now));
        assert!(!event.is_bookable_at(now + Duration::days(8)));
        event.status = EventStatus::Cancelled;
        assert!(!event.is_bookable_at(now));
    }
}
