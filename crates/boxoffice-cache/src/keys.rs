//! Key builders for cached views, locks, and queues.
//!
//! Keys are unprefixed; providers prepend their configured namespace.

use boxoffice_core::types::{BookingId, EventId, UserId};

/// Cached event view.
pub fn event_by_id(event_id: EventId) -> String {
    format!("event:{event_id}")
}

/// Cached listing of upcoming events.
pub fn upcoming_events() -> String {
    "events:upcoming".to_string()
}

/// Pattern covering every event listing.
pub fn event_listings_pattern() -> String {
    "events:*".to_string()
}

/// Purchase lock for one (user, event) pair.
pub fn booking_lock(user_id: UserId, event_id: EventId) -> String {
    format!("booking:lock:{user_id}:{event_id}")
}

/// Cancellation lock for one booking.
pub fn cancel_lock(booking_id: BookingId) -> String {
    format!("booking:cancel:{booking_id}")
}

/// Sorted-set waitlist for an event.
pub fn waitlist_queue(event_id: EventId) -> String {
    format!("waitlist:{event_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_lock_key_layout() {
        let user = UserId::from_uuid(Uuid::nil());
        let event = EventId::from_uuid(Uuid::nil());
        assert_eq!(
            booking_lock(user, event),
            "booking:lock:00000000-0000-0000-0000-000000000000:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_listing_pattern_matches_listing_keys() {
        let prefix = event_listings_pattern();
        let prefix = prefix.trim_end_matches('*');
        assert!(upcoming_events().starts_with(prefix));
        assert!(!event_by_id(EventId::new()).starts_with(prefix));
    }
}
