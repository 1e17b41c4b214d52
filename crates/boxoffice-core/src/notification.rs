//! Outbound user notifications.
//!
//! Every alert the engine raises is one variant of [`Notification`]. The
//! service layer enqueues them after a commit, and the worker hands them to a
//! [`NotificationSender`](crate::traits::NotificationSender).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BookingId, EventId, PromotionId};

/// Delivery channel for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Live push to connected clients.
    Websocket,
    /// Email message.
    Email,
    /// Mobile push notification.
    Push,
    /// Text message.
    Sms,
}

impl Channel {
    /// Lowercase channel name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Websocket => "websocket",
            Self::Email => "email",
            Self::Push => "push",
            Self::Sms => "sms",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification raised by the booking or waitlist flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A booking was committed.
    BookingConfirmed {
        booking_id: BookingId,
        event_id: EventId,
        event_name: String,
        booking_reference: String,
        quantity: i32,
        total_amount: i64,
    },
    /// A confirmed booking was cancelled and its seats returned.
    BookingCancelled {
        booking_id: BookingId,
        event_id: EventId,
        event_name: String,
        booking_reference: String,
        refunded_amount: i64,
    },
    /// The user entered an event's waitlist.
    WaitlistJoined {
        event_id: EventId,
        event_name: String,
        position: u64,
        estimated_wait_hours: f64,
    },
    /// The user was promoted off the waitlist and may book until `expires_at`.
    WaitlistPromoted {
        promotion_id: PromotionId,
        event_id: EventId,
        event_name: String,
        expires_at: DateTime<Utc>,
        booking_window_minutes: i32,
    },
    /// A promotion lapsed without a booking.
    PromotionExpired {
        promotion_id: PromotionId,
        event_id: EventId,
    },
}

impl Notification {
    /// Stable kind string, matching the serde tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BookingConfirmed { .. } => "booking_confirmed",
            Self::BookingCancelled { .. } => "booking_cancelled",
            Self::WaitlistJoined { .. } => "waitlist_joined",
            Self::WaitlistPromoted { .. } => "waitlist_promoted",
            Self::PromotionExpired { .. } => "promotion_expired",
        }
    }

    /// Short headline for display.
    pub fn title(&self) -> String {
        match self {
            Self::BookingConfirmed { .. } => "Booking confirmed".to_string(),
            Self::BookingCancelled { .. } => "Booking cancelled".to_string(),
            Self::WaitlistJoined { .. } => "Joined waitlist".to_string(),
            Self::WaitlistPromoted { .. } => "Seats available".to_string(),
            Self::PromotionExpired { .. } => "Booking window expired".to_string(),
        }
    }

    /// Body text for display.
    pub fn message(&self) -> String {
        match self {
            Self::BookingConfirmed {
                event_name,
                booking_reference,
                quantity,
                ..
            } => format!(
                "Your booking {booking_reference} for {quantity} ticket(s) to {event_name} is confirmed"
            ),
            Self::BookingCancelled {
                event_name,
                booking_reference,
                refunded_amount,
                ..
            } => format!(
                "Booking {booking_reference} for {event_name} was cancelled; {} will be refunded",
                format_cents(*refunded_amount)
            ),
            Self::WaitlistJoined {
                event_name,
                position,
                estimated_wait_hours,
                ..
            } => format!(
                "You are #{position} on the waitlist for {event_name} (about {estimated_wait_hours:.1}h)"
            ),
            Self::WaitlistPromoted {
                event_name,
                booking_window_minutes,
                ..
            } => format!(
                "Seats opened up for {event_name}. Book within {booking_window_minutes} minutes"
            ),
            Self::PromotionExpired { .. } => {
                "Your booking window has closed without a purchase".to_string()
            }
        }
    }

    /// Channels this kind is delivered on when no override applies.
    ///
    /// Promotions are time-boxed, so they fan out wider than the rest.
    pub fn preferred_channels(&self) -> Option<&'static [Channel]> {
        match self {
            Self::WaitlistPromoted { .. } => {
                Some(&[Channel::Websocket, Channel::Email, Channel::Push])
            }
            Self::BookingConfirmed { .. } => Some(&[Channel::Websocket, Channel::Email]),
            _ => None,
        }
    }
}

fn format_cents(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_serde_tag() {
        let n = Notification::PromotionExpired {
            promotion_id: PromotionId::new(),
            event_id: EventId::new(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], n.kind());
    }

    #[test]
    fn test_cancel_message_formats_refund() {
        let n = Notification::BookingCancelled {
            booking_id: BookingId::new(),
            event_id: EventId::new(),
            event_name: "Gala".into(),
            booking_reference: "EVTABC".into(),
            refunded_amount: 12_005,
        };
        assert!(n.message().contains("120.05"));
    }

    #[test]
    fn test_channel_names() {
        let json = serde_json::to_string(&Channel::Websocket).unwrap();
        assert_eq!(json, "\"websocket\"");
        assert_eq!(Channel::Sms.to_string(), "sms");
    }
}
