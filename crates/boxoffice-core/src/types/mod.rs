//! Shared value types used across BoxOffice crates.

pub mod id;

pub use id::{BookingId, EventId, NotificationId, PromotionId, UserId, WaitlistEntryId};
