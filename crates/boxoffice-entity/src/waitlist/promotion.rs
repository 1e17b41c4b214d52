//! Waitlist promotion model.

use boxoffice_core::types::{EventId, PromotionId, UserId, WaitlistEntryId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Outcome of a promotion's booking window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "promotion_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PromotionStatus {
    /// Window open, no booking yet.
    Pending,
    /// The user booked inside the window.
    Accepted,
    /// The window lapsed.
    Expired,
    /// The user turned the offer down.
    Declined,
}

impl PromotionStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
            Self::Declined => "declined",
        }
    }
}

impl fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A time-boxed booking window granted to a waitlisted user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WaitlistPromotion {
    pub id: PromotionId,
    /// The entry this promotion was created from.
    pub waitlist_id: WaitlistEntryId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub promoted_at: DateTime<Utc>,
    /// `promoted_at` plus the booking window.
    pub expires_at: DateTime<Utc>,
    pub booking_window_minutes: i32,
    pub status: PromotionStatus,
}

impl WaitlistPromotion {
    /// Open a pending promotion for `entry_id` starting at `now`.
    pub fn open(
        entry_id: WaitlistEntryId,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
        window_minutes: i32,
    ) -> Self {
        Self {
            id: PromotionId::new(),
            waitlist_id: entry_id,
            event_id,
            user_id,
            promoted_at: now,
            expires_at: now + Duration::minutes(i64::from(window_minutes)),
            booking_window_minutes: window_minutes,
            status: PromotionStatus::Pending,
        }
    }

    /// Whether the window is still open at `now`.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == PromotionStatus::Pending && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_boundaries() {
        let now = Utc::now();
        let promo = WaitlistPromotion::open(
            WaitlistEntryId::new(),
            EventId::new(),
            UserId::new(),
            now,
            10,
        );
        assert_eq!(promo.expires_at - promo.promoted_at, Duration::minutes(10));
        assert!(promo.is_open_at(now + Duration::minutes(9)));
        assert!(!promo.is_open_at(now + Duration::minutes(10)));
    }
}
