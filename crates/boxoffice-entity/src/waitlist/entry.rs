//! Waitlist entry model.

use boxoffice_core::types::{EventId, UserId, WaitlistEntryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// State of a waitlist entry.
///
/// `Active` moves to `Promoted` or `Cancelled`; `Promoted` moves to
/// `Expired` when the booking window lapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "waitlist_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WaitlistStatus {
    /// Waiting in the queue.
    Active,
    /// Popped from the queue and offered a booking window.
    Promoted,
    /// The booking window lapsed.
    Expired,
    /// The user left the queue.
    Cancelled,
}

impl WaitlistStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Promoted => "promoted",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's place in an event's waitlist. Unique per (event, user).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WaitlistEntry {
    pub id: WaitlistEntryId,
    pub event_id: EventId,
    pub user_id: UserId,
    /// Tier-derived priority; higher is served first.
    pub priority_score: i64,
    /// When the user (re)joined.
    pub joined_at: DateTime<Utc>,
    /// One-based position, refreshed from queue order.
    pub position: Option<i32>,
    pub status: WaitlistStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Whether the entry is still queued.
    pub fn is_active(&self) -> bool {
        self.status == WaitlistStatus::Active
    }
}
