//! Composite queue score.
//!
//! The queue is read in descending score order. Priority dominates, and
//! within one priority an earlier join sorts higher:
//!
//! `score = priority * 10^13 + (10^13 - joined_at_ms)`
//!
//! Millisecond timestamps stay below 10^13 until the year 2286, and the
//! score stays below 2^53 for priorities up to 899, so it is exact as an
//! IEEE double.

use chrono::{DateTime, Utc};

use boxoffice_core::config::waitlist::MAX_TIER_SCORE;

const TIME_SPAN: i64 = 10_000_000_000_000;

/// Score of a waitlist member in the sorted-set projection.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct QueueScore(f64);

impl QueueScore {
    /// Compose a score from a tier priority and the join instant.
    ///
    /// Priority is clamped to `0..=MAX_TIER_SCORE`.
    pub fn compose(priority: i64, joined_at: DateTime<Utc>) -> Self {
        let priority = priority.clamp(0, MAX_TIER_SCORE);
        let millis = joined_at.timestamp_millis().clamp(0, TIME_SPAN - 1);
        let raw = priority * TIME_SPAN + (TIME_SPAN - millis);
        Self(raw as f64)
    }

    /// Wrap a score read back from the store.
    pub fn from_raw(score: f64) -> Self {
        Self(score)
    }

    /// Raw value for the store.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Priority component.
    pub fn priority(self) -> i64 {
        let raw = self.0 as i64;
        (raw - 1) / TIME_SPAN
    }
}
