//! Booking transaction configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Booking coordinator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Lifetime of the per-(user, event) purchase lock.
    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_seconds: u64,
    /// Upper bound on tickets in a single booking.
    #[serde(default = "default_max_tickets")]
    pub max_tickets_per_booking: i32,
    /// Leading characters of every booking reference.
    #[serde(default = "default_reference_prefix")]
    pub reference_prefix: String,
}

impl BookingConfig {
    /// Lock TTL as a [`Duration`].
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_seconds)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lock_ttl_seconds: default_lock_ttl(),
            max_tickets_per_booking: default_max_tickets(),
            reference_prefix: default_reference_prefix(),
        }
    }
}

fn default_lock_ttl() -> u64 {
    30
}

fn default_max_tickets() -> i32 {
    10
}

fn default_reference_prefix() -> String {
    "EVT".to_string()
}
