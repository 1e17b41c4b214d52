//! Wait time and promotion probability heuristics.

use serde::Serialize;

use boxoffice_core::config::WaitlistConfig;

/// Rough outlook for a queued user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaitEstimate {
    pub estimated_wait_hours: f64,
    /// Percentage in `0..=100`.
    pub promotion_probability: u8,
}

impl WaitEstimate {
    /// Estimate for a one-based queue position.
    pub fn for_position(position: u64, config: &WaitlistConfig) -> Self {
        let per_hour = if config.promotions_per_hour > 0.0 {
            config.promotions_per_hour
        } else {
            1.0
        };
        let estimated_wait_hours = (position as f64 / per_hour).max(config.min_wait_hours);

        let horizon = config.probability_horizon.max(1) as f64;
        let share = ((horizon - position as f64) / horizon).max(0.0);
        let promotion_probability = (share * 100.0).round().clamp(0.0, 100.0) as u8;

        Self {
            estimated_wait_hours,
            promotion_probability,
        }
    }
}
