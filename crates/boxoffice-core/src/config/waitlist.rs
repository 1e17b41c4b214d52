//! Waitlist queue configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Largest tier score that still composes into an exact queue score.
pub const MAX_TIER_SCORE: i64 = 899;

/// Waitlist queue settings and heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistConfig {
    /// Minutes a promoted user has to complete a booking.
    #[serde(default = "default_booking_window")]
    pub booking_window_minutes: i32,
    /// Assumed promotion throughput used for wait estimates.
    #[serde(default = "default_promotions_per_hour")]
    pub promotions_per_hour: f64,
    /// Position beyond which promotion probability is zero.
    #[serde(default = "default_probability_horizon")]
    pub probability_horizon: u64,
    /// Floor for the estimated wait.
    #[serde(default = "default_min_wait_hours")]
    pub min_wait_hours: f64,
    /// Cron expression for the promotion expiry sweep.
    #[serde(default = "default_expiry_cron")]
    pub expiry_cron: String,
    /// Priority score per user tier.
    #[serde(default = "default_tier_scores")]
    pub tier_scores: HashMap<String, i64>,
    /// Score for tiers missing from `tier_scores`.
    #[serde(default = "default_fallback_score")]
    pub fallback_score: i64,
}

impl WaitlistConfig {
    /// Priority score for a tier name. Unknown tiers get the fallback.
    pub fn priority_for(&self, tier: &str) -> i64 {
        self.tier_scores
            .get(&tier.to_ascii_lowercase())
            .copied()
            .unwrap_or(self.fallback_score)
    }

    /// Reject tier scores outside `0..=MAX_TIER_SCORE`.
    pub fn validate(&self) -> Result<(), AppError> {
        let out_of_range = self
            .tier_scores
            .iter()
            .map(|(tier, score)| (tier.as_str(), *score))
            .chain(std::iter::once(("fallback", self.fallback_score)))
            .find(|(_, score)| !(0..=MAX_TIER_SCORE).contains(score));

        match out_of_range {
            Some((tier, score)) => Err(AppError::configuration(format!(
                "waitlist score for tier '{tier}' is {score}; must be within 0..={MAX_TIER_SCORE}"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            booking_window_minutes: default_booking_window(),
            promotions_per_hour: default_promotions_per_hour(),
            probability_horizon: default_probability_horizon(),
            min_wait_hours: default_min_wait_hours(),
            expiry_cron: default_expiry_cron(),
            tier_scores: default_tier_scores(),
            fallback_score: default_fallback_score(),
        }
    }
}

fn default_booking_window() -> i32 {
    10
}

fn default_promotions_per_hour() -> f64 {
    2.0
}

fn default_probability_horizon() -> u64 {
    50
}

fn default_min_wait_hours() -> f64 {
    0.5
}

fn default_expiry_cron() -> String {
    "0 * * * * *".to_string()
}

fn default_tier_scores() -> HashMap<String, i64> {
    [
        ("premium", 200),
        ("gold", 150),
        ("silver", 120),
        ("standard", 100),
        ("new", 80),
    ]
    .into_iter()
    .map(|(tier, score)| (tier.to_string(), score))
    .collect()
}

fn default_fallback_score() -> i64 {
    100
}
