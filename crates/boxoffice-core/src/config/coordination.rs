//! Coordination store configuration (locks and waitlist queues).

use serde::{Deserialize, Serialize};

/// Where per-key locks and waitlist sorted sets live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationConfig {
    /// `"redis"` for shared deployments, `"memory"` for a single process.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Prefix applied to every lock and queue key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "boxoffice:".to_string()
}
