//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod booking;
pub mod cache;
pub mod coordination;
pub mod database;
pub mod logging;
pub mod notification;
pub mod waitlist;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::booking::BookingConfig;
pub use self::cache::CacheConfig;
pub use self::coordination::CoordinationConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::notification::NotificationConfig;
pub use self::waitlist::WaitlistConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Read-through cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Lock and queue store settings.
    #[serde(default)]
    pub coordination: CoordinationConfig,
    /// Booking transaction settings.
    #[serde(default)]
    pub booking: BookingConfig,
    /// Waitlist queue settings.
    #[serde(default)]
    pub waitlist: WaitlistConfig,
    /// Outbound notification settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `BOXOFFICE__`
    /// (e.g. `BOXOFFICE__DATABASE__URL`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BOXOFFICE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        Self::from_sources(config)
    }

    /// Deserialize merged sources and check cross-field bounds.
    pub fn from_sources(config: config::Config) -> Result<Self, AppError> {
        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        app.waitlist.validate()?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[database]\nurl = \"postgres://localhost/boxoffice\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("minimal config should deserialize");

        assert_eq!(config.database.url, "postgres://localhost/boxoffice");
        assert_eq!(config.booking.lock_ttl_seconds, 30);
        assert_eq!(config.waitlist.booking_window_minutes, 10);
        assert_eq!(config.cache.provider, "memory");
        assert_eq!(config.coordination.provider, "memory");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[database]\nurl = \"postgres://db\"\n\n[booking]\nlock_ttl_seconds = 5\n\n[waitlist]\nbooking_window_minutes = 3\n",
                config::FileFormat::Toml,
            ))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("config should deserialize");

        assert_eq!(config.booking.lock_ttl_seconds, 5);
        assert_eq!(config.waitlist.booking_window_minutes, 3);
        assert_eq!(config.booking.max_tickets_per_booking, 10);
    }

    #[test]
    fn test_oversized_tier_score_is_rejected() {
        let sources = config::Config::builder()
            .add_source(config::File::from_str(
                "[database]\nurl = \"postgres://localhost/boxoffice\"\n\n\
                 [waitlist.tier_scores]\nplatinum = 1000\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let err = AppConfig::from_sources(sources).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
        assert!(err.message.contains("platinum"));
    }
}
