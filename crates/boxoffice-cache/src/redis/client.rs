//! Redis connection management.

use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::result::AppResult;

/// Redis client wrapper with connection management.
///
/// The same wrapper serves the view cache and the coordination store; each
/// gets its own key prefix and reports failures under its own
/// [`ErrorKind`].
#[derive(Debug, Clone)]
pub struct RedisClient {
    /// Redis connection manager (multiplexed, reconnecting).
    conn: ConnectionManager,
    /// Key prefix for all keys.
    key_prefix: String,
    /// Kind attached to every error raised through this client.
    error_kind: ErrorKind,
}

impl RedisClient {
    /// Connect to `url`, namespacing keys under `key_prefix`.
    pub async fn connect(url: &str, key_prefix: &str, error_kind: ErrorKind) -> AppResult<Self> {
        info!(url = %redact_url(url), prefix = key_prefix, "Connecting to Redis");

        let client = Client::open(url).map_err(|e| {
            AppError::with_source(error_kind, "Failed to create Redis client", e)
        })?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::with_source(error_kind, "Failed to connect to Redis", e))?;

        Ok(Self {
            conn,
            key_prefix: key_prefix.to_string(),
            error_kind,
        })
    }

    /// Get a clone of the connection manager for one command.
    pub fn conn_mut(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Build a full key with the configured prefix.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    /// Wrap a Redis error with this client's error kind.
    pub fn map_err(&self, e: redis::RedisError) -> AppError {
        AppError::with_source(self.error_kind, format!("Redis error: {e}"), e)
    }
}

/// Hide the password in a Redis URL for logging.
fn redact_url(url: &str) -> String {
    match (url.split_once("://"), url.rsplit_once('@')) {
        (Some((scheme, _)), Some((_, host))) => format!("{scheme}://****@{host}"),
        _ => url.to_string(),
    }
}
