//! Runtime selection of cache and coordination providers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use boxoffice_core::config::cache::CacheConfig;
use boxoffice_core::config::coordination::CoordinationConfig;
use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::cache::CacheProvider;
use boxoffice_core::traits::coordination::CoordinationStore;

/// Cache manager that wraps the configured cache provider.
#[derive(Debug, Clone)]
pub struct CacheManager {
    inner: Arc<dyn CacheProvider>,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CacheProvider> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis cache provider");
                let client = crate::redis::RedisClient::connect(
                    &config.redis.url,
                    &config.redis.key_prefix,
                    boxoffice_core::error::ErrorKind::Cache,
                )
                .await?;
                Arc::new(crate::redis::RedisCacheProvider::new(
                    client,
                    config.default_ttl_seconds,
                ))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory cache provider");
                Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a cache manager from an existing provider.
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self { inner: provider }
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn set_default(&self, key: &str, value: &str) -> AppResult<()> {
        self.inner.set_default(key, value).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        self.inner.delete_pattern(pattern).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

/// Build the configured coordination store.
pub async fn connect_coordination(
    config: &CoordinationConfig,
) -> AppResult<Arc<dyn CoordinationStore>> {
    match config.provider.as_str() {
        #[cfg(feature = "redis-backend")]
        "redis" => {
            info!("Initializing Redis coordination store");
            let client = crate::redis::RedisClient::connect(
                &config.redis_url,
                &config.key_prefix,
                boxoffice_core::error::ErrorKind::Coordination,
            )
            .await?;
            Ok(Arc::new(crate::redis::RedisCoordinationStore::new(client)))
        }
        #[cfg(feature = "memory")]
        "memory" => {
            info!("Initializing in-memory coordination store (single node only)");
            Ok(Arc::new(crate::memory::MemoryCoordinationStore::new()))
        }
        other => Err(AppError::configuration(format!(
            "Unknown coordination provider: '{other}'. Supported: memory, redis"
        ))),
    }
}
