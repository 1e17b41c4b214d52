//! In-memory view cache using the moka crate.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use boxoffice_core::config::cache::MemoryCacheConfig;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::cache::CacheProvider;

/// In-memory cache provider using moka.
///
/// Entry lifetime is the cache-wide TTL from configuration; per-call TTLs
/// are accepted for interface parity and ignored.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    cache: Cache<String, String>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.time_to_live_seconds))
            .build();
        Self { cache }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> AppResult<()> {
        self.cache.insert(key.to_string(), value.to_string()).await;
        Ok(())
    }

    async fn set_default(&self, key: &str, value: &str) -> AppResult<()> {
        self.cache.insert(key.to_string(), value.to_string()).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        // Only trailing-`*` globs are used, so prefix matching suffices.
        let prefix = pattern.trim_end_matches('*');
        let doomed: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.to_string())
            .collect();

        let count = doomed.len() as u64;
        for key in doomed {
            self.cache.remove(&key).await;
        }

        debug!(pattern, count, "Deleted keys matching pattern");
        Ok(count)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&MemoryCacheConfig {
            max_capacity: 1000,
            time_to_live_seconds: 60,
        })
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let provider = make_provider();
        provider.set_default("event:1", "{}").await.unwrap();
        assert_eq!(provider.get("event:1").await.unwrap(), Some("{}".to_string()));
        provider.delete("event:1").await.unwrap();
        assert_eq!(provider.get("event:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_pattern_only_hits_prefix() {
        let provider = make_provider();
        provider.set_default("events:list", "[]").await.unwrap();
        provider.set_default("events:popular", "[]").await.unwrap();
        provider.set_default("event:42", "{}").await.unwrap();

        let removed = provider.delete_pattern("events:*").await.unwrap();
        assert_eq!(removed, 2);
        assert!(provider.get("event:42").await.unwrap().is_some());
    }
}
