//! Redis coordination store: `SET NX PX` locks and sorted-set queues.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use boxoffice_core::result::AppResult;
use boxoffice_core::traits::coordination::CoordinationStore;

use super::client::RedisClient;

/// Delete the lock only if it still holds the caller's token.
///
/// KEYS[1] = lock key
/// ARGV[1] = owner token
///
/// Returns 1 if deleted, 0 otherwise.
const RELEASE_SCRIPT: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('DEL', KEYS[1])
    end
    return 0
"#;

/// Coordination store for multi-node deployments.
#[derive(Debug, Clone)]
pub struct RedisCoordinationStore {
    client: RedisClient,
}

impl RedisCoordinationStore {
    /// Create a store over a connected client.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CoordinationStore for RedisCoordinationStore {
    async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        // SET key token PX ttl NX
        let result: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(token)
            .arg("PX")
            .arg(ttl.as_millis().max(1) as u64)
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))?;

        Ok(result.is_some())
    }

    async fn release(&self, key: &str, token: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let script = redis::Script::new(RELEASE_SCRIPT);

        let deleted: i64 = script
            .key(&full_key)
            .arg(token)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))?;

        if deleted == 0 {
            warn!(key, "Lock was not held by this owner at release");
        }
        Ok(deleted == 1)
    }

    async fn queue_add(&self, queue: &str, member: &str, score: f64) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(queue);
        let mut conn = self.client.conn_mut();
        let added: i64 = redis::cmd("ZADD")
            .arg(&full_key)
            .arg(score)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))?;
        Ok(added > 0)
    }

    async fn queue_replace(&self, queue: &str, members: &[(String, f64)]) -> AppResult<()> {
        let full_key = self.client.prefixed_key(queue);
        let mut conn = self.client.conn_mut();

        // MULTI/EXEC: DEL then one ZADD with every member
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("DEL").arg(&full_key).ignore();
        if !members.is_empty() {
            let zadd = pipe.cmd("ZADD").arg(&full_key);
            for (member, score) in members {
                zadd.arg(*score).arg(member);
            }
            zadd.ignore();
        }
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))?;

        debug!(queue, members = members.len(), "Replaced queue contents");
        Ok(())
    }

    async fn queue_rank_desc(&self, queue: &str, member: &str) -> AppResult<Option<u64>> {
        let full_key = self.client.prefixed_key(queue);
        let mut conn = self.client.conn_mut();
        redis::cmd("ZREVRANK")
            .arg(&full_key)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))
    }

    async fn queue_range_desc(
        &self,
        queue: &str,
        start: u64,
        stop: u64,
    ) -> AppResult<Vec<String>> {
        let full_key = self.client.prefixed_key(queue);
        let mut conn = self.client.conn_mut();
        redis::cmd("ZREVRANGE")
            .arg(&full_key)
            .arg(start)
            .arg(stop)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))
    }

    async fn queue_score(&self, queue: &str, member: &str) -> AppResult<Option<f64>> {
        let full_key = self.client.prefixed_key(queue);
        let mut conn = self.client.conn_mut();
        redis::cmd("ZSCORE")
            .arg(&full_key)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))
    }

    async fn queue_remove(&self, queue: &str, member: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(queue);
        let mut conn = self.client.conn_mut();
        let removed: i64 = redis::cmd("ZREM")
            .arg(&full_key)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))?;
        Ok(removed > 0)
    }

    async fn queue_len(&self, queue: &str) -> AppResult<u64> {
        let full_key = self.client.prefixed_key(queue);
        let mut conn = self.client.conn_mut();
        redis::cmd("ZCARD")
            .arg(&full_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))
    }

    async fn queue_pop_max(&self, queue: &str, count: u64) -> AppResult<Vec<(String, f64)>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let full_key = self.client.prefixed_key(queue);
        let mut conn = self.client.conn_mut();
        let popped: Vec<(String, f64)> = redis::cmd("ZPOPMAX")
            .arg(&full_key)
            .arg(count)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))?;
        debug!(queue, requested = count, popped = popped.len(), "Popped queue members");
        Ok(popped)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| self.client.map_err(e))?;
        Ok(pong == "PONG")
    }
}
