//! Coordination store: expiring locks and sorted-set queues.
//!
//! Keys passed in here are unprefixed; implementations apply their own
//! namespace.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Shared store for short-lived locks and score-ordered queues.
///
/// All queue reads are by descending score: the member with the highest
/// score has rank 0.
#[async_trait]
pub trait CoordinationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Atomically set `key` to `token` with expiry `ttl` if the key is absent.
    ///
    /// Returns `false` if another holder owns the key.
    async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool>;

    /// Delete `key` only if it still holds `token`.
    ///
    /// Returns `false` if the lock expired or belongs to someone else.
    async fn release(&self, key: &str, token: &str) -> AppResult<bool>;

    /// Insert or rescore a queue member. Returns `true` if the member is new.
    async fn queue_add(&self, queue: &str, member: &str, score: f64) -> AppResult<bool>;

    /// Atomically replace the whole queue with `members`.
    ///
    /// Readers see either the old contents or the new ones, never a mix.
    async fn queue_replace(&self, queue: &str, members: &[(String, f64)]) -> AppResult<()>;

    /// Zero-based descending rank of `member`, if present.
    async fn queue_rank_desc(&self, queue: &str, member: &str) -> AppResult<Option<u64>>;

    /// Members between descending ranks `start` and `stop`, inclusive.
    async fn queue_range_desc(&self, queue: &str, start: u64, stop: u64)
    -> AppResult<Vec<String>>;

    /// Score of `member`, if present.
    async fn queue_score(&self, queue: &str, member: &str) -> AppResult<Option<f64>>;

    /// Remove `member`. Returns `true` if it was present.
    async fn queue_remove(&self, queue: &str, member: &str) -> AppResult<bool>;

    /// Number of members in the queue.
    async fn queue_len(&self, queue: &str) -> AppResult<u64>;

    /// Atomically remove and return up to `count` highest-scored members,
    /// highest first.
    async fn queue_pop_max(&self, queue: &str, count: u64) -> AppResult<Vec<(String, f64)>>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
