//! In-process coordination store.
//!
//! Locks expire on the tokio clock, so tests can pause and advance time.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use boxoffice_core::result::AppResult;
use boxoffice_core::traits::coordination::CoordinationStore;

#[derive(Debug)]
struct Lease {
    token: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct InnerState {
    locks: HashMap<String, Lease>,
    /// Members kept sorted by descending score, ties by descending member
    /// (matching `ZREVRANGE`).
    queues: HashMap<String, Vec<(String, f64)>>,
}

impl InnerState {
    fn live_lease(&mut self, key: &str, now: Instant) -> Option<&Lease> {
        if self.locks.get(key).is_some_and(|l| l.expires_at <= now) {
            self.locks.remove(key);
        }
        self.locks.get(key)
    }
}

fn desc(a: &(String, f64), b: &(String, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0))
}

/// Coordination store backed by a tokio mutex.
///
/// Suitable for single-node deployments only.
#[derive(Debug, Clone, Default)]
pub struct MemoryCoordinationStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryCoordinationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CoordinationStore for MemoryCoordinationStore {
    async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if state.live_lease(key, now).is_some() {
            return Ok(false);
        }
        state.locks.insert(
            key.to_string(),
            Lease {
                token: token.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn release(&self, key: &str, token: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let owned = state
            .live_lease(key, Instant::now())
            .is_some_and(|l| l.token == token);
        if owned {
            state.locks.remove(key);
        }
        Ok(owned)
    }

    async fn queue_add(&self, queue: &str, member: &str, score: f64) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let members = state.queues.entry(queue.to_string()).or_default();
        let before = members.len();
        members.retain(|(m, _)| m != member);
        let added = members.len() == before;
        members.push((member.to_string(), score));
        members.sort_by(desc);
        Ok(added)
    }

    async fn queue_replace(&self, queue: &str, members: &[(String, f64)]) -> AppResult<()> {
        let mut replacement: Vec<(String, f64)> = Vec::with_capacity(members.len());
        for (member, score) in members {
            replacement.retain(|(m, _)| m != member);
            replacement.push((member.clone(), *score));
        }
        replacement.sort_by(desc);

        let mut state = self.state.lock().await;
        if replacement.is_empty() {
            state.queues.remove(queue);
        } else {
            state.queues.insert(queue.to_string(), replacement);
        }
        Ok(())
    }

    async fn queue_rank_desc(&self, queue: &str, member: &str) -> AppResult<Option<u64>> {
        let state = self.state.lock().await;
        Ok(state
            .queues
            .get(queue)
            .and_then(|members| members.iter().position(|(m, _)| m == member))
            .map(|rank| rank as u64))
    }

    async fn queue_range_desc(
        &self,
        queue: &str,
        start: u64,
        stop: u64,
    ) -> AppResult<Vec<String>> {
        if start > stop {
            return Ok(Vec::new());
        }
        let state = self.state.lock().await;
        let Some(members) = state.queues.get(queue) else {
            return Ok(Vec::new());
        };
        Ok(members
            .iter()
            .skip(start as usize)
            .take((stop - start) as usize + 1)
            .map(|(m, _)| m.clone())
            .collect())
    }

    async fn queue_score(&self, queue: &str, member: &str) -> AppResult<Option<f64>> {
        let state = self.state.lock().await;
        Ok(state
            .queues
            .get(queue)
            .and_then(|members| members.iter().find(|(m, _)| m == member))
            .map(|(_, score)| *score))
    }

    async fn queue_remove(&self, queue: &str, member: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(members) = state.queues.get_mut(queue) else {
            return Ok(false);
        };
        let before = members.len();
        members.retain(|(m, _)| m != member);
        Ok(members.len() < before)
    }

    async fn queue_len(&self, queue: &str) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state.queues.get(queue).map_or(0, |m| m.len() as u64))
    }

    async fn queue_pop_max(&self, queue: &str, count: u64) -> AppResult<Vec<(String, f64)>> {
        let mut state = self.state.lock().await;
        let Some(members) = state.queues.get_mut(queue) else {
            return Ok(Vec::new());
        };
        let take = (count as usize).min(members.len());
        Ok(members.drain(..take).collect())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_is_exclusive_until_released() {
        let store = MemoryCoordinationStore::new();
        let ttl = Duration::from_secs(30);
        assert!(store.acquire("lock:a", "t1", ttl).await.unwrap());
        assert!(!store.acquire("lock:a", "t2", ttl).await.unwrap());

        // wrong owner cannot release
        assert!(!store.release("lock:a", "t2").await.unwrap());
        assert!(store.release("lock:a", "t1").await.unwrap());
        assert!(store.acquire("lock:a", "t2", ttl).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_expires_after_ttl() {
        let store = MemoryCoordinationStore::new();
        assert!(
            store
                .acquire("lock:b", "t1", Duration::from_secs(30))
                .await
                .unwrap()
        );
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(
            store
                .acquire("lock:b", "t2", Duration::from_secs(30))
                .await
                .unwrap()
        );
        // the expired owner must not delete the new holder's lock
        assert!(!store.release("lock:b", "t1").await.unwrap());
    }

    #[tokio::test]
    async fn test_queue_reads_descending() {
        let store = MemoryCoordinationStore::new();
        assert!(store.queue_add("q", "low", 1.0).await.unwrap());
        store.queue_add("q", "high", 3.0).await.unwrap();
        store.queue_add("q", "mid", 2.0).await.unwrap();

        assert_eq!(
            store.queue_range_desc("q", 0, 10).await.unwrap(),
            vec!["high", "mid", "low"]
        );
        assert_eq!(store.queue_rank_desc("q", "low").await.unwrap(), Some(2));
        assert_eq!(store.queue_rank_desc("q", "none").await.unwrap(), None);

        // rescoring moves the member instead of duplicating it
        assert!(!store.queue_add("q", "low", 4.0).await.unwrap());
        assert_eq!(store.queue_len("q").await.unwrap(), 3);
        assert_eq!(store.queue_rank_desc("q", "low").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_pop_max_is_bounded() {
        let store = MemoryCoordinationStore::new();
        store.queue_add("q", "a", 1.0).await.unwrap();
        store.queue_add("q", "b", 2.0).await.unwrap();

        let popped = store.queue_pop_max("q", 5).await.unwrap();
        assert_eq!(popped, vec![("b".to_string(), 2.0), ("a".to_string(), 1.0)]);
        assert!(store.queue_pop_max("q", 1).await.unwrap().is_empty());
        assert!(!store.queue_remove("q", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_queue() {
        let store = MemoryCoordinationStore::new();
        store.queue_add("q", "stale", 9.0).await.unwrap();
        store.queue_add("q", "kept", 1.0).await.unwrap();

        let members = vec![("kept".to_string(), 5.0), ("fresh".to_string(), 7.0)];
        store.queue_replace("q", &members).await.unwrap();
        assert_eq!(
            store.queue_range_desc("q", 0, 10).await.unwrap(),
            vec!["fresh", "kept"]
        );
        assert_eq!(store.queue_score("q", "stale").await.unwrap(), None);

        store.queue_replace("q", &[]).await.unwrap();
        assert_eq!(store.queue_len("q").await.unwrap(), 0);
    }
}
