//! Per-row exclusive locks.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A lazily populated table of row mutexes.
///
/// The returned guard is the lock: holding it blocks every other
/// transaction that asks for the same key, the way `FOR UPDATE` does.
#[derive(Debug)]
pub(crate) struct RowLocks<K: Eq + Hash> {
    rows: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Copy> RowLocks<K> {
    pub(crate) fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Wait for and take the lock on `key`.
    pub(crate) async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let row = self
            .rows
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        row.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_second_locker_waits_for_release() {
        let locks = Arc::new(RowLocks::<u32>::new());
        let guard = locks.lock(7).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock(7).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire after release")
            .expect("task should not panic");
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = RowLocks::<u32>::new();
        let _a = locks.lock(1).await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock(2))
            .await
            .expect("independent rows must not contend");
    }
}
