//! Per-key async mutual exclusion
//!
//! [`KeyedLocks`] hands out one async mutex per key so that work on different
//! accounts or sites proceeds in parallel while work on the same record is
//! serialized. Entries are dropped from the map once nobody holds or waits on
//! them.
use dashmap::DashMap;
use std::{hash::Hash, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct KeyedLocks<K: Eq + Hash + Clone> {
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &K) -> KeyedGuard<K> {
        // Clone the mutex out before awaiting so no shard lock is held across the await
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;

        KeyedGuard {
            key: key.clone(),
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }

    /// Lock every key, in sorted order so that two callers locking
    /// overlapping sets cannot deadlock
    pub async fn lock_all(&self, keys: &[K]) -> Vec<KeyedGuard<K>>
    where
        K: Ord,
    {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            guards.push(self.lock(key).await);
        }
        guards
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct KeyedGuard<K: Eq + Hash + Clone> {
    key: K,
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for KeyedGuard<K> {
    fn drop(&mut self) {
        // Release first; the guard holds one reference to the mutex
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_serializes_same_key() {
        let locks = Arc::new(KeyedLocks::<String>::new());
        let in_section = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let in_section = in_section.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(&"acc_1".to_string()).await;
                let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_section.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::<String>::new();
        let _a = locks.lock(&"a".to_string()).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(&"b".to_string())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_lock_all_dedups_and_releases() {
        let locks = KeyedLocks::<String>::new();
        let keys = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        {
            let guards = locks.lock_all(&keys).await;
            assert_eq!(guards.len(), 2);
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());
    }
}
