//! Per-household index cache.
//!
//! Holds one built index per user key so request handling does not rebuild
//! on every query. Construct one per process at the composition root and
//! share it as `Arc<IndexCache<_>>`.
//!
//! ## Thread Safety
//!
//! One `std::sync::Mutex` around the map. Each call locks once for the map
//! operation only; building an index (and every embedding call that
//! involves) happens outside the lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use resolver_index::PersonalizedEntityIndex;
use resolver_types::IndexCacheSettings;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

struct CachedIndex<I> {
    index: Arc<I>,
    built_at: Instant,
}

#[derive(Default)]
struct Counters {
    hits: u64,
    misses: u64,
    forced_rebuilds: u64,
    builds: u64,
    updates: u64,
    invalidations: u64,
    expirations: u64,
}

struct Inner<I> {
    entries: HashMap<String, CachedIndex<I>>,
    counters: Counters,
}

/// Index cache statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexCacheStats {
    pub cached_indexes: usize,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
    pub forced_rebuilds: u64,
    /// First build for a user key
    pub builds: u64,
    /// Replacement of an existing index
    pub updates: u64,
    pub invalidations: u64,
    pub expirations: u64,
}

/// TTL cache of one built index per household/user key.
pub struct IndexCache<I = PersonalizedEntityIndex> {
    inner: Mutex<Inner<I>>,
    ttl: Duration,
}

impl<I> IndexCache<I> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                counters: Counters::default(),
            }),
            ttl,
        }
    }

    pub fn from_settings(settings: &IndexCacheSettings) -> Self {
        Self::new(Duration::from_secs(settings.ttl_secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, Inner<I>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, built_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(built_at) > self.ttl
    }

    /// Cached index for `user_key`.
    ///
    /// `None` when `force_rebuild` is set, when nothing is cached, or when
    /// the cached index is older than the TTL (it is dropped as well).
    pub fn get(&self, user_key: &str, force_rebuild: bool) -> Option<Arc<I>> {
        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        if force_rebuild {
            inner.counters.forced_rebuilds += 1;
            debug!(user_key, "Index rebuild forced");
            return None;
        }

        let expired = match inner.entries.get(user_key) {
            Some(cached) => self.is_expired(cached.built_at, now),
            None => {
                inner.counters.misses += 1;
                return None;
            }
        };

        if expired {
            inner.entries.remove(user_key);
            inner.counters.expirations += 1;
            inner.counters.misses += 1;
            info!(user_key, "Cached index expired");
            return None;
        }

        inner.counters.hits += 1;
        inner
            .entries
            .get(user_key)
            .map(|cached| Arc::clone(&cached.index))
    }

    /// Store `index` for `user_key`, replacing any previous one.
    pub fn put(&self, index: Arc<I>, user_key: &str) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let previous = inner.entries.insert(
            user_key.to_string(),
            CachedIndex {
                index,
                built_at: Instant::now(),
            },
        );

        if previous.is_some() {
            inner.counters.updates += 1;
            info!(user_key, "Cached index replaced");
        } else {
            inner.counters.builds += 1;
            info!(user_key, "Index cached");
        }
    }

    /// Drop the index for `user_key`. Returns whether one was cached.
    pub fn invalidate(&self, user_key: &str) -> bool {
        let mut inner = self.lock();
        let removed = inner.entries.remove(user_key).is_some();
        if removed {
            inner.counters.invalidations += 1;
            info!(user_key, "Cached index invalidated");
        }
        removed
    }

    /// Drop every cached index.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        inner.counters.invalidations += count as u64;
        info!(count, "Index cache cleared");
    }

    /// Drop every index older than the TTL. Returns the number dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, cached| !self.is_expired(cached.built_at, now));
        let removed = before - inner.entries.len();

        inner.counters.expirations += removed as u64;
        if removed > 0 {
            info!(removed, "Expired indexes removed");
        }
        removed
    }

    /// Age of the index cached for `user_key`.
    pub fn age(&self, user_key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.lock()
            .entries
            .get(user_key)
            .map(|cached| now.saturating_duration_since(cached.built_at))
    }

    pub fn get_stats(&self) -> IndexCacheStats {
        let inner = self.lock();
        let c = &inner.counters;
        IndexCacheStats {
            cached_indexes: inner.entries.len(),
            ttl_secs: self.ttl.as_secs(),
            hits: c.hits,
            misses: c.misses,
            forced_rebuilds: c.forced_rebuilds,
            builds: c.builds,
            updates: c.updates,
            invalidations: c.invalidations,
            expirations: c.expirations,
        }
    }
}

impl<I> Default for IndexCache<I> {
    fn default() -> Self {
        Self::from_settings(&IndexCacheSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_types::DEFAULT_USER_KEY;

    fn cache() -> IndexCache<String> {
        IndexCache::new(Duration::from_secs(60))
    }

    #[test]
    fn test_put_get() {
        let cache = cache();
        assert!(cache.get(DEFAULT_USER_KEY, false).is_none());

        cache.put(Arc::new("index-a".to_string()), DEFAULT_USER_KEY);
        let index = cache.get(DEFAULT_USER_KEY, false).unwrap();
        assert_eq!(index.as_str(), "index-a");

        let stats = cache.get_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.builds, 1);
        assert_eq!(stats.updates, 0);
    }

    #[test]
    fn test_put_replaces_and_counts_update() {
        let cache = cache();
        cache.put(Arc::new("v1".to_string()), "alice");
        let reader = cache.get("alice", false).unwrap();
        cache.put(Arc::new("v2".to_string()), "alice");

        // earlier readers keep their snapshot
        assert_eq!(reader.as_str(), "v1");
        assert_eq!(cache.get("alice", false).unwrap().as_str(), "v2");
        assert_eq!(cache.get_stats().updates, 1);
        assert_eq!(cache.get_stats().builds, 1);
    }

    #[test]
    fn test_force_rebuild() {
        let cache = cache();
        cache.put(Arc::new("v1".to_string()), "alice");
        assert!(cache.get("alice", true).is_none());
        assert_eq!(cache.get_stats().forced_rebuilds, 1);
        // forcing does not drop the entry
        assert!(cache.get("alice", false).is_some());
    }

    #[test]
    fn test_user_keys_are_isolated() {
        let cache = cache();
        cache.put(Arc::new("alice".to_string()), "alice");
        assert!(cache.get("bob", false).is_none());
        assert!(cache.invalidate("alice"));
        assert!(!cache.invalidate("alice"));
        assert_eq!(cache.get_stats().invalidations, 1);
    }

    #[test]
    fn test_clear() {
        let cache = cache();
        cache.put(Arc::new("a".to_string()), "alice");
        cache.put(Arc::new("b".to_string()), "bob");
        cache.clear();
        assert_eq!(cache.get_stats().cached_indexes, 0);
        assert_eq!(cache.get_stats().invalidations, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_evicted_on_get() {
        let cache = cache();
        cache.put(Arc::new("v1".to_string()), "alice");

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("alice", false).is_some());
        assert_eq!(cache.age("alice"), Some(Duration::from_secs(59)));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("alice", false).is_none());

        let stats = cache.get_stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.cached_indexes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired() {
        let cache = cache();
        cache.put(Arc::new("old".to_string()), "alice");
        tokio::time::advance(Duration::from_secs(45)).await;
        cache.put(Arc::new("new".to_string()), "bob");
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(cache.cleanup_expired(), 1);
        assert!(cache.get("bob", false).is_some());
        assert_eq!(cache.get_stats().cached_indexes, 1);
    }
}
