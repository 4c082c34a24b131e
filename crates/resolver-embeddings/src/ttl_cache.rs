//! Bounded LRU cache with optional time-to-live.
//!
//! ## Thread Safety
//!
//! All state sits behind one `Mutex`; every public call takes the lock once
//! and releases it before returning. Nothing awaits while holding it.
//!
//! ## Eviction
//!
//! - `get` promotes the entry to most-recently-used
//! - `put` inserts first, then evicts least-recently-used entries while the
//!   cache holds more than `max_size`
//! - an entry older than the TTL is removed on read (counted as a miss) or by
//!   `cleanup_expired`

use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tokio::time::Instant;

struct Slot<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, Slot<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

/// Cache statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_secs: Option<u64>,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache with optional TTL, safe to share between tasks.
pub struct TtlLruCache<K: Hash + Eq, V> {
    inner: Mutex<Inner<K, V>>,
    max_size: usize,
    ttl: Option<Duration>,
}

impl<K, V> TtlLruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a cache holding at most `max_size` entries (minimum 1).
    pub fn new(max_size: usize, ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
            max_size: max_size.max(1),
            ttl,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        // Every mutation completes inside one critical section, so the
        // state behind a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, inserted_at: Instant, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(inserted_at) > ttl,
            None => false,
        }
    }

    /// Look up `key`, promoting it on hit.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.peek(key) {
            Some(slot) => self.is_expired(slot.inserted_at, now),
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if expired {
            inner.entries.pop(key);
            inner.expirations += 1;
            inner.misses += 1;
            return None;
        }

        inner.hits += 1;
        inner.entries.get(key).map(|slot| slot.value.clone())
    }

    /// Insert or replace `key`, then evict down to `max_size`.
    pub fn put(&self, key: K, value: V) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        inner.entries.put(
            key,
            Slot {
                value,
                inserted_at: Instant::now(),
            },
        );

        while inner.entries.len() > self.max_size {
            if inner.entries.pop_lru().is_none() {
                break;
            }
            inner.evictions += 1;
        }
    }

    /// Remove `key`, returning its value if present.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().entries.pop(key).map(|slot| slot.value)
    }

    /// Whether `key` is held, without promoting it or checking expiry.
    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains(key)
    }

    /// Keys from most- to least-recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.lock().entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and reset counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
        inner.expirations = 0;
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        let expired: Vec<K> = inner
            .entries
            .iter()
            .filter(|(_, slot)| self.is_expired(slot.inserted_at, now))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &expired {
            inner.entries.pop(key);
        }
        inner.expirations += expired.len() as u64;
        expired.len()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            size: inner.entries.len(),
            max_size: self.max_size,
            ttl_secs: self.ttl.map(|ttl| ttl.as_secs()),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
        }
    }
}
