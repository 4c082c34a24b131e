//! Query result cache.
//!
//! Memoizes complete `search_by_name` calls. Device names and areas change
//! over time, so entries should always carry a TTL.

use std::time::Duration;

use resolver_embeddings::{CacheStats, TtlLruCache};
use resolver_types::{normalize, CacheSettings};

use crate::entry::EntityMatch;

/// Cache key: normalized query plus every argument that shapes the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub query: String,
    pub domain: Option<String>,
    pub area_id: Option<String>,
    pub limit: usize,
}

impl QueryKey {
    pub fn new(query: &str, domain: Option<&str>, area_id: Option<&str>, limit: usize) -> Self {
        Self {
            query: normalize(query),
            domain: domain.map(str::to_string),
            area_id: area_id.map(str::to_string),
            limit,
        }
    }
}

/// LRU + TTL cache of ranked search results.
pub struct QueryResultCache {
    entries: TtlLruCache<QueryKey, Vec<EntityMatch>>,
}

impl QueryResultCache {
    pub fn new(max_size: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: TtlLruCache::new(max_size, ttl),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.max_size, settings.ttl_secs.map(Duration::from_secs))
    }

    /// Empty cache with the same bounds.
    pub fn empty_like(&self) -> Self {
        Self::new(self.entries.max_size(), self.entries.ttl())
    }

    pub fn get(&self, key: &QueryKey) -> Option<Vec<EntityMatch>> {
        if key.query.is_empty() {
            return None;
        }
        self.entries.get(key)
    }

    pub fn put(&self, key: QueryKey, results: Vec<EntityMatch>) {
        if key.query.is_empty() {
            return;
        }
        self.entries.put(key, results);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cleanup_expired(&self) -> usize {
        self.entries.cleanup_expired()
    }

    pub fn get_stats(&self) -> CacheStats {
        self.entries.stats()
    }
}

impl Default for QueryResultCache {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::query_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalizes_query_only() {
        let a = QueryKey::new(" Office Lamp ", Some("light"), None, 5);
        let b = QueryKey::new("office lamp", Some("light"), None, 5);
        assert_eq!(a, b);

        assert_ne!(a, QueryKey::new("office lamp", Some("switch"), None, 5));
        assert_ne!(a, QueryKey::new("office lamp", Some("light"), Some("office"), 5));
        assert_ne!(a, QueryKey::new("office lamp", Some("light"), None, 3));
    }

    #[test]
    fn test_put_get() {
        let cache = QueryResultCache::new(4, None);
        let key = QueryKey::new("lamp", None, None, 5);
        cache.put(key.clone(), vec![EntityMatch::new("light.lamp", 0.9)]);

        assert_eq!(
            cache.get(&QueryKey::new("LAMP", None, None, 5)),
            Some(vec![EntityMatch::new("light.lamp", 0.9)])
        );
        assert_eq!(cache.get_stats().hits, 1);
    }

    #[test]
    fn test_empty_query_never_cached() {
        let cache = QueryResultCache::new(4, None);
        cache.put(QueryKey::new("  ", None, None, 5), Vec::new());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_expires_results() {
        let cache = QueryResultCache::default();
        let key = QueryKey::new("lamp", None, None, 5);
        cache.put(key.clone(), Vec::new());

        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn test_empty_like_keeps_bounds() {
        let cache = QueryResultCache::new(7, Some(Duration::from_secs(30)));
        cache.put(QueryKey::new("lamp", None, None, 5), Vec::new());

        let fresh = cache.empty_like();
        assert!(fresh.is_empty());
        assert_eq!(fresh.get_stats().max_size, 7);
        assert_eq!(fresh.get_stats().ttl_secs, Some(30));
    }
}
