//! Embedding cache.
//!
//! Memoizes provider results keyed by normalized text, so " Office Lamp " and
//! "office lamp" share one entry.

use std::time::Duration;

use resolver_types::{normalize_non_empty, CacheSettings};
use tracing::debug;

use crate::model::Embedding;
use crate::ttl_cache::{CacheStats, TtlLruCache};

/// LRU-bounded embedding cache with optional TTL.
pub struct EmbeddingCache {
    entries: TtlLruCache<String, Embedding>,
}

impl EmbeddingCache {
    pub fn new(max_size: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: TtlLruCache::new(max_size, ttl),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.max_size, settings.ttl_secs.map(Duration::from_secs))
    }

    /// Cached embedding for `text`. Empty text is always a miss.
    pub fn get(&self, text: &str) -> Option<Embedding> {
        let key = normalize_non_empty(text)?;
        let hit = self.entries.get(&key);
        debug!(key = %key, hit = hit.is_some(), "Embedding cache lookup");
        hit
    }

    /// Store `embedding` for `text`. Empty text is ignored.
    pub fn put(&self, text: &str, embedding: Embedding) {
        if let Some(key) = normalize_non_empty(text) {
            self.entries.put(key, embedding);
        }
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

    /// Remove expired entries; 0 when TTL is disabled.
    pub fn cleanup_expired(&self) -> usize {
        let removed = self.entries.cleanup_expired();
        if removed > 0 {
            debug!(removed, "Expired embeddings removed");
        }
        removed
    }

    pub fn get_stats(&self) -> CacheStats {
        self.entries.stats()
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::embedding_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_normalized() {
        let cache = EmbeddingCache::new(10, None);
        cache.put(" Office Lamp ", Embedding::new(vec![1.0, 0.0]));

        assert_eq!(cache.get("office lamp"), cache.get(" OFFICE LAMP"));
        assert!(cache.get("office lamp").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_empty_text_ignored() {
        let cache = EmbeddingCache::new(10, None);
        cache.put("   ", Embedding::new(vec![1.0]));
        assert!(cache.is_empty());
        assert!(cache.get("").is_none());
        // empty lookups never reach the counters
        assert_eq!(cache.get_stats().misses, 0);
    }

    #[test]
    fn test_bounded_by_max_size() {
        let cache = EmbeddingCache::new(2, None);
        cache.put("kitchen", Embedding::new(vec![1.0]));
        cache.put("office", Embedding::new(vec![2.0]));
        cache.put("garage", Embedding::new(vec![3.0]));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("kitchen").is_none());
        assert_eq!(cache.get_stats().evictions, 1);
    }

    #[test]
    fn test_defaults_have_no_ttl() {
        let cache = EmbeddingCache::default();
        let stats = cache.get_stats();
        assert_eq!(stats.max_size, 1_000);
        assert_eq!(stats.ttl_secs, None);
        assert_eq!(cache.cleanup_expired(), 0);
    }
}
