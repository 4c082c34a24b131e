//! Personalized entity index.
//!
//! Maps every device to all the names it is known by and answers "which
//! device does this text refer to?".
//!
//! ## Search paths
//!
//! ```text
//! search_by_name(query)
//!      │
//!      ├─ query cache hit ──────────────▶ cached ranking
//!      │
//!      ├─ query embedding ready ────────▶ max cosine over each entity's
//!      │                                  embedded variants
//!      │
//!      └─ embedding unavailable ────────▶ search_by_exact_match
//! ```
//!
//! ## Mutation
//!
//! `add_entity`, `remove_entity` and `clear` take `&mut self`. Shared
//! instances sit behind an `Arc`; updates are applied to a [`fork`] and
//! swapped in, so readers never see a half-updated index.
//!
//! [`fork`]: PersonalizedEntityIndex::fork

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use resolver_embeddings::{CacheStats, CachedEmbedder, Embedding, EmbeddingLookup};
use resolver_types::{normalize, normalize_non_empty, CacheSettings, EntityRecord};
use serde::Serialize;
use tracing::{debug, info};

use crate::entry::{EntityIndexEntry, EntityMatch, EntityVariant};
use crate::query_cache::{QueryKey, QueryResultCache};

/// Search counters.
#[derive(Debug, Default)]
struct SearchMetrics {
    searches: AtomicU64,
    semantic_searches: AtomicU64,
    exact_fallbacks: AtomicU64,
    query_cache_hits: AtomicU64,
}

impl SearchMetrics {
    fn copy(&self) -> Self {
        let load = |counter: &AtomicU64| AtomicU64::new(counter.load(Ordering::Relaxed));
        Self {
            searches: load(&self.searches),
            semantic_searches: load(&self.semantic_searches),
            exact_fallbacks: load(&self.exact_fallbacks),
            query_cache_hits: load(&self.query_cache_hits),
        }
    }
}

/// Index statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct EntityIndexStats {
    pub entity_count: usize,
    pub variant_count: usize,
    pub embedded_variant_count: usize,
    pub area_count: usize,
    pub domain_count: usize,
    pub searches: u64,
    pub semantic_searches: u64,
    pub exact_fallbacks: u64,
    pub query_cache_hits: u64,
    pub embedding_cache: CacheStats,
    pub query_cache: CacheStats,
}

/// In-memory index of every name variant per entity.
pub struct PersonalizedEntityIndex {
    embedder: CachedEmbedder,
    query_cache: QueryResultCache,
    entries: HashMap<String, EntityIndexEntry>,
    /// Entity ids in first-insertion order; ties in ranking follow it
    order: Vec<String>,
    /// normalized variant name -> entity ids
    name_index: HashMap<String, Vec<String>>,
    /// area id -> entity ids
    area_index: HashMap<String, Vec<String>>,
    metrics: SearchMetrics,
}

impl PersonalizedEntityIndex {
    pub fn new(embedder: CachedEmbedder, query_cache: QueryResultCache) -> Self {
        Self {
            embedder,
            query_cache,
            entries: HashMap::new(),
            order: Vec::new(),
            name_index: HashMap::new(),
            area_index: HashMap::new(),
            metrics: SearchMetrics::default(),
        }
    }

    pub fn with_settings(embedder: CachedEmbedder, query_cache: &CacheSettings) -> Self {
        Self::new(embedder, QueryResultCache::from_settings(query_cache))
    }

    /// Copy of the index for applying updates off to the side.
    ///
    /// Shares the embedder (and its embedding cache); starts with an empty
    /// query cache since the copy exists to be changed.
    pub fn fork(&self) -> Self {
        Self {
            embedder: self.embedder.clone(),
            query_cache: self.query_cache.empty_like(),
            entries: self.entries.clone(),
            order: self.order.clone(),
            name_index: self.name_index.clone(),
            area_index: self.area_index.clone(),
            metrics: self.metrics.copy(),
        }
    }

    pub fn embedder(&self) -> &CachedEmbedder {
        &self.embedder
    }

    pub fn query_cache(&self) -> &QueryResultCache {
        &self.query_cache
    }

    /// Index (or re-index) one entity.
    ///
    /// Any previous entry for the same id is replaced wholesale, including
    /// its name and area index entries. A variant whose embedding cannot be
    /// computed is kept without one; it still takes part in exact matching.
    pub async fn add_entity(&mut self, record: EntityRecord) {
        let EntityRecord {
            entity_id,
            domain,
            device_id,
            area_id,
            area_name,
            name_variants,
        } = record;

        let names: Vec<_> = name_variants
            .into_iter()
            .filter_map(|(variant_type, name)| {
                let name = name.trim();
                (!name.is_empty()).then(|| (variant_type, name.to_string()))
            })
            .collect();

        let texts: Vec<&str> = names.iter().map(|(_, name)| name.as_str()).collect();
        let lookups = self.embedder.embed_many(&texts).await;

        let variants: Vec<EntityVariant> = names
            .into_iter()
            .zip(lookups)
            .map(|((variant_type, variant_name), lookup)| EntityVariant {
                entity_id: entity_id.clone(),
                variant_name,
                variant_type,
                embedding: lookup.into_embedding(),
                area_id: area_id.clone(),
                area_name: area_name.clone(),
            })
            .collect();

        let embedded = variants.iter().filter(|v| v.has_embedding()).count();
        if embedded < variants.len() {
            debug!(
                entity_id = %entity_id,
                missing = variants.len() - embedded,
                "Indexed variants without embeddings"
            );
        }

        let replaced = match self.entries.remove(&entity_id) {
            Some(old) => {
                self.unlink(&old);
                true
            }
            None => {
                self.order.push(entity_id.clone());
                false
            }
        };

        let entry = EntityIndexEntry {
            entity_id: entity_id.clone(),
            domain,
            device_id,
            area_id,
            area_name,
            variants,
            last_updated: Utc::now(),
        };
        self.link(&entry);

        debug!(
            entity_id = %entity_id,
            variants = entry.variants.len(),
            embedded,
            replaced,
            "Entity indexed"
        );
        self.entries.insert(entity_id, entry);
        self.query_cache.clear();
    }

    /// Remove one entity and every index entry pointing at it.
    pub fn remove_entity(&mut self, entity_id: &str) -> Option<EntityIndexEntry> {
        let entry = self.entries.remove(entity_id)?;
        self.unlink(&entry);
        self.order.retain(|id| id != entity_id);
        self.query_cache.clear();
        debug!(entity_id = %entity_id, "Entity removed");
        Some(entry)
    }

    fn link(&mut self, entry: &EntityIndexEntry) {
        for name in distinct_names(entry) {
            let ids = self.name_index.entry(name).or_default();
            if !ids.contains(&entry.entity_id) {
                ids.push(entry.entity_id.clone());
            }
        }
        if let Some(area_id) = &entry.area_id {
            let ids = self.area_index.entry(area_id.clone()).or_default();
            if !ids.contains(&entry.entity_id) {
                ids.push(entry.entity_id.clone());
            }
        }
    }

    fn unlink(&mut self, entry: &EntityIndexEntry) {
        for name in distinct_names(entry) {
            remove_from(&mut self.name_index, &name, &entry.entity_id);
        }
        if let Some(area_id) = &entry.area_id {
            remove_from(&mut self.area_index, area_id, &entry.entity_id);
        }
    }

    pub fn get_entity(&self, entity_id: &str) -> Option<&EntityIndexEntry> {
        self.entries.get(entity_id)
    }

    /// Entity ids in insertion order.
    pub fn entity_ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entities directly assigned to `area_id`.
    pub fn get_entities_by_area(&self, area_id: &str) -> Vec<String> {
        self.area_index.get(area_id).cloned().unwrap_or_default()
    }

    /// entity id -> area id, for every entity with an area.
    pub fn entity_area_map(&self) -> HashMap<String, String> {
        self.entries
            .values()
            .filter_map(|e| e.area_id.clone().map(|a| (e.entity_id.clone(), a)))
            .collect()
    }

    fn ordered_entries<'a>(
        &'a self,
        domain: Option<&'a str>,
        area_id: Option<&'a str>,
    ) -> impl Iterator<Item = &'a EntityIndexEntry> + 'a {
        self.order
            .iter()
            .filter_map(move |id| self.entries.get(id))
            .filter(move |e| e.matches_filters(domain, area_id))
    }

    /// Rank entities by how well one of their names matches `query`.
    ///
    /// Uses embedding similarity when a query embedding is available and
    /// falls back to [`search_by_exact_match`] otherwise. Results are cached
    /// per (query, domain, area_id, limit).
    ///
    /// The two paths score on different scales (cosine in [-1, 1] versus
    /// length ratios that can exceed 1.0); rank results rather than
    /// thresholding on the score.
    ///
    /// [`search_by_exact_match`]: Self::search_by_exact_match
    pub async fn search_by_name(
        &self,
        query: &str,
        domain: Option<&str>,
        area_id: Option<&str>,
        limit: usize,
    ) -> Vec<EntityMatch> {
        let Some(normalized) = normalize_non_empty(query) else {
            return Vec::new();
        };
        self.metrics.searches.fetch_add(1, Ordering::Relaxed);

        let key = QueryKey::new(&normalized, domain, area_id, limit);
        if let Some(cached) = self.query_cache.get(&key) {
            self.metrics.query_cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(query = %normalized, "Query cache hit");
            return cached;
        }

        let results = match self.embedder.embed(&normalized).await {
            EmbeddingLookup::Ready(query_embedding) => {
                self.metrics
                    .semantic_searches
                    .fetch_add(1, Ordering::Relaxed);
                self.rank_by_similarity(&query_embedding, domain, area_id, limit)
            }
            EmbeddingLookup::Unavailable(reason) => {
                self.metrics.exact_fallbacks.fetch_add(1, Ordering::Relaxed);
                debug!(query = %normalized, ?reason, "No query embedding, using exact match");
                self.search_by_exact_match(&normalized, domain, area_id, limit)
            }
        };

        self.query_cache.put(key, results.clone());
        results
    }

    fn rank_by_similarity(
        &self,
        query: &Embedding,
        domain: Option<&str>,
        area_id: Option<&str>,
        limit: usize,
    ) -> Vec<EntityMatch> {
        let mut results: Vec<EntityMatch> = self
            .ordered_entries(domain, area_id)
            .filter_map(|entry| {
                entry
                    .variants
                    .iter()
                    .filter_map(|v| v.embedding.as_ref())
                    .map(|e| query.cosine_similarity(e))
                    .reduce(f32::max)
                    .map(|score| EntityMatch::new(entry.entity_id.clone(), score))
            })
            .collect();

        sort_and_truncate(&mut results, limit);
        results
    }

    /// Lexical search without embeddings.
    ///
    /// A variant equal to the normalized query scores 1.0. Otherwise a
    /// variant containing the query, or contained in it, scores
    /// `len(query) / len(variant)`, which exceeds 1.0 when the variant sits
    /// inside a longer query; an empty variant scores 0.5. Each entity keeps
    /// its best score.
    pub fn search_by_exact_match(
        &self,
        query: &str,
        domain: Option<&str>,
        area_id: Option<&str>,
        limit: usize,
    ) -> Vec<EntityMatch> {
        let Some(query) = normalize_non_empty(query) else {
            return Vec::new();
        };

        let exact: HashSet<&str> = self
            .name_index
            .get(&query)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default();

        let mut results: Vec<EntityMatch> = self
            .ordered_entries(domain, area_id)
            .filter_map(|entry| {
                let substring = entry
                    .variant_names()
                    .filter_map(|name| substring_score(&query, &normalize(name)))
                    .reduce(f32::max);
                let score = if exact.contains(entry.entity_id.as_str()) {
                    Some(substring.map_or(1.0, |s| s.max(1.0)))
                } else {
                    substring
                };
                score.map(|score| EntityMatch::new(entry.entity_id.clone(), score))
            })
            .collect();

        sort_and_truncate(&mut results, limit);
        results
    }

    /// Drop all entities, index entries and search counters.
    ///
    /// The embedding and query caches are left alone; clear them through
    /// [`embedder`](Self::embedder) / [`query_cache`](Self::query_cache).
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.name_index.clear();
        self.area_index.clear();
        self.metrics = SearchMetrics::default();
        info!(entities = count, "Entity index cleared");
    }

    pub fn get_stats(&self) -> EntityIndexStats {
        let variants = self.entries.values().flat_map(|e| e.variants.iter());
        let (variant_count, embedded_variant_count) =
            variants.fold((0, 0), |(all, embedded), v| {
                (all + 1, embedded + usize::from(v.has_embedding()))
            });
        let domain_count = self
            .entries
            .values()
            .map(|e| e.domain.as_str())
            .collect::<HashSet<_>>()
            .len();

        EntityIndexStats {
            entity_count: self.entries.len(),
            variant_count,
            embedded_variant_count,
            area_count: self.area_index.len(),
            domain_count,
            searches: self.metrics.searches.load(Ordering::Relaxed),
            semantic_searches: self.metrics.semantic_searches.load(Ordering::Relaxed),
            exact_fallbacks: self.metrics.exact_fallbacks.load(Ordering::Relaxed),
            query_cache_hits: self.metrics.query_cache_hits.load(Ordering::Relaxed),
            embedding_cache: self.embedder.cache().get_stats(),
            query_cache: self.query_cache.get_stats(),
        }
    }
}

fn distinct_names(entry: &EntityIndexEntry) -> HashSet<String> {
    entry.variant_names().map(normalize).collect()
}

fn remove_from(index: &mut HashMap<String, Vec<String>>, key: &str, entity_id: &str) {
    if let Some(ids) = index.get_mut(key) {
        ids.retain(|id| id != entity_id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

fn substring_score(query: &str, variant: &str) -> Option<f32> {
    if variant.is_empty() {
        return Some(0.5);
    }
    if !(variant.contains(query) || query.contains(variant)) {
        return None;
    }
    let query_len = query.chars().count() as f32;
    let variant_len = variant.chars().count() as f32;
    Some(query_len / variant_len)
}

/// Sort best-first; `sort_by` is stable, so equal scores keep input order.
fn sort_and_truncate(results: &mut Vec<EntityMatch>, limit: usize) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use resolver_embeddings::{EmbeddingCache, EmbeddingError, EmbeddingProvider, ModelInfo};
    use resolver_types::{EmbeddingSettings, VariantType};
    use std::sync::Arc;

    const WORDS: [&str; 4] = ["lamp", "office", "kitchen", "fan"];

    /// Bag-of-keywords embedding over a fixed vocabulary.
    struct KeywordEmbedder {
        info: ModelInfo,
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(WORDS
                .iter()
                .map(|w| if text.contains(w) { 1.0 } else { 0.0 })
                .collect())
        }
    }

    fn semantic_index() -> PersonalizedEntityIndex {
        let provider = Arc::new(KeywordEmbedder {
            info: ModelInfo::new("keywords", WORDS.len()),
        });
        let embedder = CachedEmbedder::new(
            Some(provider),
            Arc::new(EmbeddingCache::new(64, None)),
            &EmbeddingSettings::default(),
        );
        PersonalizedEntityIndex::with_settings(embedder, &CacheSettings::query_default())
    }

    fn lexical_index() -> PersonalizedEntityIndex {
        PersonalizedEntityIndex::with_settings(
            CachedEmbedder::disabled(),
            &CacheSettings::query_default(),
        )
    }

    fn wled_office() -> EntityRecord {
        EntityRecord::from_entity_id("light.wled_office")
            .with_variant(VariantType::PrimaryName, "WLED Office")
            .with_variant(VariantType::Alias, "Office Lamp")
            .with_area("office", "Office")
    }

    #[tokio::test]
    async fn test_exact_match_scenario() {
        let mut index = lexical_index();
        index.add_entity(wled_office()).await;

        assert_eq!(
            index.search_by_exact_match("office lamp", None, None, 5),
            vec![EntityMatch::new("light.wled_office", 1.0)]
        );
        assert_eq!(
            index.get_entities_by_area("office"),
            vec!["light.wled_office".to_string()]
        );
    }

    #[tokio::test]
    async fn test_readd_replaces_variants() {
        let mut index = lexical_index();
        index.add_entity(wled_office()).await;
        index
            .add_entity(
                EntityRecord::from_entity_id("light.wled_office")
                    .with_variant(VariantType::Alias, "Desk Light")
                    .with_area("study", "Study"),
            )
            .await;

        assert_eq!(index.len(), 1);
        assert!(index.search_by_exact_match("WLED Office", None, None, 5).is_empty());
        assert!(index.get_entities_by_area("office").is_empty());
        assert_eq!(
            index.search_by_exact_match("desk light", None, None, 5),
            vec![EntityMatch::new("light.wled_office", 1.0)]
        );
        assert!(!index.name_index.contains_key("wled office"));
        assert!(!index.name_index.contains_key("office lamp"));
    }

    #[tokio::test]
    async fn test_substring_scores() {
        let mut index = lexical_index();
        index
            .add_entity(
                EntityRecord::from_entity_id("light.ceiling")
                    .with_variant(VariantType::PrimaryName, "Kitchen Ceiling Light"),
            )
            .await;
        index
            .add_entity(
                EntityRecord::from_entity_id("switch.kitchen")
                    .with_variant(VariantType::PrimaryName, "Kitchen"),
            )
            .await;

        let results = index.search_by_exact_match("kitchen", None, None, 5);
        assert_eq!(results[0], EntityMatch::new("switch.kitchen", 1.0));
        assert_eq!(results[1].entity_id, "light.ceiling");
        assert!((results[1].score - 7.0 / 21.0).abs() < 1e-6);

        // variant contained in the query outranks an exact hit
        let results = index.search_by_exact_match("the kitchen please", None, None, 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entity_id, "switch.kitchen");
        assert!((results[0].score - 18.0 / 7.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_exact_hit_keeps_better_substring_score() {
        let mut index = lexical_index();
        index
            .add_entity(
                EntityRecord::from_entity_id("light.counter")
                    .with_variant(VariantType::PrimaryName, "Kitchen Lamp")
                    .with_variant(VariantType::Alias, "Lamp"),
            )
            .await;

        // exact on "kitchen lamp" (1.0), "lamp" inside the query (12 / 4)
        let results = index.search_by_exact_match("kitchen lamp", None, None, 5);
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 3.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_filters_and_limit() {
        let mut index = lexical_index();
        index.add_entity(wled_office()).await;
        index
            .add_entity(
                EntityRecord::from_entity_id("switch.office_fan")
                    .with_variant(VariantType::PrimaryName, "Office Fan")
                    .with_area("office", "Office"),
            )
            .await;

        let all = index.search_by_exact_match("office", None, None, 5);
        assert_eq!(all.len(), 2);

        let lights = index.search_by_exact_match("office", Some("light"), None, 5);
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].entity_id, "light.wled_office");

        assert!(index
            .search_by_exact_match("office", None, Some("kitchen"), 5)
            .is_empty());
        assert_eq!(index.search_by_exact_match("office", None, None, 1).len(), 1);
    }

    #[tokio::test]
    async fn test_semantic_search_max_over_variants() {
        let mut index = semantic_index();
        index.add_entity(wled_office()).await;
        index
            .add_entity(
                EntityRecord::from_entity_id("fan.kitchen")
                    .with_variant(VariantType::PrimaryName, "Kitchen Fan"),
            )
            .await;

        let results = index.search_by_name("lamp in the office", None, None, 5).await;
        assert_eq!(results[0].entity_id, "light.wled_office");
        // "office lamp" variant is an exact keyword match
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[1], EntityMatch::new("fan.kitchen", 0.0));

        let stats = index.get_stats();
        assert_eq!(stats.semantic_searches, 1);
        assert_eq!(stats.exact_fallbacks, 0);
    }

    #[tokio::test]
    async fn test_semantic_ties_keep_insertion_order() {
        let mut index = semantic_index();
        for id in ["light.b", "light.a", "light.c"] {
            index
                .add_entity(
                    EntityRecord::from_entity_id(id).with_variant(VariantType::PrimaryName, "Lamp"),
                )
                .await;
        }
        let ids: Vec<_> = index
            .search_by_name("lamp", None, None, 5)
            .await
            .into_iter()
            .map(|m| m.entity_id)
            .collect();
        assert_eq!(ids, vec!["light.b", "light.a", "light.c"]);
    }

    #[tokio::test]
    async fn test_entities_without_embeddings_excluded_from_semantic_path() {
        let mut index = semantic_index();
        index.add_entity(wled_office()).await;
        // insert an entry whose variants have no embeddings
        let mut record = EntityRecord::from_entity_id("light.hall");
        record.name_variants.push((VariantType::PrimaryName, "   ".to_string()));
        index.add_entity(record).await;

        assert_eq!(index.get_entity("light.hall").unwrap().variants.len(), 0);
        let results = index.search_by_name("lamp", None, None, 5).await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_without_embeddings() {
        let mut index = lexical_index();
        index.add_entity(wled_office()).await;

        let results = index.search_by_name("Office Lamp", None, None, 5).await;
        assert_eq!(results, vec![EntityMatch::new("light.wled_office", 1.0)]);
        assert_eq!(index.get_stats().exact_fallbacks, 1);
        assert_eq!(index.get_stats().embedded_variant_count, 0);
    }

    #[tokio::test]
    async fn test_query_cache_hit_and_invalidation() {
        let mut index = lexical_index();
        index.add_entity(wled_office()).await;

        index.search_by_name("office lamp", None, None, 5).await;
        index.search_by_name(" OFFICE LAMP ", None, None, 5).await;
        let stats = index.get_stats();
        assert_eq!(stats.searches, 2);
        assert_eq!(stats.query_cache_hits, 1);
        assert_eq!(stats.query_cache.size, 1);

        index
            .add_entity(
                EntityRecord::from_entity_id("light.office_lamp_2")
                    .with_variant(VariantType::PrimaryName, "Office Lamp"),
            )
            .await;
        assert!(index.query_cache().is_empty());
        assert_eq!(index.search_by_name("office lamp", None, None, 5).await.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_query() {
        let mut index = lexical_index();
        index.add_entity(wled_office()).await;
        assert!(index.search_by_name("   ", None, None, 5).await.is_empty());
        assert!(index.search_by_exact_match("", None, None, 5).is_empty());
        assert_eq!(index.get_stats().searches, 0);
    }

    #[tokio::test]
    async fn test_remove_entity() {
        let mut index = lexical_index();
        index.add_entity(wled_office()).await;

        let removed = index.remove_entity("light.wled_office").unwrap();
        assert_eq!(removed.variants.len(), 2);
        assert!(index.is_empty());
        assert!(index.entity_ids().is_empty());
        assert!(index.get_entities_by_area("office").is_empty());
        assert!(index.name_index.is_empty());
        assert!(index.remove_entity("light.wled_office").is_none());
    }

    #[tokio::test]
    async fn test_clear_keeps_caches() {
        let mut index = semantic_index();
        index.add_entity(wled_office()).await;
        index.search_by_name("office", None, None, 5).await;

        index.clear();
        let stats = index.get_stats();
        assert_eq!(stats.entity_count, 0);
        assert_eq!(stats.area_count, 0);
        assert_eq!(stats.searches, 0);
        assert!(stats.embedding_cache.size > 0);
        assert_eq!(stats.query_cache.size, 1);
    }

    #[tokio::test]
    async fn test_fork_is_independent() {
        let mut index = lexical_index();
        index.add_entity(wled_office()).await;
        index.search_by_name("office lamp", None, None, 5).await;

        let mut fork = index.fork();
        assert!(fork.query_cache().is_empty());
        fork.remove_entity("light.wled_office");

        assert!(fork.is_empty());
        assert_eq!(index.len(), 1);
        assert_eq!(fork.get_stats().searches, 1);
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let mut index = semantic_index();
        index.add_entity(wled_office()).await;
        index
            .add_entity(
                EntityRecord::from_entity_id("fan.kitchen")
                    .with_variant(VariantType::PrimaryName, "Kitchen Fan")
                    .with_area("kitchen", "Kitchen"),
            )
            .await;

        let stats = index.get_stats();
        assert_eq!(stats.entity_count, 2);
        assert_eq!(stats.variant_count, 3);
        assert_eq!(stats.embedded_variant_count, 3);
        assert_eq!(stats.area_count, 2);
        assert_eq!(stats.domain_count, 2);
        assert_eq!(
            index.entity_area_map().get("fan.kitchen").map(String::as_str),
            Some("kitchen")
        );
    }
}
