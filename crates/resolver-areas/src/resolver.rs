//! Area registry and resolution.
//!
//! Resolution stages, first hit wins:
//! 1. exact name or alias (normalized)
//! 2. semantic: best cosine over area-name embeddings, if above threshold
//! 3. substring in either direction against names and aliases

use std::collections::{HashMap, HashSet};

use resolver_embeddings::{CachedEmbedder, Embedding, EmbeddingLookup};
use resolver_types::{normalize, normalize_non_empty, AreaRecord, AreaSettings};
use serde::Serialize;
use tracing::{debug, info, warn};

/// A registered area.
#[derive(Debug, Clone)]
pub struct AreaInfo {
    pub area_id: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub parent_area_id: Option<String>,
    pub parent_area_name: Option<String>,
    pub embedding: Option<Embedding>,
}

impl AreaInfo {
    /// Name followed by aliases.
    fn labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Area statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AreaResolverStats {
    pub area_count: usize,
    pub alias_count: usize,
    pub indexed_names: usize,
    pub embedded_areas: usize,
    pub root_areas: usize,
}

/// Registry of areas with name, alias, semantic and hierarchy lookups.
#[derive(Clone)]
pub struct AreaResolver {
    embedder: CachedEmbedder,
    semantic_threshold: f32,
    areas: HashMap<String, AreaInfo>,
    /// Area ids in registration order
    order: Vec<String>,
    /// normalized name or alias -> area id
    name_index: HashMap<String, String>,
    /// parent area id -> child area ids
    children: HashMap<String, Vec<String>>,
}

impl AreaResolver {
    pub fn new(embedder: CachedEmbedder, settings: &AreaSettings) -> Self {
        Self {
            embedder,
            semantic_threshold: settings.semantic_threshold,
            areas: HashMap::new(),
            order: Vec::new(),
            name_index: HashMap::new(),
            children: HashMap::new(),
        }
    }

    pub fn semantic_threshold(&self) -> f32 {
        self.semantic_threshold
    }

    /// Register (or re-register) an area.
    ///
    /// The name embedding is best effort; an area without one is still
    /// found by exact and substring matching.
    pub async fn add_area(&mut self, record: AreaRecord) {
        let AreaRecord {
            area_id,
            name,
            aliases,
            parent_area_id,
            parent_area_name,
        } = record;

        if area_id.trim().is_empty() {
            warn!(name = %name, "Ignoring area without id");
            return;
        }

        let embedding = match self.embedder.embed(&name).await {
            EmbeddingLookup::Ready(embedding) => Some(embedding),
            EmbeddingLookup::Unavailable(reason) => {
                debug!(area_id = %area_id, ?reason, "Area registered without embedding");
                None
            }
        };

        if self.areas.contains_key(&area_id) {
            self.unregister(&area_id);
        } else {
            self.order.push(area_id.clone());
        }

        let info = AreaInfo {
            area_id: area_id.clone(),
            name: name.trim().to_string(),
            aliases: aliases
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            parent_area_id,
            parent_area_name,
            embedding,
        };

        for label in info.labels() {
            if let Some(key) = normalize_non_empty(label) {
                self.name_index.insert(key, area_id.clone());
            }
        }
        if let Some(parent) = &info.parent_area_id {
            let siblings = self.children.entry(parent.clone()).or_default();
            if !siblings.contains(&area_id) {
                siblings.push(area_id.clone());
            }
        }

        debug!(
            area_id = %area_id,
            name = %info.name,
            aliases = info.aliases.len(),
            parent = ?info.parent_area_id,
            "Area registered"
        );
        self.areas.insert(area_id, info);
    }

    /// Drop the name-index entries and parent link of a registered area.
    fn unregister(&mut self, area_id: &str) {
        let Some(old) = self.areas.get(area_id) else {
            return;
        };
        for label in old.labels() {
            let key = normalize(label);
            if self.name_index.get(&key).map(String::as_str) == Some(area_id) {
                self.name_index.remove(&key);
            }
        }
        if let Some(parent) = old.parent_area_id.clone() {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|id| id != area_id);
                if siblings.is_empty() {
                    self.children.remove(&parent);
                }
            }
        }
    }

    pub fn get_area(&self, area_id: &str) -> Option<&AreaInfo> {
        self.areas.get(area_id)
    }

    /// Area ids in registration order.
    pub fn area_ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    fn ordered_areas(&self) -> impl Iterator<Item = &AreaInfo> {
        self.order.iter().filter_map(|id| self.areas.get(id))
    }

    /// Resolve a free-text area mention to an area id.
    pub async fn resolve_area_name(&self, area_name: &str, use_semantic: bool) -> Option<String> {
        let query = normalize_non_empty(area_name)?;

        if let Some(area_id) = self.name_index.get(&query) {
            debug!(query = %query, area_id = %area_id, "Area resolved by name");
            return Some(area_id.clone());
        }

        if use_semantic {
            if let Some(area_id) = self.resolve_semantic(&query).await {
                return Some(area_id);
            }
        }

        let area_id = self
            .ordered_areas()
            .find(|area| {
                area.labels().any(|label| {
                    let label = normalize(label);
                    !label.is_empty() && (label.contains(&query) || query.contains(&label))
                })
            })
            .map(|area| area.area_id.clone());

        match &area_id {
            Some(id) => debug!(query = %query, area_id = %id, "Area resolved by substring"),
            None => debug!(query = %query, "Area not resolved"),
        }
        area_id
    }

    async fn resolve_semantic(&self, query: &str) -> Option<String> {
        let EmbeddingLookup::Ready(query_embedding) = self.embedder.embed(query).await else {
            return None;
        };

        let mut best: Option<(&AreaInfo, f32)> = None;
        for area in self.ordered_areas() {
            let Some(embedding) = &area.embedding else {
                continue;
            };
            let score = query_embedding.cosine_similarity(embedding);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((area, score));
            }
        }

        let (area, score) = best?;
        if score > self.semantic_threshold {
            debug!(query = %query, area_id = %area.area_id, score, "Area resolved semantically");
            Some(area.area_id.clone())
        } else {
            debug!(
                query = %query,
                best = %area.area_id,
                score,
                threshold = self.semantic_threshold,
                "Semantic area match below threshold"
            );
            None
        }
    }

    /// Direct children of `area_id`.
    pub fn get_child_areas(&self, area_id: &str) -> Vec<String> {
        self.children.get(area_id).cloned().unwrap_or_default()
    }

    /// `area_id` followed by all its descendants, depth first.
    ///
    /// Each area appears once even if the parent links contain a cycle.
    pub fn get_all_areas_in_hierarchy(&self, area_id: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![area_id.to_string()];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(children) = self.children.get(&current) {
                stack.extend(children.iter().rev().cloned());
            }
            result.push(current);
        }

        result
    }

    /// Keep the entities located in `area_id` (and its descendants when
    /// `include_children` is set).
    ///
    /// Entity locations come from `area_map` (entity id -> area id). Without
    /// a map nothing can be filtered and the input is returned unchanged.
    pub fn filter_entities_by_area(
        &self,
        entity_ids: &[String],
        area_id: &str,
        include_children: bool,
        area_map: Option<&HashMap<String, String>>,
    ) -> Vec<String> {
        let Some(area_map) = area_map else {
            warn!(area_id = %area_id, "No entity area map supplied, skipping area filter");
            return entity_ids.to_vec();
        };

        let targets: HashSet<String> = if include_children {
            self.get_all_areas_in_hierarchy(area_id).into_iter().collect()
        } else {
            HashSet::from([area_id.to_string()])
        };

        entity_ids
            .iter()
            .filter(|id| area_map.get(*id).is_some_and(|a| targets.contains(a)))
            .cloned()
            .collect()
    }

    /// First registered area whose name or alias occurs in `query`.
    ///
    /// Returns the area's display name. Registration order decides between
    /// several mentioned areas.
    pub fn extract_area_from_query(&self, query: &str) -> Option<String> {
        let query = normalize_non_empty(query)?;
        self.ordered_areas()
            .find(|area| {
                area.labels().any(|label| {
                    let label = normalize(label);
                    !label.is_empty() && query.contains(&label)
                })
            })
            .map(|area| area.name.clone())
    }

    pub fn clear(&mut self) {
        let count = self.areas.len();
        self.areas.clear();
        self.order.clear();
        self.name_index.clear();
        self.children.clear();
        info!(areas = count, "Area registry cleared");
    }

    pub fn get_stats(&self) -> AreaResolverStats {
        AreaResolverStats {
            area_count: self.areas.len(),
            alias_count: self.areas.values().map(|a| a.aliases.len()).sum(),
            indexed_names: self.name_index.len(),
            embedded_areas: self.areas.values().filter(|a| a.embedding.is_some()).count(),
            root_areas: self
                .areas
                .values()
                .filter(|a| a.parent_area_id.is_none())
                .count(),
        }
    }
}
