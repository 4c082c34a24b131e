//! Index entry types.

use chrono::{DateTime, Utc};
use resolver_embeddings::Embedding;
use resolver_types::VariantType;
use serde::Serialize;

/// One name an entity can be referred to by.
///
/// The embedding is fixed at construction; re-indexing an entity builds new
/// variants rather than updating these.
#[derive(Debug, Clone)]
pub struct EntityVariant {
    pub entity_id: String,
    /// Name as supplied (trimmed, original casing)
    pub variant_name: String,
    pub variant_type: VariantType,
    pub embedding: Option<Embedding>,
    pub area_id: Option<String>,
    pub area_name: Option<String>,
}

impl EntityVariant {
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// Everything the index knows about one entity.
#[derive(Debug, Clone)]
pub struct EntityIndexEntry {
    pub entity_id: String,
    pub domain: String,
    pub device_id: Option<String>,
    pub area_id: Option<String>,
    pub area_name: Option<String>,
    /// Variants in the order they were supplied
    pub variants: Vec<EntityVariant>,
    pub last_updated: DateTime<Utc>,
}

impl EntityIndexEntry {
    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.variant_name.as_str())
    }

    pub fn matches_filters(&self, domain: Option<&str>, area_id: Option<&str>) -> bool {
        domain.map_or(true, |d| self.domain == d)
            && area_id.map_or(true, |a| self.area_id.as_deref() == Some(a))
    }
}

/// A scored search hit.
///
/// Scores from the semantic path are cosine similarities in [-1, 1]; scores
/// from the exact-match fallback are length ratios, 1.0 for an exact name and
/// above 1.0 when a name sits inside a longer query. Compare ranks, not
/// absolute scores, across the two.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityMatch {
    pub entity_id: String,
    pub score: f32,
}

impl EntityMatch {
    pub fn new(entity_id: impl Into<String>, score: f32) -> Self {
        Self {
            entity_id: entity_id.into(),
            score,
        }
    }
}
