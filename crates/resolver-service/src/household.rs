//! Household index: entity index plus area registry for one user key.

use std::sync::Arc;

use resolver_areas::{AreaResolver, AreaResolverStats};
use resolver_embeddings::{CachedEmbedder, EmbeddingCache, EmbeddingProvider};
use resolver_index::{EntityIndexStats, PersonalizedEntityIndex};
use resolver_types::{AreaRecord, EntityRecord, ResolverError, Settings};
use serde::Serialize;
use tracing::info;

/// Everything needed to resolve device references for one household.
pub struct HouseholdIndex {
    pub entities: PersonalizedEntityIndex,
    pub areas: AreaResolver,
}

/// Combined statistics.
#[derive(Debug, Clone, Serialize)]
pub struct HouseholdStats {
    pub entities: EntityIndexStats,
    pub areas: AreaResolverStats,
}

impl HouseholdIndex {
    /// Copy for applying an update off to the side; see
    /// [`PersonalizedEntityIndex::fork`].
    pub fn fork(&self) -> Self {
        Self {
            entities: self.entities.fork(),
            areas: self.areas.clone(),
        }
    }

    pub fn get_stats(&self) -> HouseholdStats {
        HouseholdStats {
            entities: self.entities.get_stats(),
            areas: self.areas.get_stats(),
        }
    }
}

/// Builds household indexes from discovery records.
///
/// All indexes built here share one embedder, and with it one embedding
/// cache: an embedding depends only on the text, so rebuilds and other
/// households reuse earlier provider results.
pub struct HouseholdIndexBuilder {
    embedder: CachedEmbedder,
    settings: Settings,
}

impl HouseholdIndexBuilder {
    pub fn new(provider: Option<Arc<dyn EmbeddingProvider>>, settings: Settings) -> Self {
        let cache = Arc::new(EmbeddingCache::from_settings(&settings.embedding_cache));
        let embedder = CachedEmbedder::new(provider, cache, &settings.embedding);
        Self { embedder, settings }
    }

    pub fn embedder(&self) -> &CachedEmbedder {
        &self.embedder
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Household index with nothing in it.
    pub fn empty(&self) -> HouseholdIndex {
        HouseholdIndex {
            entities: PersonalizedEntityIndex::with_settings(
                self.embedder.clone(),
                &self.settings.query_cache,
            ),
            areas: AreaResolver::new(self.embedder.clone(), &self.settings.areas),
        }
    }

    /// Build an index from areas and entities. Areas go in first.
    pub async fn build(
        &self,
        areas: impl IntoIterator<Item = AreaRecord>,
        entities: impl IntoIterator<Item = EntityRecord>,
    ) -> HouseholdIndex {
        let mut household = self.empty();
        for area in areas {
            household.areas.add_area(area).await;
        }
        for entity in entities {
            household.entities.add_entity(entity).await;
        }

        let stats = household.get_stats();
        info!(
            entities = stats.entities.entity_count,
            variants = stats.entities.variant_count,
            embedded = stats.entities.embedded_variant_count,
            areas = stats.areas.area_count,
            "Household index built"
        );
        household
    }

    /// Build from JSON arrays of area and entity records.
    pub async fn build_from_json(
        &self,
        areas_json: &[u8],
        entities_json: &[u8],
    ) -> Result<HouseholdIndex, ResolverError> {
        let areas: Vec<AreaRecord> = serde_json::from_slice(areas_json)?;
        let entities: Vec<EntityRecord> = serde_json::from_slice(entities_json)?;
        Ok(self.build(areas, entities).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_types::VariantType;

    #[tokio::test]
    async fn test_build_without_provider() {
        let builder = HouseholdIndexBuilder::new(None, Settings::default());
        let household = builder
            .build(
                vec![AreaRecord::new("office", "Office")],
                vec![EntityRecord::from_entity_id("light.desk")
                    .with_variant(VariantType::PrimaryName, "Desk Lamp")
                    .with_area("office", "Office")],
            )
            .await;

        let stats = household.get_stats();
        assert_eq!(stats.entities.entity_count, 1);
        assert_eq!(stats.entities.embedded_variant_count, 0);
        assert_eq!(stats.areas.area_count, 1);
    }

    #[tokio::test]
    async fn test_build_from_json() {
        let builder = HouseholdIndexBuilder::new(None, Settings::default());
        let areas = br#"[{"area_id": "garage", "name": "Garage", "aliases": ["workshop"]}]"#;
        let entities = br#"[{
            "entity_id": "cover.garage_door",
            "domain": "cover",
            "area_id": "garage",
            "name_variants": [["primary_name", "Garage Door"]]
        }]"#;

        let household = builder.build_from_json(areas, entities).await.unwrap();
        assert!(household.entities.get_entity("cover.garage_door").is_some());
        assert_eq!(
            household.areas.resolve_area_name("workshop", false).await.as_deref(),
            Some("garage")
        );
    }

    #[tokio::test]
    async fn test_build_from_invalid_json() {
        let builder = HouseholdIndexBuilder::new(None, Settings::default());
        let result = builder.build_from_json(b"[]", b"{not json").await;
        assert!(matches!(result, Err(ResolverError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_fork_leaves_original_untouched() {
        let builder = HouseholdIndexBuilder::new(None, Settings::default());
        let household = builder
            .build(
                Vec::new(),
                vec![EntityRecord::from_entity_id("light.desk")
                    .with_variant(VariantType::PrimaryName, "Desk Lamp")],
            )
            .await;

        let mut fork = household.fork();
        fork.entities.remove_entity("light.desk");
        fork.areas.add_area(AreaRecord::new("office", "Office")).await;

        assert_eq!(household.entities.len(), 1);
        assert!(household.areas.is_empty());
        assert_eq!(fork.areas.len(), 1);
    }
}
