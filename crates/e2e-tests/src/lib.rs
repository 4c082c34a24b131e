//! End-to-end test infrastructure for the device resolver.
//!
//! Provides deterministic embedding providers and household fixtures shared
//! by the tests under `tests/`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use resolver_embeddings::{
    CachedEmbedder, EmbeddingCache, EmbeddingError, EmbeddingProvider, ModelInfo,
};
use resolver_index::PersonalizedEntityIndex;
use resolver_service::{HouseholdIndex, HouseholdIndexBuilder, ResolverContext};
use resolver_types::{
    AreaRecord, AreaSettings, CacheSettings, EmbeddingSettings, EntityRecord, Settings,
    VariantType,
};

/// Vocabulary used by [`KeywordEmbedder`].
pub const KEYWORDS: [&str; 8] = [
    "lamp", "light", "office", "kitchen", "fan", "lounge", "bedroom", "door",
];

/// Bag-of-keywords embedding provider.
///
/// Each dimension is 1.0 when the text contains that keyword. Synonyms can
/// be registered so "living room" lands on the same vector as "lounge".
pub struct KeywordEmbedder {
    info: ModelInfo,
    synonyms: Vec<(String, String)>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            info: ModelInfo::new("keywords", KEYWORDS.len()),
            synonyms: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Treat `phrase` as if it were `keyword`.
    pub fn with_synonym(mut self, phrase: &str, keyword: &str) -> Self {
        self.synonyms.push((phrase.to_string(), keyword.to_string()));
        self
    }

    /// Number of `embed` calls that reached this provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut text = text.to_string();
        for (phrase, keyword) in &self.synonyms {
            text = text.replace(phrase.as_str(), keyword.as_str());
        }
        Ok(KEYWORDS
            .iter()
            .map(|k| if text.contains(k) { 1.0 } else { 0.0 })
            .collect())
    }
}

/// Provider whose every call fails.
pub struct FailingEmbedder {
    info: ModelInfo,
}

impl FailingEmbedder {
    pub fn new() -> Self {
        Self {
            info: ModelInfo::new("failing", KEYWORDS.len()),
        }
    }
}

impl Default for FailingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Provider("model offline".to_string()))
    }
}

/// Provider that answers like [`KeywordEmbedder`] after a fixed delay.
pub struct SlowEmbedder {
    inner: KeywordEmbedder,
    delay: Duration,
}

impl SlowEmbedder {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: KeywordEmbedder::new(),
            delay,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    fn info(&self) -> &ModelInfo {
        self.inner.info()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed(text).await
    }
}

/// Embedder over `provider` with its own fresh cache.
pub fn embedder(provider: Option<Arc<dyn EmbeddingProvider>>) -> CachedEmbedder {
    CachedEmbedder::new(
        provider,
        Arc::new(EmbeddingCache::from_settings(&CacheSettings::embedding_default())),
        &EmbeddingSettings::default(),
    )
}

/// Empty entity index over `provider`.
pub fn entity_index(provider: Option<Arc<dyn EmbeddingProvider>>) -> PersonalizedEntityIndex {
    PersonalizedEntityIndex::with_settings(embedder(provider), &CacheSettings::query_default())
}

/// Default area settings (semantic threshold 0.7).
pub fn area_settings() -> AreaSettings {
    AreaSettings::default()
}

/// `light.wled_office`: "WLED Office" / "Office Lamp" in the office.
pub fn wled_office() -> EntityRecord {
    EntityRecord::from_entity_id("light.wled_office")
        .with_variant(VariantType::PrimaryName, "WLED Office")
        .with_variant(VariantType::Alias, "Office Lamp")
        .with_area("office", "Office")
}

/// `light.office_lamp` with the single variant "Office Lamp".
pub fn office_lamp() -> EntityRecord {
    EntityRecord::from_entity_id("light.office_lamp")
        .with_variant(VariantType::PrimaryName, "Office Lamp")
        .with_area("office", "Office")
}

/// Areas of a small two-storey house.
///
/// ```text
/// upstairs
/// ├── bedroom
/// └── office
/// ground
/// ├── kitchen
/// └── lounge (alias "living room")
/// garage
/// ```
pub fn house_areas() -> Vec<AreaRecord> {
    vec![
        AreaRecord::new("upstairs", "Upstairs"),
        AreaRecord::new("ground", "Ground Floor"),
        AreaRecord::new("bedroom", "Bedroom").with_parent("upstairs", Some("Upstairs".into())),
        AreaRecord::new("office", "Office").with_parent("upstairs", Some("Upstairs".into())),
        AreaRecord::new("kitchen", "Kitchen").with_parent("ground", Some("Ground Floor".into())),
        AreaRecord::new("lounge", "Lounge")
            .with_alias("living room")
            .with_parent("ground", Some("Ground Floor".into())),
        AreaRecord::new("garage", "Garage"),
    ]
}

/// Devices placed in [`house_areas`].
pub fn house_entities() -> Vec<EntityRecord> {
    vec![
        wled_office(),
        EntityRecord::from_entity_id("light.bedside")
            .with_variant(VariantType::PrimaryName, "Bedside Lamp")
            .with_area("bedroom", "Bedroom"),
        EntityRecord::from_entity_id("light.kitchen_ceiling")
            .with_variant(VariantType::PrimaryName, "Kitchen Light")
            .with_variant(VariantType::FriendlyName, "Ceiling Light")
            .with_area("kitchen", "Kitchen"),
        EntityRecord::from_entity_id("fan.lounge")
            .with_variant(VariantType::PrimaryName, "Lounge Fan")
            .with_area("lounge", "Lounge"),
        EntityRecord::from_entity_id("light.floor_lamp")
            .with_variant(VariantType::PrimaryName, "Floor Lamp")
            .with_variant(VariantType::UserRenamed, "Reading Lamp")
            .with_area("lounge", "Lounge"),
        EntityRecord::from_entity_id("cover.garage_door")
            .with_variant(VariantType::PrimaryName, "Garage Door")
            .with_area("garage", "Garage"),
    ]
}

/// Build the [`house_areas`] / [`house_entities`] household.
pub async fn build_house(provider: Option<Arc<dyn EmbeddingProvider>>) -> HouseholdIndex {
    HouseholdIndexBuilder::new(provider, Settings::default())
        .build(house_areas(), house_entities())
        .await
}

/// Resolver context with the house already cached under `user_key`.
pub async fn house_context(
    provider: Option<Arc<dyn EmbeddingProvider>>,
    user_key: &str,
) -> ResolverContext {
    let context = ResolverContext::new(Settings::default(), provider);
    context
        .updater
        .rebuild(user_key, house_areas(), house_entities())
        .await;
    context
}

/// Write `contents` to a TOML file in a fresh temp dir.
///
/// The returned dir must be kept alive while the file is used.
pub fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("resolver.toml");
    std::fs::write(&path, contents).expect("Failed to write config file");
    (dir, path)
}

/// [`house_areas`] and [`house_entities`] as JSON arrays, the way a
/// discovery snapshot arrives.
pub fn house_json() -> (Vec<u8>, Vec<u8>) {
    let areas = serde_json::to_vec(&house_areas()).expect("Failed to serialize areas");
    let entities = serde_json::to_vec(&house_entities()).expect("Failed to serialize entities");
    (areas, entities)
}
