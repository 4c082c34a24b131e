//! Composition root.
//!
//! Wires one builder, one index cache, one updater and one resolver around a
//! shared embedding provider. Create it once at startup and hand the parts to
//! request handlers; nothing here is a global, so tests can build as many
//! as they like.

use std::sync::Arc;

use resolver_embeddings::EmbeddingProvider;
use resolver_types::Settings;
use tracing::info;

use crate::household::{HouseholdIndex, HouseholdIndexBuilder};
use crate::index_cache::IndexCache;
use crate::resolver::DeviceResolver;
use crate::updater::IndexUpdater;

pub struct ResolverContext {
    pub builder: Arc<HouseholdIndexBuilder>,
    pub index_cache: Arc<IndexCache<HouseholdIndex>>,
    pub updater: Arc<IndexUpdater>,
    pub resolver: Arc<DeviceResolver>,
}

impl ResolverContext {
    pub fn new(settings: Settings, provider: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        info!(
            provider = provider.as_ref().map(|p| p.info().name.as_str()).unwrap_or("none"),
            index_ttl_secs = settings.index_cache.ttl_secs,
            "Resolver context starting"
        );

        let index_cache = Arc::new(IndexCache::from_settings(&settings.index_cache));
        let default_limit = settings.search.default_limit;
        let builder = Arc::new(HouseholdIndexBuilder::new(provider, settings));
        let updater = Arc::new(IndexUpdater::new(
            Arc::clone(&index_cache),
            Arc::clone(&builder),
        ));
        let resolver = Arc::new(DeviceResolver::new(Arc::clone(&index_cache), default_limit));

        Self {
            builder,
            index_cache,
            updater,
            resolver,
        }
    }

    /// Drop expired cache entries everywhere. Returns the number removed.
    ///
    /// Meant for a periodic maintenance task.
    pub fn cleanup_expired(&self) -> usize {
        self.index_cache.cleanup_expired() + self.builder.embedder().cache().cleanup_expired()
    }
}
