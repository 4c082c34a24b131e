//! Cached, fail-open access to the embedding provider.
//!
//! Every embedding the resolver needs goes through [`CachedEmbedder::embed`]:
//! - empty text, a missing provider, a provider error, a timeout or a vector
//!   of the wrong dimension all come back as [`EmbeddingLookup::Unavailable`]
//! - nothing is raised to the caller; callers fall back to lexical matching

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use resolver_types::{normalize_non_empty, EmbeddingSettings};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cache::EmbeddingCache;
use crate::model::{Embedding, EmbeddingProvider};

/// Why no embedding could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    EmptyInput,
    NoProvider,
    Timeout,
    Failed,
    DimensionMismatch,
}

/// Outcome of an embedding lookup.
#[derive(Debug, Clone)]
pub enum EmbeddingLookup {
    Ready(Embedding),
    Unavailable(UnavailableReason),
}

impl EmbeddingLookup {
    pub fn is_ready(&self) -> bool {
        matches!(self, EmbeddingLookup::Ready(_))
    }

    pub fn into_embedding(self) -> Option<Embedding> {
        match self {
            EmbeddingLookup::Ready(embedding) => Some(embedding),
            EmbeddingLookup::Unavailable(_) => None,
        }
    }
}

/// Counters for embedding lookups.
#[derive(Debug, Default)]
pub struct EmbedderMetrics {
    pub cache_hits: AtomicU64,
    pub provider_calls: AtomicU64,
    pub provider_failures: AtomicU64,
    pub timeouts: AtomicU64,
    pub dimension_mismatches: AtomicU64,
    pub skipped_no_provider: AtomicU64,
}

impl EmbedderMetrics {
    pub fn snapshot(&self) -> EmbedderMetricsSnapshot {
        EmbedderMetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            dimension_mismatches: self.dimension_mismatches.load(Ordering::Relaxed),
            skipped_no_provider: self.skipped_no_provider.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of embedder metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbedderMetricsSnapshot {
    pub cache_hits: u64,
    pub provider_calls: u64,
    pub provider_failures: u64,
    pub timeouts: u64,
    pub dimension_mismatches: u64,
    pub skipped_no_provider: u64,
}

impl EmbedderMetricsSnapshot {
    /// Lookups that ended without an embedding for a provider-side reason.
    pub fn total_unavailable(&self) -> u64 {
        self.provider_failures + self.timeouts + self.dimension_mismatches + self.skipped_no_provider
    }
}

/// Provider + cache + timeout.
///
/// Cheap to clone; clones share the provider, cache and metrics.
#[derive(Clone)]
pub struct CachedEmbedder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    cache: Arc<EmbeddingCache>,
    timeout: Duration,
    metrics: Arc<EmbedderMetrics>,
}

impl CachedEmbedder {
    pub fn new(
        provider: Option<Arc<dyn EmbeddingProvider>>,
        cache: Arc<EmbeddingCache>,
        settings: &EmbeddingSettings,
    ) -> Self {
        Self {
            provider,
            cache,
            timeout: Duration::from_millis(settings.timeout_ms),
            metrics: Arc::new(EmbedderMetrics::default()),
        }
    }

    /// Embedder with no provider: every lookup is unavailable.
    pub fn disabled() -> Self {
        Self::new(
            None,
            Arc::new(EmbeddingCache::default()),
            &EmbeddingSettings::default(),
        )
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    pub fn metrics(&self) -> Arc<EmbedderMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Embedding for `text`, from cache or provider.
    pub async fn embed(&self, text: &str) -> EmbeddingLookup {
        let Some(key) = normalize_non_empty(text) else {
            return EmbeddingLookup::Unavailable(UnavailableReason::EmptyInput);
        };

        if let Some(embedding) = self.cache.get(&key) {
            self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
            return EmbeddingLookup::Ready(embedding);
        }

        let Some(provider) = &self.provider else {
            self.metrics
                .skipped_no_provider
                .fetch_add(1, Ordering::Relaxed);
            return EmbeddingLookup::Unavailable(UnavailableReason::NoProvider);
        };

        self.metrics.provider_calls.fetch_add(1, Ordering::Relaxed);
        let values = match timeout(self.timeout, provider.embed(&key)).await {
            Ok(Ok(values)) => values,
            Ok(Err(e)) => {
                self.metrics
                    .provider_failures
                    .fetch_add(1, Ordering::Relaxed);
                warn!(text = %key, error = %e, "Embedding failed, continuing without it");
                return EmbeddingLookup::Unavailable(UnavailableReason::Failed);
            }
            Err(_) => {
                self.metrics.timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(
                    text = %key,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Embedding timed out, continuing without it"
                );
                return EmbeddingLookup::Unavailable(UnavailableReason::Timeout);
            }
        };

        let expected = provider.info().dimension;
        if values.is_empty() || (expected > 0 && values.len() != expected) {
            self.metrics
                .dimension_mismatches
                .fetch_add(1, Ordering::Relaxed);
            warn!(
                text = %key,
                expected,
                actual = values.len(),
                model = %provider.info().name,
                "Provider returned wrong embedding dimension, discarding"
            );
            return EmbeddingLookup::Unavailable(UnavailableReason::DimensionMismatch);
        }

        let embedding = Embedding::new(values);
        self.cache.put(&key, embedding.clone());
        debug!(text = %key, dim = embedding.dimension(), "Embedding computed");
        EmbeddingLookup::Ready(embedding)
    }

    /// Embed several texts concurrently; results keep input order.
    pub async fn embed_many(&self, texts: &[&str]) -> Vec<EmbeddingLookup> {
        join_all(texts.iter().map(|text| self.embed(text))).await
    }
}
