//! # resolver-embeddings
//!
//! Embedding access for the device resolver.
//!
//! The embedding model is an external collaborator. This crate defines the
//! seam it plugs into and everything the resolver layers on top:
//! - `EmbeddingProvider`: async text -> vector trait
//! - `CachedEmbedder`: cache lookup, provider call under a timeout, and
//!   fail-open `EmbeddingLookup` results
//! - `EmbeddingCache` / `TtlLruCache`: LRU-bounded caches with optional TTL
//! - `cosine_similarity`: panics on mixed dimensions

pub mod cache;
pub mod embedder;
pub mod error;
pub mod model;
pub mod similarity;
pub mod ttl_cache;

pub use cache::EmbeddingCache;
pub use embedder::{
    CachedEmbedder, EmbedderMetrics, EmbedderMetricsSnapshot, EmbeddingLookup, UnavailableReason,
};
pub use error::EmbeddingError;
pub use model::{Embedding, EmbeddingProvider, ModelInfo};
pub use similarity::cosine_similarity;
pub use ttl_cache::{CacheStats, TtlLruCache};
