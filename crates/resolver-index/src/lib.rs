//! # resolver-index
//!
//! Personalized entity index for the device resolver.
//!
//! Holds every name variant of every device (each with its own embedding
//! where one could be computed) and answers name lookups:
//! - semantic ranking by max cosine similarity over an entity's variants
//! - exact / substring fallback when no query embedding is available
//! - domain and area filters, area -> entity reverse lookups
//! - a per-index query result cache (LRU + TTL)

pub mod entry;
pub mod index;
pub mod query_cache;

pub use entry::{EntityIndexEntry, EntityMatch, EntityVariant};
pub use index::{EntityIndexStats, PersonalizedEntityIndex};
pub use query_cache::{QueryKey, QueryResultCache};
