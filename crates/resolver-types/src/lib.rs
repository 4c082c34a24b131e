//! # resolver-types
//!
//! Shared domain types for the device resolver.
//!
//! This crate defines the records and settings used throughout the system:
//! - Records: entity and area descriptions fed in by discovery
//! - Text: the normalization every index and cache key goes through
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use resolver_types::{EntityRecord, VariantType};
//!
//! let record = EntityRecord::from_entity_id("light.office_lamp")
//!     .with_variant(VariantType::PrimaryName, "Office Lamp");
//! assert_eq!(record.domain, "light");
//! ```

pub mod config;
pub mod error;
pub mod record;
pub mod text;

pub use config::{
    AreaSettings, CacheSettings, EmbeddingSettings, IndexCacheSettings, SearchSettings, Settings,
};
pub use error::ResolverError;
pub use record::{AreaRecord, EntityRecord, VariantType};
pub use text::{normalize, normalize_non_empty};

/// Household key used when the caller does not name one.
pub const DEFAULT_USER_KEY: &str = "default";
