//! Configuration loading for the device resolver.
//!
//! Layered config: defaults -> user config file -> explicit file -> env vars.
//! The user config file lives at `<config_dir>/device-resolver/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ResolverError;

/// Embedding provider call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Maximum time for one provider call (ms).
    /// A slower call is treated as "no embedding".
    #[serde(default = "default_embedding_timeout")]
    pub timeout_ms: u64,
}

fn default_embedding_timeout() -> u64 {
    2_000
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_embedding_timeout(),
        }
    }
}

impl EmbeddingSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("embedding.timeout_ms must be > 0".to_string());
        }
        Ok(())
    }
}

/// Bounds for an LRU cache with optional TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum number of entries.
    pub max_size: usize,

    /// Entry lifetime in seconds. `None` disables expiry.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl CacheSettings {
    pub fn new(max_size: usize, ttl_secs: Option<u64>) -> Self {
        Self { max_size, ttl_secs }
    }

    /// Embedding cache defaults: large, no expiry.
    pub fn embedding_default() -> Self {
        Self::new(1_000, None)
    }

    /// Query cache defaults: stale results hurt, so entries expire quickly.
    pub fn query_default() -> Self {
        Self::new(500, Some(300))
    }

    pub fn validate(&self, section: &str) -> Result<(), String> {
        if self.max_size == 0 {
            return Err(format!("{section}.max_size must be > 0"));
        }
        if self.ttl_secs == Some(0) {
            return Err(format!("{section}.ttl_secs must be > 0 when set"));
        }
        Ok(())
    }
}

fn default_embedding_cache() -> CacheSettings {
    CacheSettings::embedding_default()
}

fn default_query_cache() -> CacheSettings {
    CacheSettings::query_default()
}

/// Per-household index cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexCacheSettings {
    /// How long a built index is served before a rebuild is required.
    #[serde(default = "default_index_ttl")]
    pub ttl_secs: u64,
}

fn default_index_ttl() -> u64 {
    3_600
}

impl Default for IndexCacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_index_ttl(),
        }
    }
}

/// Area resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaSettings {
    /// Minimum cosine similarity (exclusive) for a semantic area match.
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f32,
}

fn default_semantic_threshold() -> f32 {
    0.7
}

impl Default for AreaSettings {
    fn default() -> Self {
        Self {
            semantic_threshold: default_semantic_threshold(),
        }
    }
}

impl AreaSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !(-1.0..=1.0).contains(&self.semantic_threshold) {
            return Err(format!(
                "areas.semantic_threshold must be -1.0..=1.0, got {}",
                self.semantic_threshold
            ));
        }
        Ok(())
    }
}

/// Search defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
}

fn default_search_limit() -> usize {
    5
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

/// Main resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default = "default_embedding_cache")]
    pub embedding_cache: CacheSettings,

    #[serde(default = "default_query_cache")]
    pub query_cache: CacheSettings,

    #[serde(default)]
    pub index_cache: IndexCacheSettings,

    #[serde(default)]
    pub areas: AreaSettings,

    #[serde(default)]
    pub search: SearchSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            embedding: EmbeddingSettings::default(),
            embedding_cache: default_embedding_cache(),
            query_cache: default_query_cache(),
            index_cache: IndexCacheSettings::default(),
            areas: AreaSettings::default(),
            search: SearchSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. User config file (`<config_dir>/device-resolver/config.toml`)
    /// 3. Explicit config file (optional, must exist when given)
    /// 4. Environment variables (`RESOLVER_*`, `__` between nested keys)
    pub fn load(config_path: Option<&str>) -> Result<Self, ResolverError> {
        let config_dir = ProjectDirs::from("", "", "device-resolver")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            // 1. Built-in defaults
            .set_default("log_level", default_log_level())
            .map_err(|e| ResolverError::Config(e.to_string()))?
            .set_default("embedding.timeout_ms", default_embedding_timeout() as i64)
            .map_err(|e| ResolverError::Config(e.to_string()))?
            .set_default("embedding_cache.max_size", 1_000_i64)
            .map_err(|e| ResolverError::Config(e.to_string()))?
            .set_default("query_cache.max_size", 500_i64)
            .map_err(|e| ResolverError::Config(e.to_string()))?
            .set_default("query_cache.ttl_secs", 300_i64)
            .map_err(|e| ResolverError::Config(e.to_string()))?
            .set_default("index_cache.ttl_secs", default_index_ttl() as i64)
            .map_err(|e| ResolverError::Config(e.to_string()))?
            .set_default(
                "areas.semantic_threshold",
                default_semantic_threshold() as f64,
            )
            .map_err(|e| ResolverError::Config(e.to_string()))?
            .set_default("search.default_limit", default_search_limit() as i64)
            .map_err(|e| ResolverError::Config(e.to_string()))?
            // 2. User config file
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        // 3. Explicit config file
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // 4. Environment, e.g. RESOLVER_QUERY_CACHE__TTL_SECS=60
        builder = builder.add_source(
            Environment::with_prefix("RESOLVER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ResolverError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ResolverError::Config(e.to_string()))?;

        settings.validate().map_err(ResolverError::Config)?;
        Ok(settings)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.embedding.validate()?;
        self.embedding_cache.validate("embedding_cache")?;
        self.query_cache.validate("query_cache")?;
        self.areas.validate()?;
        if self.index_cache.ttl_secs == 0 {
            return Err("index_cache.ttl_secs must be > 0".to_string());
        }
        if self.search.default_limit == 0 {
            return Err("search.default_limit must be > 0".to_string());
        }
        Ok(())
    }
}
