//! Error types for the device resolver.

use thiserror::Error;

/// Unified error type for resolver setup and record handling.
///
/// Lookup and search operations never return this: a miss is `None` or an
/// empty result list.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
