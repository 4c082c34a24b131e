//! Embedding error types.

use thiserror::Error;

/// Errors an embedding provider can report.
///
/// These never escape the resolver: [`crate::CachedEmbedder`] turns each of
/// them into [`crate::EmbeddingLookup::Unavailable`].
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Provider-side failure (model error, remote call failed, ...)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider did not answer in time
    #[error("Embedding timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
