//! Embedding provider trait and types.
//!
//! The model itself is external; this crate only defines the seam it plugs
//! into and the value type that flows through the index.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::similarity::cosine_similarity;

/// Vector embedding.
///
/// Immutable once built: the values sit behind an `Arc<[f32]>`, so clones are
/// cheap and a new vector always means a new `Embedding`.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    values: Arc<[f32]>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Cosine similarity in [-1, 1].
    ///
    /// # Panics
    /// Panics when the dimensions differ.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        cosine_similarity(&self.values, &other.values)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    pub name: String,
    /// Embedding dimension, fixed for the lifetime of the process
    pub dimension: usize,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
        }
    }
}

/// Trait for embedding providers.
///
/// Implementations must be thread-safe (Send + Sync) for concurrent use and
/// must return vectors of `info().dimension` length.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
