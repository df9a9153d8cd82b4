//! Embedding vectors: the embedder seam, similarity, and the upsert service
//!
//! Uses a trait-based backend (`Embedder`) so production code can call a
//! remote or local model while tests use deterministic mock embedders.

mod service;

pub use service::{EmbeddingReport, EmbeddingService, SkippedEmbedding};

use crate::storage::StorageError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the embedding upsert path
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// A vector does not have the configured length. Nothing is written.
    #[error("expected {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Different numbers of ids and vectors. Nothing is written.
    #[error("{ids} node ids but {vectors} vectors")]
    LengthMismatch { ids: usize, vectors: usize },

    /// The embedding model failed or returned an unusable result
    #[error("embedding model error: {0}")]
    Model(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Trait for embedding text into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per text, in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Cosine similarity of two vectors.
///
/// Entries past the end of the shorter vector count as zero. Returns 0.0
/// when either vector has zero norm, so a missing embedding passed as an
/// empty slice scores 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
