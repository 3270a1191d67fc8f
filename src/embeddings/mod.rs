//! Embedding providers: map text batches to fixed-dimension vectors.
//!
//! All providers preserve input order and count, and validate their inputs
//! before any request leaves the process: an empty entry fails the batch with
//! [`PipelineError::InvalidInput`] instead of surfacing as an opaque backend
//! error. A single failed request fails the whole batch; callers decide
//! whether to retry or split it.

pub mod http;
pub mod mock;

pub use http::HttpEmbeddingProvider;
pub use mock::MockEmbeddingProvider;

use async_trait::async_trait;

use crate::types::PipelineError;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every entry of `texts`, preserving order and count.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;

    /// Fixed output dimension of every vector this provider returns.
    fn dimension(&self) -> usize;
}

/// Rejects entries the backends cannot embed, before dispatch.
pub(crate) fn ensure_embeddable(texts: &[String]) -> Result<(), PipelineError> {
    if let Some(position) = texts.iter().position(|t| t.is_empty()) {
        return Err(PipelineError::InvalidInput(format!(
            "batch entry {position} is an empty string"
        )));
    }
    Ok(())
}

/// Checks a backend response against the request batch and dimension.
pub(crate) fn check_batch(
    vectors: &[Vec<f32>],
    expected_count: usize,
    dimension: usize,
) -> Result<(), PipelineError> {
    if vectors.len() != expected_count {
        return Err(PipelineError::EmbeddingBackend(format!(
            "backend returned {} embeddings for {expected_count} inputs",
            vectors.len()
        )));
    }
    for vector in vectors {
        if vector.len() != dimension {
            return Err(PipelineError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
    }
    Ok(())
}
