//! Deterministic embedding provider for tests and offline runs.

use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;

use super::{EmbeddingProvider, ensure_embeddable};
use crate::types::PipelineError;

/// Bag-of-words embeddings: each word adds weight to a hash-selected
/// component and the result is normalized to unit length.
///
/// Texts sharing words land near each other under cosine distance, which is
/// enough for retrieval tests to rank overlapping content above unrelated
/// content without a real backend.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let slot = (hasher.finish() as usize) % self.dimension;
            vector[slot] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            // Whitespace-only text hashes nowhere; pin it to a fixed axis.
            vector[0] = 1.0;
        } else {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        ensure_embeddable(texts)?;
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn preserves_order_and_count() {
        let provider = MockEmbeddingProvider::new(16);
        let texts = vec![
            "alpha beta".to_string(),
            "gamma".to_string(),
            "alpha beta".to_string(),
        ];
        let vectors = provider.embed(&texts).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], vectors[2]);
        assert!(vectors.iter().all(|v| v.len() == 16));
    }

    #[tokio::test]
    async fn shared_words_score_closer_than_disjoint_words() {
        let provider = MockEmbeddingProvider::new(64);
        let texts = vec![
            "the referee blew the whistle".to_string(),
            "the referee raised a flag".to_string(),
            "quantum chromodynamics lattice".to_string(),
        ];
        let vectors = provider.embed(&texts).await.unwrap();
        assert!(cosine(&vectors[0], &vectors[1]) > cosine(&vectors[0], &vectors[2]));
    }

    #[tokio::test]
    async fn rejects_empty_entries() {
        let provider = MockEmbeddingProvider::new(8);
        let result = provider.embed(&[String::new()]).await;
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let provider = MockEmbeddingProvider::new(32);
        let vectors = provider
            .embed(&["a few words here".to_string()])
            .await
            .unwrap();
        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
