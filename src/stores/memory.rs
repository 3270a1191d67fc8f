//! In-memory store backends for tests and single-node deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{IndexEntry, SearchHit, TextStore, VectorIndex};
use crate::types::PipelineError;

/// Cosine distance (1 - cosine similarity) between equal-length vectors.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 1.0;
    }
    1.0 - dot / denom
}

/// Map-backed text store.
#[derive(Debug, Default)]
pub struct MemoryTextStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryTextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Drops a record. Exists so tests can manufacture the degraded
    /// index-without-text state; the ingestion path never deletes.
    pub async fn remove(&self, chunk_id: &str) -> bool {
        self.records.write().await.remove(chunk_id).is_some()
    }
}

#[async_trait]
impl TextStore for MemoryTextStore {
    async fn put(&self, chunk_id: &str, text: &str) -> Result<(), PipelineError> {
        self.records
            .write()
            .await
            .insert(chunk_id.to_string(), text.to_string());
        Ok(())
    }

    async fn get(&self, chunk_id: &str) -> Result<String, PipelineError> {
        self.records
            .read()
            .await
            .get(chunk_id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(chunk_id.to_string()))
    }
}

/// Brute-force cosine index over a map of vectors.
///
/// `ensure_index` flips the index into existence; searching or upserting
/// before that fails with [`PipelineError::IndexUnavailable`], matching the
/// behavior of a remote index that has not been deployed.
#[derive(Debug)]
pub struct MemoryVectorIndex {
    dimension: usize,
    entries: RwLock<Option<HashMap<String, Vec<f32>>>>,
}

impl MemoryVectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(None),
        }
    }

    pub async fn count(&self) -> usize {
        self.entries
            .read()
            .await
            .as_ref()
            .map_or(0, |entries| entries.len())
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), PipelineError> {
        if vector.len() != self.dimension {
            return Err(PipelineError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidInput(
                "embedding contains a non-finite value".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn ensure_index(&self) -> Result<String, PipelineError> {
        let mut guard = self.entries.write().await;
        if guard.is_none() {
            *guard = Some(HashMap::new());
        }
        Ok("memory".to_string())
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), PipelineError> {
        for entry in &entries {
            self.check_dimension(&entry.embedding)?;
        }
        let mut guard = self.entries.write().await;
        let map = guard
            .as_mut()
            .ok_or_else(|| PipelineError::IndexUnavailable("index has not been created".into()))?;
        for entry in entries {
            map.insert(entry.chunk_id, entry.embedding);
        }
        Ok(())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, PipelineError> {
        self.check_dimension(query)?;
        let guard = self.entries.read().await;
        let map = guard
            .as_ref()
            .ok_or_else(|| PipelineError::IndexUnavailable("index has not been created".into()))?;

        let mut hits: Vec<SearchHit> = map
            .iter()
            .map(|(chunk_id, embedding)| SearchHit {
                chunk_id: chunk_id.clone(),
                distance: cosine_distance(query, embedding),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
