//! Pluggable persistence: vector index and side text store.
//!
//! The two stores split responsibility deliberately: the vector index holds
//! only `{chunk_id, embedding}` (the searchable representation), while the
//! text store holds `{chunk_id, text}` (the retrievable payload). Every index
//! entry is expected to have a text record under the same id; a hit whose
//! text is missing is a defined degraded state handled on the query path,
//! not a crash.
//!
//! ```text
//!                  ┌──────────────────┐   ┌──────────────────┐
//!                  │ VectorIndex      │   │ TextStore        │
//!                  │ (async trait)    │   │ (async trait)    │
//!                  └───────┬──────────┘   └───────┬──────────┘
//!                          │                      │
//!              ┌───────────┼─────────┐       ┌────┴──────────┐
//!              ▼           ▼         │       ▼               ▼
//!       MemoryVector  RemoteVector   │  MemoryTextStore  FileTextStore
//!       Index         Index (HTTP)   │
//! ```
//!
//! All writes are idempotent upserts keyed by deterministic chunk ids, so
//! concurrent ingestion of the same document needs no extra coordination.

pub mod fs;
pub mod memory;
pub mod remote;

pub use fs::FileTextStore;
pub use memory::{MemoryTextStore, MemoryVectorIndex};
pub use remote::RemoteVectorIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// Identifier + vector pair, the only fields persisted in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk_id: String,
    pub embedding: Vec<f32>,
}

/// One nearest-neighbor hit; smaller distance is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub distance: f32,
}

/// Durable key→text mapping keyed by chunk id.
#[async_trait]
pub trait TextStore: Send + Sync {
    /// Idempotent upsert, last write wins.
    async fn put(&self, chunk_id: &str, text: &str) -> Result<(), PipelineError>;

    /// Fails with [`PipelineError::NotFound`] when no record exists.
    async fn get(&self, chunk_id: &str) -> Result<String, PipelineError>;
}

/// Durable key→vector mapping with cosine nearest-neighbor search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create-if-absent. Returns the index handle identifier, unchanged when
    /// an index is already configured and reachable.
    async fn ensure_index(&self) -> Result<String, PipelineError>;

    /// Idempotent per chunk id, last write wins. Fails with
    /// [`PipelineError::DimensionMismatch`] if any entry has the wrong
    /// dimension.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), PipelineError>;

    /// Up to `k` hits sorted ascending by cosine distance. Fails with
    /// [`PipelineError::IndexUnavailable`] before the index exists.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, PipelineError>;

    /// Configured embedding dimension.
    fn dimension(&self) -> usize;
}
