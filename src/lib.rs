//! Retrieval-augmented generation pipeline.
//!
//! Documents are chunked, embedded, and indexed for similarity search;
//! queries retrieve the nearest chunks and feed them to a language model for
//! a grounded answer. The vector index stores only identifiers and vectors;
//! the side text store returns the exact original text for an identifier.
//!
//! ```text
//! notification ──► ingestion::IngestionPipeline ─┬─► chunking::WindowChunker
//!                                                ├─► embeddings::EmbeddingProvider
//!                                                └─► stores::{TextStore, VectorIndex}
//!
//! POST /query ──► query::QueryEngine ─┬─► embeddings::EmbeddingProvider
//!                                     ├─► stores::VectorIndex ──► stores::TextStore
//!                                     └─► generation::Generator ──► grounded answer
//! ```
//!
//! Every collaborator sits behind an async trait with at least one HTTP and
//! one in-process implementation, so the whole pipeline runs hermetically in
//! tests and against real backends in production with the same coordinators.

pub mod api;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod generation;
pub mod ingestion;
pub mod query;
pub mod stores;
pub mod types;

pub use types::PipelineError;
