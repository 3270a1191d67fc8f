//! The ingestion coordinator: document-ready event in, indexed chunks out.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use super::notifications::{DocumentReady, NotificationChannel};
use super::sources::DocumentSource;
use crate::chunking::{Chunk, WindowChunker, chunk_id};
use crate::embeddings::EmbeddingProvider;
use crate::stores::{IndexEntry, TextStore, VectorIndex};
use crate::types::PipelineError;

/// A document as read for one ingestion run. Never persisted; only its
/// derived chunks are.
#[derive(Debug, Clone)]
pub struct Document {
    pub source_id: String,
    pub raw_text: String,
    pub ingested_at: DateTime<Utc>,
}

/// Summary of one successful ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub source_id: String,
    pub chunk_ids: Vec<String>,
}

impl IngestReport {
    pub fn chunks_written(&self) -> usize {
        self.chunk_ids.len()
    }
}

/// Drives a document through read → chunk → embed → persist.
///
/// The run either completes fully or writes nothing for that event:
/// embedding happens in one batch before any write, and text records land
/// before index entries so a searchable hit always has its payload by the
/// time it can be found. Re-running the same event converges to the same
/// state because every write is an upsert keyed by a deterministic chunk id.
pub struct IngestionPipeline {
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    text_store: Arc<dyn TextStore>,
    index: Arc<dyn VectorIndex>,
    chunker: WindowChunker,
}

impl IngestionPipeline {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        text_store: Arc<dyn TextStore>,
        index: Arc<dyn VectorIndex>,
        chunker: WindowChunker,
    ) -> Self {
        Self {
            source,
            embedder,
            text_store,
            index,
            chunker,
        }
    }

    /// Processes one document-ready event end to end.
    pub async fn ingest(&self, event: &DocumentReady) -> Result<IngestReport, PipelineError> {
        let source_id = event.name.as_str();
        tracing::info!(source_id, "ingesting document");

        let document = Document {
            source_id: source_id.to_string(),
            raw_text: self.source.read(source_id).await?,
            ingested_at: Utc::now(),
        };
        tracing::debug!(source_id, bytes = document.raw_text.len(), "document read");

        let windows = self.chunker.chunk(&document.raw_text);
        if windows.is_empty() {
            tracing::info!(source_id, "empty document, nothing to write");
            return Ok(IngestReport {
                source_id: document.source_id,
                chunk_ids: Vec::new(),
            });
        }
        tracing::debug!(source_id, chunks = windows.len(), "document chunked");

        let embeddings = self.embedder.embed(&windows).await?;
        tracing::debug!(source_id, "chunk batch embedded");

        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), document.source_id.clone());
        if let Some(timestamp) = &event.timestamp {
            metadata.insert("timestamp".to_string(), timestamp.to_string());
        }

        let chunks: Vec<Chunk> = windows
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(sequence_index, (text, embedding))| Chunk {
                chunk_id: chunk_id(source_id, sequence_index),
                source_id: document.source_id.clone(),
                sequence_index,
                text,
                embedding,
                metadata: metadata.clone(),
            })
            .collect();

        for chunk in &chunks {
            self.text_store.put(&chunk.chunk_id, &chunk.text).await?;
        }

        let mut chunk_ids = Vec::with_capacity(chunks.len());
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .map(|chunk| {
                chunk_ids.push(chunk.chunk_id.clone());
                IndexEntry {
                    chunk_id: chunk.chunk_id,
                    embedding: chunk.embedding,
                }
            })
            .collect();
        self.index.upsert(entries).await?;

        tracing::info!(source_id, chunks = chunk_ids.len(), "document indexed");
        Ok(IngestReport {
            source_id: document.source_id,
            chunk_ids,
        })
    }

    /// Consumes deliveries until shutdown, one spawned task per delivery.
    ///
    /// Success acknowledges; a retryable failure nacks for redelivery; a
    /// fatal failure dead-letters immediately. Deliveries for different
    /// documents proceed concurrently, and duplicate deliveries of the same
    /// document are harmless.
    pub async fn run(
        self: Arc<Self>,
        channel: NotificationChannel,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                delivery = channel.recv() => {
                    let Some(delivery) = delivery else { break };
                    let pipeline = Arc::clone(&self);
                    let channel = channel.clone();
                    tokio::spawn(async move {
                        match pipeline.ingest(&delivery.event).await {
                            Ok(report) => {
                                tracing::debug!(
                                    source_id = %report.source_id,
                                    chunks = report.chunks_written(),
                                    "delivery processed"
                                );
                                channel.ack(&delivery);
                            }
                            Err(err) if err.is_retryable() => {
                                tracing::warn!(
                                    source_id = %delivery.event.name,
                                    error = %err,
                                    "ingestion failed, requesting redelivery"
                                );
                                channel.nack(delivery);
                            }
                            Err(err) => {
                                tracing::error!(
                                    source_id = %delivery.event.name,
                                    error = %err,
                                    "ingestion failed fatally"
                                );
                                channel.reject(delivery);
                            }
                        }
                    });
                }
            }
        }
        tracing::info!("ingestion worker stopped");
    }
}
