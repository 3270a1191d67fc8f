//! Notification-driven ingestion worker.
//!
//! Reads documents from `DOCUMENT_ROOT`, chunks and embeds them, and writes
//! text records and index entries. Documents already present under the root
//! are enqueued at startup; a deployment with an external message bus
//! bridges its subscription into the channel instead.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use ragmill::chunking::WindowChunker;
use ragmill::config::{ChunkingSettings, EmbeddingSettings, IndexSettings, IngestSettings};
use ragmill::embeddings::HttpEmbeddingProvider;
use ragmill::ingestion::{
    DirSource, DocumentReady, DocumentSource, IngestionPipeline, NotificationChannel,
};
use ragmill::stores::{FileTextStore, RemoteVectorIndex, VectorIndex};
use ragmill::types::PipelineError;

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let chunking = ChunkingSettings::from_env()?;
    let embedding = EmbeddingSettings::from_env()?;
    let index_settings = IndexSettings::from_env()?;
    let ingest = IngestSettings::from_env()?;

    let chunker = WindowChunker::new(chunking.size, chunking.overlap)?;
    let embedder = Arc::new(HttpEmbeddingProvider::new(&embedding)?);
    let index = Arc::new(RemoteVectorIndex::new(&index_settings)?);
    let text_store = Arc::new(FileTextStore::new(&ingest.text_store_root));
    let source = Arc::new(DirSource::new(&ingest.document_root));

    let index_id = index.ensure_index().await?;
    tracing::info!(index_id = %index_id, "vector index ready");

    let channel = NotificationChannel::new(ingest.max_attempts);
    for name in source.list(None).await? {
        channel.publish(DocumentReady {
            name,
            timestamp: None,
        });
    }
    tracing::info!(pending = channel.pending(), "seeded from document root");

    let pipeline = Arc::new(IngestionPipeline::new(
        source,
        embedder,
        text_store,
        index,
        chunker,
    ));
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let worker = tokio::spawn(pipeline.run(channel.clone(), shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    let _ = shutdown_tx.send(());
    let _ = worker.await;

    let dead = channel.dead_letters().len();
    if dead > 0 {
        tracing::warn!(count = dead, "dead-lettered deliveries left unprocessed");
    }
    Ok(())
}
