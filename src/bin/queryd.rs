//! Query API server: `POST /query`, `GET /health`.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ragmill::api::{self, AppState};
use ragmill::config::{ApiSettings, EmbeddingSettings, GenerationSettings, IndexSettings, IngestSettings};
use ragmill::embeddings::HttpEmbeddingProvider;
use ragmill::generation::HttpGenerator;
use ragmill::query::QueryEngine;
use ragmill::stores::{FileTextStore, RemoteVectorIndex, VectorIndex};
use ragmill::types::PipelineError;

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let embedding = EmbeddingSettings::from_env()?;
    let index_settings = IndexSettings::from_env()?;
    let generation = GenerationSettings::from_env()?;
    let ingest = IngestSettings::from_env()?;
    let api_settings = ApiSettings::from_env()?;

    let embedder = Arc::new(HttpEmbeddingProvider::new(&embedding)?);
    let index = Arc::new(RemoteVectorIndex::new(&index_settings)?);
    let text_store = Arc::new(FileTextStore::new(&ingest.text_store_root));
    let generator = Arc::new(HttpGenerator::new(&generation)?);

    let index_id = index.ensure_index().await?;
    tracing::info!(index_id = %index_id, "vector index ready");

    let engine = Arc::new(QueryEngine::new(embedder, index, text_store, generator));
    let listener = TcpListener::bind((api_settings.host.as_str(), api_settings.port)).await?;
    api::serve(listener, AppState { engine }).await
}
