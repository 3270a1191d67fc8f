//! Environment-driven configuration.
//!
//! Every collaborator gets its own settings struct passed into its
//! constructor; nothing reads the environment after startup and there are no
//! process-wide client singletons. The binaries call `dotenvy::dotenv()`
//! before loading these.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::types::PipelineError;

fn require(name: &str) -> Result<String, PipelineError> {
    std::env::var(name)
        .map_err(|_| PipelineError::InvalidConfig(format!("missing environment variable {name}")))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_or<T>(name: &str, default: T) -> Result<T, PipelineError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|err| PipelineError::InvalidConfig(format!("{name}={raw}: {err}"))),
        None => Ok(default),
    }
}

fn require_url(name: &str) -> Result<Url, PipelineError> {
    let raw = require(name)?;
    Url::parse(&raw).map_err(|err| PipelineError::InvalidConfig(format!("{name}={raw}: {err}")))
}

/// Chunk window parameters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingSettings {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            size: 500,
            overlap: 50,
        }
    }
}

impl ChunkingSettings {
    /// Reads `CHUNK_SIZE` / `CHUNK_OVERLAP`, keeping the defaults above when
    /// unset.
    pub fn from_env() -> Result<Self, PipelineError> {
        let defaults = Self::default();
        Ok(Self {
            size: parse_or("CHUNK_SIZE", defaults.size)?,
            overlap: parse_or("CHUNK_OVERLAP", defaults.overlap)?,
        })
    }
}

/// Embedding backend endpoint and model.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub endpoint: Url,
    pub model: String,
    pub dimension: usize,
    pub timeout: Duration,
}

impl EmbeddingSettings {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            endpoint: require_url("EMBEDDING_ENDPOINT")?,
            model: require("EMBEDDING_MODEL")?,
            dimension: parse_or("EMBEDDING_DIMENSION", 768)?,
            timeout: backend_timeout()?,
        })
    }
}

/// Remote vector index endpoint and identity.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub endpoint: Url,
    /// Previously created index to reuse; a new one is created when unset or
    /// no longer reachable.
    pub index_id: Option<String>,
    pub display_name: String,
    pub dimension: usize,
    pub timeout: Duration,
}

impl IndexSettings {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            endpoint: require_url("VECTOR_INDEX_ENDPOINT")?,
            index_id: optional("VECTOR_SEARCH_INDEX_ID"),
            display_name: optional("VECTOR_INDEX_DISPLAY_NAME")
                .unwrap_or_else(|| "rag-vector-index".to_string()),
            dimension: parse_or("EMBEDDING_DIMENSION", 768)?,
            timeout: backend_timeout()?,
        })
    }
}

/// Generation backend endpoint and sampling parameters.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub endpoint: Url,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            endpoint: require_url("LLM_ENDPOINT")?,
            model: require("LLM_MODEL")?,
            temperature: parse_or("LLM_TEMPERATURE", 0.7)?,
            max_output_tokens: parse_or("LLM_MAX_OUTPUT_TOKENS", 1024)?,
            timeout: backend_timeout()?,
        })
    }
}

/// Ingestion worker roots and redelivery bound.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub document_root: PathBuf,
    pub text_store_root: PathBuf,
    /// Delivery attempts before an event is dead-lettered.
    pub max_attempts: u32,
}

impl IngestSettings {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            document_root: optional("DOCUMENT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/documents")),
            text_store_root: optional("TEXT_STORE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/text_store")),
            max_attempts: parse_or("INGEST_MAX_ATTEMPTS", 5)?,
        })
    }
}

/// Bind address for the query API.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

impl ApiSettings {
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            host: optional("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("API_PORT", 8000)?,
        })
    }
}

fn backend_timeout() -> Result<Duration, PipelineError> {
    Ok(Duration::from_secs(parse_or("BACKEND_TIMEOUT_SECS", 30u64)?))
}
