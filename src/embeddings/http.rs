//! reqwest-backed embedding provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{EmbeddingProvider, check_batch, ensure_embeddable};
use crate::config::EmbeddingSettings;
use crate::types::PipelineError;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Talks to an embedding backend over JSON.
///
/// Request: `POST {endpoint}` with `{"model": ..., "texts": [...]}`.
/// Response: `{"embeddings": [[f32; D], ...]}`, one vector per input in
/// input order. Timeouts and transport failures map to
/// [`PipelineError::EmbeddingBackend`] and are retried via event redelivery.
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: Url,
    model: String,
    dimension: usize,
}

impl HttpEmbeddingProvider {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| PipelineError::EmbeddingBackend(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            dimension: settings.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        ensure_embeddable(texts)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            texts,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| PipelineError::EmbeddingBackend(err.to_string()))?
            .error_for_status()
            .map_err(|err| PipelineError::EmbeddingBackend(err.to_string()))?;

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::EmbeddingBackend(err.to_string()))?;

        check_batch(&body.embeddings, texts.len(), self.dimension)?;
        Ok(body.embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
