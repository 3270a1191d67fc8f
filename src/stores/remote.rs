//! HTTP client for a remote vector-index service.
//!
//! Routes, relative to the configured endpoint:
//!
//! - `GET  indexes/{id}` — probe that an index exists
//! - `POST indexes` — create one: `{"display_name", "dimensions",
//!   "distance_measure"}` → `{"index_id"}`
//! - `POST indexes/{id}/upsert` — `{"datapoints": [{"datapoint_id",
//!   "feature_vector"}]}`
//! - `POST indexes/{id}/search` — `{"query_embedding", "num_neighbors"}` →
//!   `{"neighbors": [{"id", "distance"}]}`
//!
//! The resolved index id is cached after `ensure_index`, so a configured and
//! reachable index is returned unchanged on every later call.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use super::{IndexEntry, SearchHit, VectorIndex};
use crate::config::IndexSettings;
use crate::types::PipelineError;

const DISTANCE_MEASURE: &str = "COSINE_DISTANCE";

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    display_name: &'a str,
    dimensions: usize,
    distance_measure: &'a str,
}

#[derive(Deserialize)]
struct CreateIndexResponse {
    index_id: String,
}

#[derive(Serialize)]
struct Datapoint<'a> {
    datapoint_id: &'a str,
    feature_vector: &'a [f32],
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    datapoints: Vec<Datapoint<'a>>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query_embedding: &'a [f32],
    num_neighbors: usize,
}

#[derive(Deserialize)]
struct Neighbor {
    id: String,
    distance: f32,
}

#[derive(Deserialize)]
struct SearchResponse {
    neighbors: Vec<Neighbor>,
}

pub struct RemoteVectorIndex {
    client: Client,
    endpoint: Url,
    configured_id: Option<String>,
    active_id: RwLock<Option<String>>,
    display_name: String,
    dimension: usize,
}

impl RemoteVectorIndex {
    pub fn new(settings: &IndexSettings) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| PipelineError::IndexUnavailable(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            configured_id: settings.index_id.clone(),
            active_id: RwLock::new(None),
            display_name: settings.display_name.clone(),
            dimension: settings.dimension,
        })
    }

    fn route(&self, segments: &[&str]) -> Result<Url, PipelineError> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                PipelineError::InvalidConfig(format!(
                    "index endpoint {} cannot carry a path",
                    self.endpoint
                ))
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn active_id(&self) -> Result<String, PipelineError> {
        self.active_id.read().await.clone().ok_or_else(|| {
            PipelineError::IndexUnavailable("index has not been created".to_string())
        })
    }

    async fn index_exists(&self, index_id: &str) -> Result<bool, PipelineError> {
        let response = self
            .client
            .get(self.route(&["indexes", index_id])?)
            .send()
            .await
            .map_err(|err| PipelineError::IndexUnavailable(err.to_string()))?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(PipelineError::IndexUnavailable(format!(
                "probe for index {index_id} returned {status}"
            ))),
        }
    }

    async fn create_index(&self) -> Result<String, PipelineError> {
        let request = CreateIndexRequest {
            display_name: &self.display_name,
            dimensions: self.dimension,
            distance_measure: DISTANCE_MEASURE,
        };
        let response = self
            .client
            .post(self.route(&["indexes"])?)
            .json(&request)
            .send()
            .await
            .map_err(|err| PipelineError::IndexUnavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| PipelineError::IndexUnavailable(err.to_string()))?;
        let body: CreateIndexResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::IndexUnavailable(err.to_string()))?;
        Ok(body.index_id)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), PipelineError> {
        if vector.len() != self.dimension {
            return Err(PipelineError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for RemoteVectorIndex {
    async fn ensure_index(&self) -> Result<String, PipelineError> {
        if let Some(id) = self.active_id.read().await.clone() {
            return Ok(id);
        }

        let mut resolved = None;
        if let Some(id) = &self.configured_id {
            if self.index_exists(id).await? {
                resolved = Some(id.clone());
            }
        }
        let resolved = match resolved {
            Some(id) => id,
            None => {
                let id = self.create_index().await?;
                tracing::info!(index_id = %id, "created vector index");
                id
            }
        };
        *self.active_id.write().await = Some(resolved.clone());
        Ok(resolved)
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), PipelineError> {
        for entry in &entries {
            self.check_dimension(&entry.embedding)?;
        }
        if entries.is_empty() {
            return Ok(());
        }
        let index_id = self.active_id().await?;
        let request = UpsertRequest {
            datapoints: entries
                .iter()
                .map(|entry| Datapoint {
                    datapoint_id: &entry.chunk_id,
                    feature_vector: &entry.embedding,
                })
                .collect(),
        };
        self.client
            .post(self.route(&["indexes", &index_id, "upsert"])?)
            .json(&request)
            .send()
            .await
            .map_err(|err| PipelineError::IndexUnavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| PipelineError::IndexUnavailable(err.to_string()))?;
        Ok(())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, PipelineError> {
        self.check_dimension(query)?;
        let index_id = self.active_id().await?;
        let request = SearchRequest {
            query_embedding: query,
            num_neighbors: k,
        };
        let response = self
            .client
            .post(self.route(&["indexes", &index_id, "search"])?)
            .json(&request)
            .send()
            .await
            .map_err(|err| PipelineError::IndexUnavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| PipelineError::IndexUnavailable(err.to_string()))?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::IndexUnavailable(err.to_string()))?;

        let mut hits: Vec<SearchHit> = body
            .neighbors
            .into_iter()
            .map(|neighbor| SearchHit {
                chunk_id: neighbor.id,
                distance: neighbor.distance,
            })
            .collect();
        // The ordering contract is ours, whatever the server sent.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
