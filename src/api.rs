//! HTTP façade for the query path.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

use crate::query::{DEFAULT_TOP_K, QueryEngine};
use crate::types::PipelineError;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_num_results")]
    pub num_results: usize,
}

fn default_num_results() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub context: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(query_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Response {
    match state
        .engine
        .answer(&request.query, request.num_results)
        .await
    {
        Ok(outcome) => Json(QueryResponse {
            answer: outcome.answer,
            context: outcome.context,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": err.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Serves the router on an already-bound listener until the task is aborted.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), PipelineError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "query API listening");
    }
    axum::serve(listener, router(state))
        .await
        .map_err(|err| PipelineError::Io(err.to_string()))
}
