//! Wire-level tests for the HTTP backends against a mock server.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use ragmill::config::{EmbeddingSettings, GenerationSettings, IndexSettings};
use ragmill::embeddings::{EmbeddingProvider, HttpEmbeddingProvider};
use ragmill::generation::{Generator, HttpGenerator};
use ragmill::stores::{IndexEntry, RemoteVectorIndex, VectorIndex};
use ragmill::types::PipelineError;

fn embedding_settings(server: &MockServer, dimension: usize) -> EmbeddingSettings {
    EmbeddingSettings {
        endpoint: Url::parse(&server.url("/embed")).unwrap(),
        model: "test-embedder".to_string(),
        dimension,
        timeout: Duration::from_secs(5),
    }
}

fn index_settings(server: &MockServer, index_id: Option<&str>) -> IndexSettings {
    IndexSettings {
        endpoint: Url::parse(&server.base_url()).unwrap(),
        index_id: index_id.map(str::to_string),
        display_name: "rag-vector-index".to_string(),
        dimension: 3,
        timeout: Duration::from_secs(5),
    }
}

fn generation_settings(server: &MockServer) -> GenerationSettings {
    GenerationSettings {
        endpoint: Url::parse(&server.url("/generate")).unwrap(),
        model: "test-llm".to_string(),
        temperature: 0.7,
        max_output_tokens: 1024,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn embedder_round_trips_a_batch_in_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/embed").json_body(json!({
                "model": "test-embedder",
                "texts": ["first", "second"],
            }));
            then.status(200).json_body(json!({
                "embeddings": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            }));
        })
        .await;

    let provider = HttpEmbeddingProvider::new(&embedding_settings(&server, 3)).unwrap();
    let vectors = provider
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
}

#[tokio::test]
async fn embedder_maps_server_errors_to_a_retryable_kind() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(500).body("backend exploded");
        })
        .await;

    let provider = HttpEmbeddingProvider::new(&embedding_settings(&server, 3)).unwrap();
    let err = provider.embed(&["text".to_string()]).await.unwrap_err();
    assert!(matches!(err, PipelineError::EmbeddingBackend(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn embedder_rejects_wrong_dimension_responses() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200)
                .json_body(json!({ "embeddings": [[1.0, 0.0]] }));
        })
        .await;

    let provider = HttpEmbeddingProvider::new(&embedding_settings(&server, 3)).unwrap();
    let err = provider.embed(&["text".to_string()]).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::DimensionMismatch {
            expected: 3,
            actual: 2
        }
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn embedder_rejects_empty_entries_before_dispatch() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/embed");
            then.status(200).json_body(json!({ "embeddings": [] }));
        })
        .await;

    let provider = HttpEmbeddingProvider::new(&embedding_settings(&server, 3)).unwrap();
    let err = provider
        .embed(&["fine".to_string(), String::new()])
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidInput(_)));
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn ensure_index_reuses_a_reachable_configured_index() {
    let server = MockServer::start_async().await;
    let probe = server
        .mock_async(|when, then| {
            when.method(GET).path("/indexes/idx-configured");
            then.status(200).json_body(json!({ "index_id": "idx-configured" }));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/indexes");
            then.status(200).json_body(json!({ "index_id": "idx-new" }));
        })
        .await;

    let index = RemoteVectorIndex::new(&index_settings(&server, Some("idx-configured"))).unwrap();
    assert_eq!(index.ensure_index().await.unwrap(), "idx-configured");
    // Second call uses the cached id without another probe.
    assert_eq!(index.ensure_index().await.unwrap(), "idx-configured");

    assert_eq!(probe.hits_async().await, 1);
    assert_eq!(create.hits_async().await, 0);
}

#[tokio::test]
async fn ensure_index_creates_when_nothing_is_configured() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/indexes").json_body(json!({
                "display_name": "rag-vector-index",
                "dimensions": 3,
                "distance_measure": "COSINE_DISTANCE",
            }));
            then.status(200).json_body(json!({ "index_id": "idx-new" }));
        })
        .await;

    let index = RemoteVectorIndex::new(&index_settings(&server, None)).unwrap();
    assert_eq!(index.ensure_index().await.unwrap(), "idx-new");
    create.assert_async().await;
}

#[tokio::test]
async fn ensure_index_replaces_an_unreachable_configured_index() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/indexes/idx-gone");
            then.status(404);
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/indexes");
            then.status(200).json_body(json!({ "index_id": "idx-fresh" }));
        })
        .await;

    let index = RemoteVectorIndex::new(&index_settings(&server, Some("idx-gone"))).unwrap();
    assert_eq!(index.ensure_index().await.unwrap(), "idx-fresh");
    create.assert_async().await;
}

#[tokio::test]
async fn upsert_sends_datapoints_in_the_expected_shape() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/indexes");
            then.status(200).json_body(json!({ "index_id": "idx-1" }));
        })
        .await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(POST).path("/indexes/idx-1/upsert").json_body(json!({
                "datapoints": [
                    { "datapoint_id": "doc1#0", "feature_vector": [1.0, 0.0, 0.0] },
                    { "datapoint_id": "doc1#1", "feature_vector": [0.0, 1.0, 0.0] },
                ],
            }));
            then.status(200).json_body(json!({}));
        })
        .await;

    let index = RemoteVectorIndex::new(&index_settings(&server, None)).unwrap();
    index.ensure_index().await.unwrap();
    index
        .upsert(vec![
            IndexEntry {
                chunk_id: "doc1#0".to_string(),
                embedding: vec![1.0, 0.0, 0.0],
            },
            IndexEntry {
                chunk_id: "doc1#1".to_string(),
                embedding: vec![0.0, 1.0, 0.0],
            },
        ])
        .await
        .unwrap();

    upsert.assert_async().await;
}

#[tokio::test]
async fn search_sorts_hits_and_respects_k() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/indexes");
            then.status(200).json_body(json!({ "index_id": "idx-1" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/indexes/idx-1/search");
            // Server answers out of order; the client re-establishes the
            // ordering contract.
            then.status(200).json_body(json!({
                "neighbors": [
                    { "id": "far", "distance": 0.9 },
                    { "id": "near", "distance": 0.1 },
                    { "id": "middle", "distance": 0.5 },
                ],
            }));
        })
        .await;

    let index = RemoteVectorIndex::new(&index_settings(&server, None)).unwrap();
    index.ensure_index().await.unwrap();
    let hits = index.search(&[1.0, 0.0, 0.0], 2).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk_id, "near");
    assert_eq!(hits[1].chunk_id, "middle");
}

#[tokio::test]
async fn search_before_ensure_is_unavailable() {
    let server = MockServer::start_async().await;
    let index = RemoteVectorIndex::new(&index_settings(&server, None)).unwrap();
    let err = index.search(&[1.0, 0.0, 0.0], 5).await.unwrap_err();
    assert!(matches!(err, PipelineError::IndexUnavailable(_)));
}

#[tokio::test]
async fn search_rejects_wrong_query_dimension_locally() {
    let server = MockServer::start_async().await;
    let index = RemoteVectorIndex::new(&index_settings(&server, None)).unwrap();
    let err = index.search(&[1.0], 5).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::DimensionMismatch {
            expected: 3,
            actual: 1
        }
    ));
}

#[tokio::test]
async fn generator_forwards_prompt_and_safety_settings() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/generate")
                .body_includes("Question: who won?")
                .body_includes("HARM_CATEGORY_DANGEROUS_CONTENT")
                .body_includes("BLOCK_MEDIUM_AND_ABOVE");
            then.status(200)
                .json_body(json!({ "text": "the home side won" }));
        })
        .await;

    let generator = HttpGenerator::new(&generation_settings(&server)).unwrap();
    let answer = generator
        .generate("Context:\n...\n\nQuestion: who won?\n\nAnswer:")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(answer, "the home side won");
}

#[tokio::test]
async fn generator_maps_failures_to_a_retryable_kind() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/generate");
            then.status(503);
        })
        .await;

    let generator = HttpGenerator::new(&generation_settings(&server)).unwrap();
    let err = generator.generate("prompt").await.unwrap_err();
    assert!(matches!(err, PipelineError::GenerationBackend(_)));
    assert!(err.is_retryable());
}
