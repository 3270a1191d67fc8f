//! The query coordinator: embed, search, resolve, ground, generate.

pub mod prompt;

use std::sync::Arc;

use serde::Serialize;

use crate::embeddings::EmbeddingProvider;
use crate::generation::Generator;
use crate::stores::{TextStore, VectorIndex};
use crate::types::PipelineError;

/// Neighbors retrieved per query unless the caller asks otherwise.
pub const DEFAULT_TOP_K: usize = 5;

/// A grounded answer plus the context it was grounded in, distance order.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub answer: String,
    pub context: Vec<String>,
}

/// Read-only coordinator over the embedder, index, text store, and
/// generator. Stateless; one query never blocks another.
pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    text_store: Arc<dyn TextStore>,
    generator: Arc<dyn Generator>,
}

impl QueryEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        text_store: Arc<dyn TextStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            embedder,
            index,
            text_store,
            generator,
        }
    }

    /// Answers a query from the `k` nearest indexed chunks.
    ///
    /// An index hit whose text record is missing does not abort the query;
    /// its context slot is filled with a placeholder instead.
    pub async fn answer(&self, query: &str, k: usize) -> Result<QueryOutcome, PipelineError> {
        let batch = [query.to_string()];
        let mut embeddings = self.embedder.embed(&batch).await?;
        let query_embedding = embeddings.pop().ok_or_else(|| {
            PipelineError::EmbeddingBackend("backend returned no embedding for the query".into())
        })?;

        let hits = self.index.search(&query_embedding, k).await?;
        tracing::debug!(query_len = query.len(), hits = hits.len(), "index searched");

        let mut context = Vec::with_capacity(hits.len());
        for hit in &hits {
            match self.text_store.get(&hit.chunk_id).await {
                Ok(text) => context.push(text),
                Err(PipelineError::NotFound(_)) => {
                    tracing::warn!(chunk_id = %hit.chunk_id, "index hit has no text record");
                    context.push(missing_context_placeholder(&hit.chunk_id));
                }
                Err(err) => return Err(err),
            }
        }

        let prompt = prompt::grounding_prompt(query, &context);
        let answer = self.generator.generate(&prompt).await?;
        Ok(QueryOutcome { answer, context })
    }
}

/// Sentinel substituted for a hit whose text record is missing.
pub fn missing_context_placeholder(chunk_id: &str) -> String {
    format!("(context unavailable for chunk {chunk_id})")
}
