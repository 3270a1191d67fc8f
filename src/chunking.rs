//! Deterministic fixed-window chunking.
//!
//! Windows are measured in characters, never bytes, so a window boundary can
//! never split a multi-byte code point. Identical `(text, size, overlap)`
//! always yields the identical sequence of windows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// A contiguous span of a document: the unit of embedding and retrieval.
///
/// Only derived fields are persisted: `{chunk_id, embedding}` in the vector
/// index and `{chunk_id, text}` in the text store. The rest travels with the
/// chunk through ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub source_id: String,
    pub sequence_index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: HashMap<String, String>,
}

/// Builds the globally unique identifier for a chunk.
///
/// Ids are derived from `(source_id, sequence_index)`: re-ingesting a
/// document maps onto the same ids, and two documents can never collide on a
/// shared sequence index.
pub fn chunk_id(source_id: &str, sequence_index: usize) -> String {
    format!("{source_id}#{sequence_index}")
}

/// Splits text into overlapping character windows.
///
/// Consecutive windows advance by `size - overlap` characters; the final
/// window may be shorter than `size` and ends exactly at the end of input.
#[derive(Debug, Clone, Copy)]
pub struct WindowChunker {
    size: usize,
    overlap: usize,
}

impl WindowChunker {
    /// Fails with [`PipelineError::InvalidConfig`] unless
    /// `0 <= overlap < size` and `size > 0`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, PipelineError> {
        if size == 0 {
            return Err(PipelineError::InvalidConfig(
                "chunk size must be positive".into(),
            ));
        }
        if overlap >= size {
            return Err(PipelineError::InvalidConfig(format!(
                "overlap {overlap} must be smaller than chunk size {size}"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Splits `text` into windows. Empty input yields no windows.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character boundary, including the end.
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        let char_count = boundaries.len() - 1;

        let stride = self.size - self.overlap;
        let mut windows = Vec::with_capacity(char_count.div_ceil(stride));
        let mut start = 0usize;
        loop {
            let end = usize::min(start + self.size, char_count);
            windows.push(text[boundaries[start]..boundaries[end]].to_string());
            if end == char_count {
                break;
            }
            start += stride;
        }
        windows
    }
}
