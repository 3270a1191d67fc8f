//! Filesystem-backed text store: one file per chunk id.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::TextStore;
use crate::types::PipelineError;

/// Durable text store rooted at a directory.
///
/// Chunk ids are escaped into file names injectively, so distinct ids can
/// never collide on disk and the same id always maps to the same file across
/// restarts. Writes are plain file overwrites, which makes `put` an
/// idempotent last-write-wins upsert.
#[derive(Debug, Clone)]
pub struct FileTextStore {
    root: PathBuf,
}

impl FileTextStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, chunk_id: &str) -> PathBuf {
        self.root.join(format!("{}.txt", escape_id(chunk_id)))
    }
}

/// Injective escape: alphanumerics, `-` and `.` pass through; every other
/// byte becomes `_` plus two hex digits. `_` itself is escaped, so no two
/// ids share a file name.
fn escape_id(chunk_id: &str) -> String {
    let mut escaped = String::with_capacity(chunk_id.len());
    for byte in chunk_id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' => {
                escaped.push(byte as char);
            }
            _ => {
                escaped.push('_');
                escaped.push_str(&format!("{byte:02x}"));
            }
        }
    }
    escaped
}

#[async_trait]
impl TextStore for FileTextStore {
    async fn put(&self, chunk_id: &str, text: &str) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))?;
        fs::write(self.record_path(chunk_id), text)
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))?;
        Ok(())
    }

    async fn get(&self, chunk_id: &str) -> Result<String, PipelineError> {
        match fs::read_to_string(self.record_path(chunk_id)).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(PipelineError::NotFound(chunk_id.to_string()))
            }
            Err(err) => Err(PipelineError::Storage(err.to_string())),
        }
    }
}
