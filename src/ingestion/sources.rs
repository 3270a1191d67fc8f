//! Document sources: where raw document text comes from.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;

use crate::types::PipelineError;

/// Read-only access to raw documents by name.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Full text of the named document; [`PipelineError::SourceUnreadable`]
    /// when it cannot be produced.
    async fn read(&self, name: &str) -> Result<String, PipelineError>;

    async fn exists(&self, name: &str) -> Result<bool, PipelineError>;

    /// Document names, optionally restricted to a prefix, sorted.
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, PipelineError>;
}

/// Documents stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, PipelineError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || name.is_empty() {
            return Err(PipelineError::SourceUnreadable {
                name: name.to_string(),
                reason: "name must be a plain relative path".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentSource for DirSource {
    async fn read(&self, name: &str) -> Result<String, PipelineError> {
        let path = self.resolve(name)?;
        fs::read_to_string(&path)
            .await
            .map_err(|err| PipelineError::SourceUnreadable {
                name: name.to_string(),
                reason: err.to_string(),
            })
    }

    async fn exists(&self, name: &str) -> Result<bool, PipelineError> {
        let path = self.resolve(name)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, PipelineError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if prefix.is_none_or(|p| name.starts_with(p)) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Map-backed source for tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: RwLock<HashMap<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, name: impl Into<String>, text: impl Into<String>) {
        self.documents
            .write()
            .await
            .insert(name.into(), text.into());
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn read(&self, name: &str) -> Result<String, PipelineError> {
        self.documents.read().await.get(name).cloned().ok_or_else(|| {
            PipelineError::SourceUnreadable {
                name: name.to_string(),
                reason: "no such document".to_string(),
            }
        })
    }

    async fn exists(&self, name: &str) -> Result<bool, PipelineError> {
        Ok(self.documents.read().await.contains_key(name))
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, PipelineError> {
        let mut names: Vec<String> = self
            .documents
            .read()
            .await
            .keys()
            .filter(|name| prefix.is_none_or(|p| name.starts_with(p)))
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn dir_source_reads_and_lists() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(dir.path().join("b.txt"), "beta").unwrap();

        let source = DirSource::new(dir.path());
        assert_eq!(source.read("a.txt").await.unwrap(), "alpha");
        assert!(source.exists("b.txt").await.unwrap());
        assert!(!source.exists("c.txt").await.unwrap());
        assert_eq!(source.list(None).await.unwrap(), vec!["a.txt", "b.txt"]);
        assert_eq!(source.list(Some("b")).await.unwrap(), vec!["b.txt"]);
    }

    #[tokio::test]
    async fn dir_source_missing_file_is_source_unreadable() {
        let dir = tempdir().unwrap();
        let source = DirSource::new(dir.path());
        assert!(matches!(
            source.read("gone.txt").await,
            Err(PipelineError::SourceUnreadable { .. })
        ));
    }

    #[tokio::test]
    async fn dir_source_refuses_escaping_names() {
        let dir = tempdir().unwrap();
        let source = DirSource::new(dir.path());
        assert!(matches!(
            source.read("../secrets").await,
            Err(PipelineError::SourceUnreadable { .. })
        ));
        assert!(matches!(
            source.read("/etc/hosts").await,
            Err(PipelineError::SourceUnreadable { .. })
        ));
    }

    #[tokio::test]
    async fn memory_source_round_trips() {
        let source = MemorySource::new();
        source.insert("doc1", "text").await;
        assert_eq!(source.read("doc1").await.unwrap(), "text");
        assert_eq!(source.list(None).await.unwrap(), vec!["doc1"]);
    }
}
