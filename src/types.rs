//! Shared error taxonomy for the pipeline.

use thiserror::Error;

/// Errors produced by pipeline components.
///
/// The taxonomy separates transient failures, which are worth redelivering
/// the triggering event for, from configuration bugs that no retry can fix;
/// see [`PipelineError::is_retryable`]. Coordinators branch on the variant,
/// never on message text.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Chunking parameters are unusable (zero size, overlap >= size).
    #[error("invalid chunking config: {0}")]
    InvalidConfig(String),

    /// The document source could not produce the requested text.
    #[error("source '{name}' unreadable: {reason}")]
    SourceUnreadable { name: String, reason: String },

    /// The embedding backend failed or returned a malformed batch.
    #[error("embedding backend error: {0}")]
    EmbeddingBackend(String),

    /// Input rejected before dispatch to a backend.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The vector index is unreachable or has not been created yet.
    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),

    /// A vector's length disagrees with the configured dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// No record exists for the given chunk id.
    #[error("not found: {0}")]
    NotFound(String),

    /// The generation backend failed to produce an answer.
    #[error("generation backend error: {0}")]
    GenerationBackend(String),

    /// A store rejected a read or write.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem or socket failure outside a specific backend.
    #[error("i/o error: {0}")]
    Io(String),
}

impl PipelineError {
    /// Whether redelivering the triggering event can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::SourceUnreadable { .. }
                | PipelineError::EmbeddingBackend(_)
                | PipelineError::IndexUnavailable(_)
                | PipelineError::GenerationBackend(_)
                | PipelineError::Storage(_)
                | PipelineError::Io(_)
        )
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds_are_retryable() {
        assert!(PipelineError::EmbeddingBackend("timeout".into()).is_retryable());
        assert!(PipelineError::IndexUnavailable("connect refused".into()).is_retryable());
        assert!(
            PipelineError::SourceUnreadable {
                name: "doc".into(),
                reason: "gone".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn config_bugs_are_fatal() {
        assert!(!PipelineError::InvalidConfig("overlap".into()).is_retryable());
        assert!(
            !PipelineError::DimensionMismatch {
                expected: 768,
                actual: 3
            }
            .is_retryable()
        );
        assert!(!PipelineError::InvalidInput("empty".into()).is_retryable());
        assert!(!PipelineError::NotFound("doc#0".into()).is_retryable());
    }
}
