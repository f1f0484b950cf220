//! Error taxonomy shared by every vox crate.

use crate::types::{JobFailure, JobStage};
use thiserror::Error;

/// Failure to turn an uploaded payload into text. Fatal for that job, never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Unsupported media kind: {0}")]
    UnsupportedKind(String),

    #[error("Could not read {filename}: {message}")]
    Corrupt { filename: String, message: String },

    #[error("Tool not found: {tool}. Please install it.")]
    ToolMissing { tool: String },

    #[error("No text could be extracted from {filename}")]
    NoText { filename: String },

    #[error("Extraction timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Extraction failed: {0}")]
    Failed(String),
}

/// Failure to embed a batch of texts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("Embedding service unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Embedding service error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Embedding count mismatch: sent {expected} texts, got {actual} vectors")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Embedding model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Malformed embedding response: {0}")]
    Malformed(String),
}

impl EmbeddingError {
    /// Transient failures that a later re-ingestion may not hit.
    pub fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::Unavailable(_) | EmbeddingError::Timeout { .. } => true,
            EmbeddingError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Failure of the answer generator. Surfaced as a degraded answer, never as a crash.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Generation service unavailable: {0}")]
    Unavailable(String),

    #[error("Generation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Generation model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Generation failed: {0}")]
    Failed(String),
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Unavailable(_) | GenerationError::Timeout { .. }
        )
    }
}

/// Misuse of the vector index.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Illegal job state change.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobStateError {
    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobStage, to: JobStage },
}

impl From<&ExtractionError> for JobFailure {
    fn from(err: &ExtractionError) -> Self {
        JobFailure::new("extraction", err.to_string())
    }
}

impl From<&EmbeddingError> for JobFailure {
    fn from(err: &EmbeddingError) -> Self {
        JobFailure::new("embedding", err.to_string()).retryable(err.is_retryable())
    }
}

impl From<&IndexError> for JobFailure {
    fn from(err: &IndexError) -> Self {
        JobFailure::new("index", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_retryability() {
        assert!(EmbeddingError::Unavailable("refused".into()).is_retryable());
        assert!(EmbeddingError::Timeout { seconds: 5 }.is_retryable());
        assert!(EmbeddingError::Server { status: 503, message: String::new() }.is_retryable());
        assert!(!EmbeddingError::Server { status: 400, message: String::new() }.is_retryable());
        assert!(!EmbeddingError::CountMismatch { expected: 5, actual: 4 }.is_retryable());
    }

    #[test]
    fn test_failure_from_errors() {
        let failure = JobFailure::from(&EmbeddingError::Timeout { seconds: 30 });
        assert_eq!(failure.kind, "embedding");
        assert!(failure.retryable);

        let failure = JobFailure::from(&ExtractionError::ToolMissing { tool: "whisper".into() });
        assert_eq!(failure.kind, "extraction");
        assert!(!failure.retryable);
        assert!(failure.message.contains("whisper"));
    }
}
