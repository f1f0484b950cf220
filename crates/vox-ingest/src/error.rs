//! Error types for ingestion and retrieval.

use thiserror::Error;
use vox_core::{EmbeddingError, ExtractionError, IndexError, JobFailure, JobStateError};

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can end an ingestion job or reject a pipeline request.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    JobState(#[from] JobStateError),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Superseded: document {document_id} was re-uploaded or deleted")]
    Superseded { document_id: String },

    #[error("Pipeline is shutting down")]
    ShuttingDown,
}

impl IngestError {
    /// The failure recorded on a job that ended with this error.
    pub fn failure(&self) -> JobFailure {
        match self {
            IngestError::Extraction(e) => JobFailure::from(e),
            IngestError::Embedding(e) => JobFailure::from(e),
            IngestError::Index(e) => JobFailure::from(e),
            IngestError::Superseded { .. } => JobFailure::new("superseded", self.to_string()),
            IngestError::ShuttingDown => JobFailure::new("shutdown", self.to_string()).retryable(true),
            _ => JobFailure::new("internal", self.to_string()),
        }
    }
}

/// Errors from query-time retrieval.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),
}
