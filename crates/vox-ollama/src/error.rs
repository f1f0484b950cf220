//! Error types for Ollama operations.

use thiserror::Error;
use vox_core::{EmbeddingError, GenerationError};

/// Errors that can occur when interacting with Ollama.
#[derive(Error, Debug)]
pub enum OllamaError {
    /// Request timeout.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The requested model is not available.
    #[error("Model not found: {model}. Run 'ollama pull {model}' to download it.")]
    ModelNotFound { model: String },

    /// Ollama server is not running.
    #[error("Ollama server is not running at {host}. Start it with 'ollama serve'.")]
    ServerNotRunning { host: String },

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Ollama operations.
pub type OllamaResult<T> = Result<T, OllamaError>;

impl From<OllamaError> for EmbeddingError {
    fn from(err: OllamaError) -> Self {
        match err {
            OllamaError::Timeout { seconds } => EmbeddingError::Timeout { seconds },
            OllamaError::ModelNotFound { model } => EmbeddingError::ModelNotFound { model },
            OllamaError::ApiError { status, message } => EmbeddingError::Server { status, message },
            OllamaError::Json(e) => EmbeddingError::Malformed(e.to_string()),
            OllamaError::Http(e) if e.is_decode() => EmbeddingError::Malformed(e.to_string()),
            other => EmbeddingError::Unavailable(other.to_string()),
        }
    }
}

impl From<OllamaError> for GenerationError {
    fn from(err: OllamaError) -> Self {
        match err {
            OllamaError::Timeout { seconds } => GenerationError::Timeout { seconds },
            OllamaError::ModelNotFound { model } => GenerationError::ModelNotFound { model },
            OllamaError::ServerNotRunning { .. } => GenerationError::Unavailable(err.to_string()),
            OllamaError::ApiError { status, .. } if status >= 500 => {
                GenerationError::Unavailable(err.to_string())
            }
            other => GenerationError::Failed(other.to_string()),
        }
    }
}
