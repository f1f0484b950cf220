//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use vox_core::{EmbeddingError, ExtractionError, IndexError};
use vox_ingest::{IngestError, RetrievalError};
use vox_store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors a handler can return.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Ingest(err) => match err {
                IngestError::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                IngestError::Extraction(ExtractionError::UnsupportedKind(_)) => {
                    (StatusCode::BAD_REQUEST, "unsupported_type")
                }
                IngestError::ShuttingDown => (StatusCode::SERVICE_UNAVAILABLE, "shutting_down"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "ingest_error"),
            },
            ApiError::Retrieval(RetrievalError::Index(err)) => match err {
                IndexError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "bad_request"),
                IndexError::DimensionMismatch { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "index_error")
                }
            },
            ApiError::Retrieval(RetrievalError::Embedding(err)) => (
                embedding_status(err),
                "embedding_error",
            ),
            ApiError::Store(err) => match err {
                StoreError::JobNotFound(_) | StoreError::DocumentNotFound(_) => {
                    (StatusCode::NOT_FOUND, "not_found")
                }
                StoreError::JobActive { .. } => (StatusCode::CONFLICT, "job_active"),
            },
        }
    }
}

fn embedding_status(err: &EmbeddingError) -> StatusCode {
    if err.is_retryable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::BAD_GATEWAY
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.parts();
        if status.is_server_error() {
            error!("{} {}: {}", status.as_u16(), error_type, self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(IngestError::DocumentNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(IngestError::from(ExtractionError::UnsupportedKind("png".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RetrievalError::from(IndexError::DimensionMismatch {
                expected: 768,
                actual: 384
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(RetrievalError::from(EmbeddingError::Timeout { seconds: 5 })),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(RetrievalError::from(EmbeddingError::ModelNotFound {
                model: "nomic-embed-text".into()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(StoreError::JobActive {
                job_id: "j".into(),
                stage: vox_core::JobStage::Embedding
            }),
            StatusCode::CONFLICT
        );
    }
}
