//! Document management endpoints

use super::upload::UploadResponse;
use crate::server::error::ApiResult;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use vox_ingest::RemovalReport;
use vox_store::{DocumentSummary, IndexStats};

/// A stored document and how many of its chunks are searchable.
#[derive(Debug, Serialize)]
pub struct DocumentEntry {
    #[serde(flatten)]
    pub summary: DocumentSummary,
    pub indexed_chunks: usize,
}

#[derive(Debug, Serialize)]
pub struct DocumentList {
    pub documents: Vec<DocumentEntry>,
    pub index: IndexStats,
}

/// GET /documents
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentList> {
    let pipeline = state.pipeline();
    let documents = pipeline
        .documents()
        .list()
        .into_iter()
        .map(|summary| DocumentEntry {
            indexed_chunks: pipeline.index().count_for(&summary.id),
            summary,
        })
        .collect();

    Json(DocumentList {
        documents,
        index: pipeline.index().stats(),
    })
}

/// DELETE /documents/:id - drop the document, its index entries and its job
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RemovalReport>> {
    let report = state.pipeline().remove_document(&id)?;
    Ok(Json(report))
}

/// POST /documents/:id/reingest - run the stored payload through the pipeline again
pub async fn reingest_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let job_id = state.pipeline().reingest(&id)?;
    info!("Re-ingesting document {} as job {}", id, job_id);
    Ok((StatusCode::ACCEPTED, Json(UploadResponse::new(id, job_id))))
}
