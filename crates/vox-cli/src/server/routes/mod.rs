//! API routes for the vox server

pub mod documents;
pub mod jobs;
pub mod search;
pub mod upload;

use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion - with larger body limit for file uploads
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Job progress
        .route("/status/:job_id", get(jobs::job_status))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/:job_id", delete(jobs::clear_job))
        // Document management
        .route("/documents", get(documents::list_documents))
        .route("/documents/:id", delete(documents::delete_document))
        .route("/documents/:id/status", get(jobs::document_status))
        .route("/documents/:id/reingest", post(documents::reingest_document))
        // Retrieval
        .route("/search", post(search::search))
        .route("/ask", post(search::ask))
}
