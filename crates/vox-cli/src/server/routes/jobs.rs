//! Job progress endpoints

use crate::server::error::{ApiError, ApiResult};
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use vox_core::JobStage;
use vox_store::{JobSnapshot, TrackerStats};

/// Job status as reported to clients
#[derive(Debug, Serialize)]
pub struct JobStatus {
    pub job_id: String,
    pub document_id: String,
    pub stage: JobStage,
    pub progress: f32,
    pub error: Option<String>,
    pub error_kind: Option<String>,
    pub retryable: bool,
    pub done: bool,
    /// False once the document was re-uploaded or deleted.
    pub current: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobSnapshot> for JobStatus {
    fn from(snapshot: JobSnapshot) -> Self {
        let JobSnapshot { job, current } = snapshot;
        let done = job.is_done();
        let (error, error_kind, retryable) = match job.failure {
            Some(f) => (Some(f.message), Some(f.kind), f.retryable),
            None => (None, None, false),
        };

        Self {
            job_id: job.id,
            document_id: job.document_id,
            stage: job.stage,
            progress: job.progress,
            error,
            error_kind,
            retryable,
            done,
            current,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// All jobs plus counts per stage
#[derive(Debug, Serialize)]
pub struct JobList {
    pub jobs: Vec<JobStatus>,
    pub stats: TrackerStats,
}

/// GET /status/:job_id
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatus>> {
    state
        .pipeline()
        .tracker()
        .get(&job_id)
        .map(|snapshot| Json(snapshot.into()))
        .ok_or_else(|| ApiError::NotFound(format!("Unknown job_id: {}", job_id)))
}

/// GET /documents/:id/status - the document's current job
pub async fn document_status(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> ApiResult<Json<JobStatus>> {
    state
        .pipeline()
        .tracker()
        .current_for(&document_id)
        .map(|snapshot| Json(snapshot.into()))
        .ok_or_else(|| ApiError::NotFound(format!("No job for document: {}", document_id)))
}

/// GET /jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobList> {
    let tracker = state.pipeline().tracker();
    Json(JobList {
        jobs: tracker.list().into_iter().map(JobStatus::from).collect(),
        stats: tracker.stats(),
    })
}

/// DELETE /jobs/:job_id - forget a finished job
pub async fn clear_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatus>> {
    let job = state.pipeline().tracker().clear(&job_id)?;
    Ok(Json(JobSnapshot { job, current: false }.into()))
}
