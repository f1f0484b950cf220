//! Store error types.

use thiserror::Error;
use vox_core::JobStage;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job {job_id} is still {stage}")]
    JobActive { job_id: String, stage: JobStage },

    #[error("Document not found: {0}")]
    DocumentNotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
