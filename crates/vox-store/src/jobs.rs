//! Job tracking for asynchronous ingestion.
//!
//! The tracker owns every [`Job`]. Writes go through a [`JobHandle`], which is
//! issued once per job and cannot be cloned, so each job has exactly one
//! writer. Readers always receive owned snapshots.

use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};
use vox_core::{DocumentId, Job, JobFailure, JobId, JobStage, JobStateError};

/// A point-in-time copy of a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    #[serde(flatten)]
    pub job: Job,
    /// False once a newer job for the same document exists, or the document was deleted.
    pub current: bool,
}

/// Job counts per stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackerStats {
    pub total: usize,
    pub by_stage: BTreeMap<String, usize>,
}

impl TrackerStats {
    pub fn count(&self, stage: JobStage) -> usize {
        self.by_stage.get(stage.as_str()).copied().unwrap_or(0)
    }
}

#[derive(Default)]
struct TrackerState {
    jobs: HashMap<JobId, Arc<RwLock<Job>>>,
    /// Creation order, for listing.
    order: Vec<JobId>,
    current: HashMap<DocumentId, JobId>,
}

/// Registry of ingestion jobs.
#[derive(Default)]
pub struct JobTracker {
    state: RwLock<TrackerState>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a queued job for `document_id`. It becomes the document's current job,
    /// superseding any earlier one.
    pub fn create(&self, document_id: impl Into<DocumentId>) -> JobHandle {
        let job = Job::new(document_id);
        let id = job.id.clone();
        let document_id = job.document_id.clone();
        let record = Arc::new(RwLock::new(job));

        let mut state = self.state.write();
        state.jobs.insert(id.clone(), Arc::clone(&record));
        state.order.push(id.clone());
        if let Some(previous) = state.current.insert(document_id.clone(), id.clone()) {
            info!("Job {} supersedes {} for document {}", id, previous, document_id);
        }

        JobHandle { id, record }
    }

    fn snapshot(state: &TrackerState, record: &RwLock<Job>) -> JobSnapshot {
        let job = record.read().clone();
        let current = state.current.get(&job.document_id) == Some(&job.id);
        JobSnapshot { job, current }
    }

    pub fn get(&self, job_id: &str) -> Option<JobSnapshot> {
        let state = self.state.read();
        state
            .jobs
            .get(job_id)
            .map(|record| Self::snapshot(&state, record))
    }

    /// Snapshot of the current job for a document.
    pub fn current_for(&self, document_id: &str) -> Option<JobSnapshot> {
        let state = self.state.read();
        state
            .current
            .get(document_id)
            .and_then(|id| state.jobs.get(id))
            .map(|record| Self::snapshot(&state, record))
    }

    /// All jobs, oldest first.
    pub fn list(&self) -> Vec<JobSnapshot> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .map(|record| Self::snapshot(&state, record))
            .collect()
    }

    pub fn is_current(&self, job_id: &str) -> bool {
        let state = self.state.read();
        state
            .jobs
            .get(job_id)
            .map(|record| {
                let document_id = record.read().document_id.clone();
                state.current.get(&document_id).map(String::as_str) == Some(job_id)
            })
            .unwrap_or(false)
    }

    /// Detach a document from its current job, so any in-flight execution stops
    /// at its next stage boundary. Returns the retired job id.
    pub fn retire(&self, document_id: &str) -> Option<JobId> {
        let retired = self.state.write().current.remove(document_id);
        if let Some(ref id) = retired {
            debug!("Retired job {} for document {}", id, document_id);
        }
        retired
    }

    /// Forget a finished job.
    pub fn clear(&self, job_id: &str) -> StoreResult<Job> {
        let mut state = self.state.write();
        let record = state
            .jobs
            .get(job_id)
            .cloned()
            .ok_or_else(|| StoreError::JobNotFound(job_id.to_string()))?;

        let job = record.read().clone();
        if !job.is_done() {
            return Err(StoreError::JobActive {
                job_id: job_id.to_string(),
                stage: job.stage,
            });
        }

        state.jobs.remove(job_id);
        state.order.retain(|id| id != job_id);
        if state.current.get(&job.document_id).map(String::as_str) == Some(job_id) {
            state.current.remove(&job.document_id);
        }
        debug!("Cleared job {}", job_id);
        Ok(job)
    }

    pub fn stats(&self) -> TrackerStats {
        let mut stats = TrackerStats::default();
        for snapshot in self.list() {
            stats.total += 1;
            *stats
                .by_stage
                .entry(snapshot.job.stage.as_str().to_string())
                .or_default() += 1;
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.state.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive write access to one job.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    record: Arc<RwLock<Job>>,
}

impl JobHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn document_id(&self) -> DocumentId {
        self.record.read().document_id.clone()
    }

    pub fn stage(&self) -> JobStage {
        self.record.read().stage
    }

    pub fn snapshot(&self) -> Job {
        self.record.read().clone()
    }

    /// Move to the next stage.
    pub fn advance(&self, stage: JobStage) -> Result<(), JobStateError> {
        self.record.write().transition(stage)?;
        debug!("Job {} -> {}", self.id, stage);
        Ok(())
    }

    /// Report progress within the current stage. Never lowers the fraction.
    pub fn report_progress(&self, fraction: f32) {
        self.record.write().record_progress(fraction);
    }

    /// Terminate the job. Errors if the job already finished.
    pub fn fail(&self, failure: JobFailure) -> Result<(), JobStateError> {
        info!("Job {} failed: {}", self.id, failure);
        self.record.write().fail(failure)
    }
}
