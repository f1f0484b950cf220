//! Shared application state for the HTTP server.

use std::sync::Arc;
use vox_config::Config;
use vox_ingest::{AnswerService, IngestPipeline};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pipeline: IngestPipeline,
    answers: AnswerService,
    default_k: usize,
}

impl AppState {
    pub fn new(pipeline: IngestPipeline, answers: AnswerService, config: &Config) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pipeline,
                answers,
                default_k: config.retrieval.default_k,
            }),
        }
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn answers(&self) -> &AnswerService {
        &self.inner.answers
    }

    /// Result count for `/search` when the request gives none.
    pub fn default_k(&self) -> usize {
        self.inner.default_k
    }
}
