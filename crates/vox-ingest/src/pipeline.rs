//! Ingestion pipeline: extract, chunk, embed, index.
//!
//! Each upload becomes a job driven through its stages by a background task.
//! A semaphore caps how many jobs run at once; the rest wait in `queued`.
//! Before every stage, and again inside the index write lock, the job checks
//! it is still the current job for its document, so a re-upload or delete
//! always wins over older in-flight work.

use crate::chunker::Chunker;
use crate::error::{IngestError, IngestResult};
use crate::extract::Extractor;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use vox_config::ProcessingConfig;
use vox_core::{
    Chunk, Document, DocumentId, EmbeddingError, EmbeddingGateway, ExtractionError, IndexEntry,
    Job, JobId, JobStage,
};
use vox_store::{DocumentStore, JobHandle, JobTracker, ReplaceOutcome, VectorIndex};

/// Progress reported at the start of embedding, and the share embedding covers.
const EMBED_PROGRESS_START: f32 = 0.45;
const EMBED_PROGRESS_SPAN: f32 = 0.45;

/// Tuning knobs for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_concurrent_jobs: usize,
    pub embed_batch_size: usize,
    pub extract_timeout: Duration,
    pub embed_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&ProcessingConfig::default())
    }
}

impl PipelineSettings {
    /// Create settings from the `[processing]` config.
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self {
            max_concurrent_jobs: config.max_concurrent_jobs,
            embed_batch_size: config.embed_batch_size,
            extract_timeout: config.extract_timeout(),
            embed_timeout: config.embed_timeout(),
        }
    }
}

/// What a document deletion touched.
#[derive(Debug, Clone, Serialize)]
pub struct RemovalReport {
    pub document_id: DocumentId,
    pub entries_removed: usize,
    /// The job that was current for the document, now detached.
    pub retired_job: Option<JobId>,
}

struct Inner {
    extractor: Arc<dyn Extractor>,
    embedder: Arc<dyn EmbeddingGateway>,
    chunker: Chunker,
    index: Arc<VectorIndex>,
    tracker: Arc<JobTracker>,
    documents: Arc<DocumentStore>,
    permits: Arc<Semaphore>,
    settings: PipelineSettings,
}

/// Drives uploaded documents into the vector index.
///
/// Cloning is cheap and every clone shares the same index, tracker and
/// document store.
#[derive(Clone)]
pub struct IngestPipeline {
    inner: Arc<Inner>,
}

impl IngestPipeline {
    /// Create a pipeline. The index takes its dimension from the embedder.
    pub fn new(
        extractor: Arc<dyn Extractor>,
        embedder: Arc<dyn EmbeddingGateway>,
        chunker: Chunker,
        settings: PipelineSettings,
    ) -> Self {
        let index = Arc::new(VectorIndex::new(embedder.dimension()));
        info!(
            "Pipeline ready: embedder={} dimension={} max_concurrent_jobs={}",
            embedder.name(),
            index.dimension(),
            settings.max_concurrent_jobs
        );

        Self {
            inner: Arc::new(Inner {
                extractor,
                embedder,
                chunker,
                index,
                tracker: Arc::new(JobTracker::new()),
                documents: Arc::new(DocumentStore::new()),
                permits: Arc::new(Semaphore::new(settings.max_concurrent_jobs.max(1))),
                settings,
            }),
        }
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.inner.index
    }

    pub fn tracker(&self) -> &Arc<JobTracker> {
        &self.inner.tracker
    }

    pub fn documents(&self) -> &Arc<DocumentStore> {
        &self.inner.documents
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingGateway> {
        &self.inner.embedder
    }

    /// Register a queued job that supersedes any earlier one.
    ///
    /// A new document is stored right away. A re-upload leaves the stored
    /// version in place until its job commits to the index.
    fn register(&self, document: &Document) -> JobHandle {
        if !self.inner.documents.insert(document.clone()) {
            debug!("Document {} re-uploaded", document.id);
        }
        self.inner.tracker.create(document.id.clone())
    }

    /// Queue a document for background ingestion and return its job id.
    pub fn submit(&self, document: Document) -> JobId {
        let handle = self.register(&document);
        let job_id = handle.id().to_string();
        info!(
            "Queued job {} for {} ({})",
            job_id, document.filename, document.id
        );

        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.run(handle, document).await;
        });
        job_id
    }

    /// Ingest a document and wait for its job to finish.
    pub async fn ingest(&self, document: Document) -> Job {
        let handle = self.register(&document);
        self.run(handle, document).await
    }

    /// Run a stored document through the pipeline again.
    pub fn reingest(&self, document_id: &str) -> IngestResult<JobId> {
        let document = self
            .inner
            .documents
            .get(document_id)
            .ok_or_else(|| IngestError::DocumentNotFound(document_id.to_string()))?;
        Ok(self.submit(document))
    }

    /// Delete a document, its index entries, and detach its current job.
    pub fn remove_document(&self, document_id: &str) -> IngestResult<RemovalReport> {
        self.inner
            .documents
            .remove(document_id)
            .ok_or_else(|| IngestError::DocumentNotFound(document_id.to_string()))?;

        // retire first so an in-flight job cannot commit after the removal
        let retired_job = self.inner.tracker.retire(document_id);
        let entries_removed = self.inner.index.remove(document_id);
        info!(
            "Removed document {} ({} entries)",
            document_id, entries_removed
        );

        Ok(RemovalReport {
            document_id: document_id.to_string(),
            entries_removed,
            retired_job,
        })
    }

    /// Stop admitting jobs and drop all indexed state.
    pub fn shutdown(&self) {
        self.inner.permits.close();
        self.inner.index.clear();
        self.inner.documents.clear();
        info!("Pipeline shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.permits.is_closed()
    }

    async fn run(&self, handle: JobHandle, document: Document) -> Job {
        let result = match Arc::clone(&self.inner.permits).acquire_owned().await {
            Ok(permit) => self.execute(&handle, &document, permit).await,
            Err(_) => Err(IngestError::ShuttingDown),
        };

        match result {
            Ok(inserted) => info!(
                "Job {} ready: {} chunks indexed for {}",
                handle.id(),
                inserted,
                document.filename
            ),
            Err(err) => {
                warn!("Job {} for {} failed: {}", handle.id(), document.filename, err);
                if let Err(e) = handle.fail(err.failure()) {
                    warn!("Could not record failure of job {}: {}", handle.id(), e);
                }
            }
        }
        handle.snapshot()
    }

    /// Stage boundary check.
    fn ensure_current(&self, handle: &JobHandle) -> IngestResult<()> {
        if self.is_shut_down() {
            return Err(IngestError::ShuttingDown);
        }
        if !self.inner.tracker.is_current(handle.id()) {
            return Err(IngestError::Superseded {
                document_id: handle.document_id(),
            });
        }
        Ok(())
    }

    async fn execute(
        &self,
        handle: &JobHandle,
        document: &Document,
        permit: OwnedSemaphorePermit,
    ) -> IngestResult<usize> {
        let mut permit = Some(permit);

        self.ensure_current(handle)?;
        handle.advance(JobStage::Extracting)?;
        let text = self.extract(document, &mut permit).await?;

        self.ensure_current(handle)?;
        handle.advance(JobStage::Chunking)?;
        let chunks = self.inner.chunker.chunk(&text, &document.id);
        debug!("Created {} chunks for {}", chunks.len(), document.id);

        self.ensure_current(handle)?;
        handle.advance(JobStage::Embedding)?;
        let vectors = self.embed(handle, &chunks).await?;

        self.ensure_current(handle)?;
        handle.advance(JobStage::Indexing)?;
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry::new(chunk, vector))
            .collect();

        // the stored document changes together with the index, never ahead of it
        let tracker = &self.inner.tracker;
        let documents = &self.inner.documents;
        let outcome = self.inner.index.replace_document(&document.id, entries, || {
            if !tracker.is_current(handle.id()) {
                return false;
            }
            documents.update(document.clone());
            true
        })?;

        match outcome {
            ReplaceOutcome::Committed { removed, inserted } => {
                if removed > 0 {
                    debug!("Replaced {} stale entries for {}", removed, document.id);
                }
                handle.advance(JobStage::Ready)?;
                Ok(inserted)
            }
            ReplaceOutcome::Superseded => Err(IngestError::Superseded {
                document_id: document.id.clone(),
            }),
        }
    }

    /// Run the extractor under the extraction timeout.
    ///
    /// External tools cannot be interrupted, so on timeout the job fails but
    /// its permit stays taken until the extraction task has finished.
    async fn extract(
        &self,
        document: &Document,
        permit: &mut Option<OwnedSemaphorePermit>,
    ) -> IngestResult<String> {
        let limit = self.inner.settings.extract_timeout;
        let extractor = Arc::clone(&self.inner.extractor);
        let owned = document.clone();
        let mut task = tokio::spawn(async move { extractor.extract(&owned).await });

        let text = match timeout(limit, &mut task).await {
            Ok(joined) => joined.map_err(|e| {
                ExtractionError::Failed(format!("extraction task aborted: {}", e))
            })??,
            Err(_) => {
                if let Some(permit) = permit.take() {
                    let filename = document.filename.clone();
                    tokio::spawn(async move {
                        let _ = task.await;
                        debug!("Timed out extraction of {} finished", filename);
                        drop(permit);
                    });
                }
                return Err(ExtractionError::Timeout {
                    seconds: limit.as_secs(),
                }
                .into());
            }
        };

        if text.is_empty() {
            return Err(ExtractionError::NoText {
                filename: document.filename.clone(),
            }
            .into());
        }
        debug!("Extracted {} characters from {}", text.len(), document.filename);
        Ok(text)
    }

    /// Embed chunk texts in batches. Any failed or short batch fails the whole job.
    async fn embed(&self, handle: &JobHandle, chunks: &[Chunk]) -> IngestResult<Vec<Vec<f32>>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let total = texts.len();
        let limit = self.inner.settings.embed_timeout;
        let mut vectors = Vec::with_capacity(total);

        for batch in texts.chunks(self.inner.settings.embed_batch_size.max(1)) {
            let embedded = timeout(limit, self.inner.embedder.embed(batch))
                .await
                .map_err(|_| EmbeddingError::Timeout {
                    seconds: limit.as_secs(),
                })??;

            if embedded.len() != batch.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: batch.len(),
                    actual: embedded.len(),
                }
                .into());
            }
            vectors.extend(embedded);

            let done = vectors.len() as f32 / total as f32;
            handle.report_progress(EMBED_PROGRESS_START + EMBED_PROGRESS_SPAN * done);
            self.ensure_current(handle)?;
        }

        Ok(vectors)
    }
}
