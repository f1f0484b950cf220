//! Core domain types for vox.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for uploaded documents.
pub type DocumentId = String;

/// Unique identifier for chunks (`<document>:<class>:<sequence>`).
pub type ChunkId = String;

/// Unique identifier for processing jobs.
pub type JobId = String;

/// Generate a new unique ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Hex-encoded SHA-256 of a payload.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Kind of uploaded media. Closed set; every kind has exactly one extraction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Document,
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "document" | "doc" | "pdf" | "text" => Some(MediaKind::Document),
            "audio" => Some(MediaKind::Audio),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// Detect media kind from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" | "txt" | "md" | "markdown" => Some(MediaKind::Document),
            "mp3" | "wav" | "m4a" | "flac" | "ogg" | "aac" => Some(MediaKind::Audio),
            "mp4" | "mov" | "mkv" | "webm" | "avi" | "m4v" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// Detect media kind from a filename's extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One uploaded file. Immutable once stored.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub filename: String,
    pub kind: MediaKind,
    pub payload: Arc<[u8]>,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(filename: impl Into<String>, kind: MediaKind, payload: impl Into<Vec<u8>>) -> Self {
        let payload: Vec<u8> = payload.into();
        Self {
            id: new_id(),
            filename: filename.into(),
            kind,
            content_hash: content_hash(&payload),
            payload: payload.into(),
            created_at: Utc::now(),
        }
    }

    /// Reuse an existing document identifier (re-upload).
    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = id.into();
        self
    }

    /// Extension of the original filename, lower-cased.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// Window class a chunk was cut with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanClass {
    Short,
    Long,
}

impl SpanClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanClass::Short => "short",
            SpanClass::Long => "long",
        }
    }
}

impl std::fmt::Display for SpanClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A contiguous span of extracted text from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub document_id: DocumentId,
    pub sequence: usize,
    pub span: SpanClass,
    pub text: String,
    /// Byte offset of the first character in the extracted text.
    pub start_offset: usize,
    /// Byte offset one past the last character.
    pub end_offset: usize,
}

impl Chunk {
    pub fn new(
        document_id: impl Into<DocumentId>,
        span: SpanClass,
        sequence: usize,
        text: impl Into<String>,
    ) -> Self {
        let document_id = document_id.into();
        let text = text.into();
        Self {
            id: format!("{}:{}:{}", document_id, span, sequence),
            end_offset: text.len(),
            document_id,
            sequence,
            span,
            text,
            start_offset: 0,
        }
    }

    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        self.start_offset = start;
        self.end_offset = end;
        self
    }
}

/// Vector representation of one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub chunk_id: ChunkId,
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn new(chunk_id: impl Into<ChunkId>, vector: Vec<f32>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            vector,
        }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// The unit stored in the vector index: a chunk with its embedding.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Embedding,
}

impl IndexEntry {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self {
            embedding: Embedding::new(chunk.id.clone(), vector),
            chunk,
        }
    }

    pub fn vector(&self) -> &[f32] {
        &self.embedding.vector
    }
}

/// A chunk returned by similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query, in [-1, 1].
    pub score: f32,
}

/// Processing stage of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    #[default]
    Queued,
    Extracting,
    Chunking,
    Embedding,
    Indexing,
    Ready,
    Failed,
}

impl JobStage {
    pub const ALL: [JobStage; 7] = [
        JobStage::Queued,
        JobStage::Extracting,
        JobStage::Chunking,
        JobStage::Embedding,
        JobStage::Indexing,
        JobStage::Ready,
        JobStage::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Queued => "queued",
            JobStage::Extracting => "extracting",
            JobStage::Chunking => "chunking",
            JobStage::Embedding => "embedding",
            JobStage::Indexing => "indexing",
            JobStage::Ready => "ready",
            JobStage::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s.to_lowercase())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Ready | JobStage::Failed)
    }

    /// The stage that follows on success, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            JobStage::Queued => Some(JobStage::Extracting),
            JobStage::Extracting => Some(JobStage::Chunking),
            JobStage::Chunking => Some(JobStage::Embedding),
            JobStage::Embedding => Some(JobStage::Indexing),
            JobStage::Indexing => Some(JobStage::Ready),
            JobStage::Ready | JobStage::Failed => None,
        }
    }

    /// Whether `to` is a legal transition from this stage.
    pub fn can_transition_to(&self, to: JobStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == JobStage::Failed || self.next() == Some(to)
    }

    /// Progress fraction reported on entering this stage.
    pub fn entry_progress(&self) -> f32 {
        match self {
            JobStage::Queued => 0.0,
            JobStage::Extracting => 0.05,
            JobStage::Chunking => 0.40,
            JobStage::Embedding => 0.45,
            JobStage::Indexing => 0.95,
            JobStage::Ready => 1.0,
            JobStage::Failed => 0.0,
        }
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a job ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    /// Short machine-readable category ("extraction", "embedding", "index", "superseded", ...).
    pub kind: String,
    pub message: String,
    /// Whether re-ingesting the same payload could plausibly succeed.
    pub retryable: bool,
}

impl JobFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

impl std::fmt::Display for JobFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Processing lifecycle of one document upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub document_id: DocumentId,
    pub stage: JobStage,
    pub progress: f32,
    pub failure: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(document_id: impl Into<DocumentId>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            document_id: document_id.into(),
            stage: JobStage::Queued,
            progress: 0.0,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_done(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Move to `to`, raising progress to the stage's entry value.
    pub fn transition(&mut self, to: JobStage) -> Result<(), crate::JobStateError> {
        if !self.stage.can_transition_to(to) {
            return Err(crate::JobStateError::InvalidTransition {
                from: self.stage,
                to,
            });
        }
        self.stage = to;
        if to != JobStage::Failed {
            self.progress = self.progress.max(to.entry_progress());
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record intra-stage progress. Values below the current progress are ignored.
    pub fn record_progress(&mut self, fraction: f32) {
        if self.stage.is_terminal() || !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction > self.progress {
            self.progress = fraction;
            self.updated_at = Utc::now();
        }
    }

    /// Terminate with a failure. Progress keeps its last value.
    pub fn fail(&mut self, failure: JobFailure) -> Result<(), crate::JobStateError> {
        self.transition(JobStage::Failed)?;
        self.failure = Some(failure);
        Ok(())
    }
}
