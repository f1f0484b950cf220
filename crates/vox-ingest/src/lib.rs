//! vox ingest - Upload ingestion and retrieval.
//!
//! This crate provides:
//! - Text extraction per media kind (PDF, text, markdown, audio, video)
//! - Two-profile content chunking for RAG
//! - The asynchronous ingestion pipeline with job tracking
//! - Query-time retrieval and grounded answering

mod answer;
mod chunker;
mod error;
pub mod extract;
mod pipeline;
mod retrieval;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use answer::{AnswerService, AskMode, AskResponse, AskSettings};
pub use chunker::{ChunkConfig, Chunker};
pub use error::{IngestError, IngestResult, RetrievalError};
pub use extract::{Extractor, MediaExtractor};
pub use pipeline::{IngestPipeline, PipelineSettings, RemovalReport};
pub use retrieval::RetrievalEngine;
