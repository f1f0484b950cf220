//! vox core - Domain types, errors and collaborator contracts for the vox
//! ingestion and retrieval pipeline.

mod error;
mod traits;
mod types;

pub use error::{EmbeddingError, ExtractionError, GenerationError, IndexError, JobStateError};
pub use traits::{AnswerGenerator, EmbeddingGateway};
pub use types::*;
