//! vox store - Process-lifetime state for the ingestion pipeline.
//!
//! Nothing here is persisted; everything is dropped at shutdown.

mod documents;
mod error;
mod index;
mod jobs;

pub use documents::{DocumentStore, DocumentSummary};
pub use error::{StoreError, StoreResult};
pub use index::{cosine_similarity, IndexStats, ReplaceOutcome, VectorIndex};
pub use jobs::{JobHandle, JobSnapshot, JobTracker, TrackerStats};
