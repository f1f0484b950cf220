//! In-memory vector index with exact cosine search.
//!
//! Every search is a brute-force scan, which is plenty for a single process
//! holding the chunks of a few hundred uploads.

use parking_lot::RwLock;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;
use vox_core::{IndexEntry, IndexError, ScoredChunk, SpanClass};

/// Calculate cosine similarity between two vectors.
///
/// Zero-norm or mismatched vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

/// (score, insertion seq, entry)
type Hit<'a> = (f32, u64, &'a IndexEntry);

fn rank(a: &Hit<'_>, b: &Hit<'_>) -> Ordering {
    b.0.total_cmp(&a.0).then(a.1.cmp(&b.1))
}

struct StoredEntry {
    /// Insertion order, used to break score ties.
    seq: u64,
    entry: IndexEntry,
}

#[derive(Default)]
struct IndexState {
    entries: Vec<StoredEntry>,
    next_seq: u64,
}

impl IndexState {
    fn append(&mut self, entries: Vec<IndexEntry>) -> usize {
        let count = entries.len();
        for entry in entries {
            self.entries.push(StoredEntry {
                seq: self.next_seq,
                entry,
            });
            self.next_seq += 1;
        }
        count
    }

    fn remove_document(&mut self, document_id: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|stored| stored.entry.chunk.document_id != document_id);
        before - self.entries.len()
    }
}

/// Outcome of [`VectorIndex::replace_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Stale entries were dropped and the new set written.
    Committed { removed: usize, inserted: usize },
    /// The writer was no longer current; nothing changed.
    Superseded,
}

/// Counters describing the index contents.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub entries: usize,
    pub documents: usize,
    pub dimension: usize,
}

/// Thread-safe store of (embedding, chunk) pairs.
///
/// Writes take the lock exclusively and are validated before any entry is
/// touched, so readers never observe a partially applied batch.
pub struct VectorIndex {
    dimension: usize,
    state: RwLock<IndexState>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: RwLock::new(IndexState::default()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Number of distinct documents with at least one entry.
    pub fn document_count(&self) -> usize {
        let state = self.state.read();
        state
            .entries
            .iter()
            .map(|stored| stored.entry.chunk.document_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Number of entries belonging to `document_id`.
    pub fn count_for(&self, document_id: &str) -> usize {
        self.state
            .read()
            .entries
            .iter()
            .filter(|stored| stored.entry.chunk.document_id == document_id)
            .count()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entries: self.len(),
            documents: self.document_count(),
            dimension: self.dimension,
        }
    }

    fn check_vector(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(IndexError::InvalidArgument(
                "vector contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }

    fn check_batch(&self, entries: &[IndexEntry]) -> Result<(), IndexError> {
        entries
            .iter()
            .try_for_each(|entry| self.check_vector(entry.vector()))
    }

    /// Append a batch. If any entry is invalid the whole batch is rejected.
    pub fn insert(&self, entries: Vec<IndexEntry>) -> Result<usize, IndexError> {
        self.check_batch(&entries)?;
        let inserted = self.state.write().append(entries);
        debug!("Inserted {} index entries", inserted);
        Ok(inserted)
    }

    /// Swap the entries of one document for a new set, in a single write.
    ///
    /// `commit` runs while the write lock is held, so anything it updates
    /// changes together with the index. When it returns false the index is
    /// left untouched.
    pub fn replace_document<F>(
        &self,
        document_id: &str,
        entries: Vec<IndexEntry>,
        commit: F,
    ) -> Result<ReplaceOutcome, IndexError>
    where
        F: FnOnce() -> bool,
    {
        self.check_batch(&entries)?;
        if let Some(foreign) = entries
            .iter()
            .find(|entry| entry.chunk.document_id != document_id)
        {
            return Err(IndexError::InvalidArgument(format!(
                "chunk {} does not belong to document {}",
                foreign.chunk.id, document_id
            )));
        }

        let mut state = self.state.write();
        if !commit() {
            debug!("Skipping superseded write for document {}", document_id);
            return Ok(ReplaceOutcome::Superseded);
        }
        let removed = state.remove_document(document_id);
        let inserted = state.append(entries);
        debug!(
            "Document {}: replaced {} entries with {}",
            document_id, removed, inserted
        );
        Ok(ReplaceOutcome::Committed { removed, inserted })
    }

    /// Remove every entry of a document. Idempotent; returns the number removed.
    pub fn remove(&self, document_id: &str) -> usize {
        let removed = self.state.write().remove_document(document_id);
        if removed > 0 {
            debug!("Removed {} entries for document {}", removed, document_id);
        }
        removed
    }

    /// Drop everything.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
    }

    /// Top-k entries by cosine similarity.
    ///
    /// Results are ordered by descending score; equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        self.search_where(query, k, |_| true)
    }

    /// Like [`search`](Self::search), restricted to one span class.
    pub fn search_filtered(
        &self,
        query: &[f32],
        k: usize,
        span: SpanClass,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        self.search_where(query, k, |entry| entry.chunk.span == span)
    }

    fn search_where<P>(&self, query: &[f32], k: usize, keep: P) -> Result<Vec<ScoredChunk>, IndexError>
    where
        P: Fn(&IndexEntry) -> bool,
    {
        if k == 0 {
            return Err(IndexError::InvalidArgument(
                "k must be greater than zero".to_string(),
            ));
        }
        self.check_vector(query)?;

        let state = self.state.read();
        let mut hits: Vec<Hit<'_>> = state
            .entries
            .iter()
            .filter(|stored| keep(&stored.entry))
            .map(|stored| {
                (
                    cosine_similarity(query, stored.entry.vector()),
                    stored.seq,
                    &stored.entry,
                )
            })
            .collect();

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, rank);
            hits.truncate(k);
        }
        hits.sort_by(rank);

        Ok(hits
            .into_iter()
            .map(|(score, _, entry)| ScoredChunk {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect())
    }
}
