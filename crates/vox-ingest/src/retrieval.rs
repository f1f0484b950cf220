//! Query-time retrieval over the vector index.

use crate::error::RetrievalError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use vox_core::{EmbeddingError, EmbeddingGateway, IndexError, ScoredChunk, SpanClass};
use vox_store::VectorIndex;

/// Embeds queries and ranks indexed chunks against them.
#[derive(Clone)]
pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingGateway>,
    index: Arc<VectorIndex>,
    embed_timeout: Duration,
}

impl RetrievalEngine {
    pub fn new(embedder: Arc<dyn EmbeddingGateway>, index: Arc<VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            embed_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, embed_timeout: Duration) -> Self {
        self.embed_timeout = embed_timeout;
        self
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Top-k chunks of any span class.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, RetrievalError> {
        self.retrieve_span(query, k, None).await
    }

    /// Top-k chunks, optionally restricted to one span class.
    ///
    /// An empty index short-circuits without calling the embedding gateway.
    pub async fn retrieve_span(
        &self,
        query: &str,
        k: usize,
        span: Option<SpanClass>,
    ) -> Result<Vec<ScoredChunk>, RetrievalError> {
        if k == 0 {
            return Err(IndexError::InvalidArgument("k must be at least 1".to_string()).into());
        }
        if self.index.is_empty() {
            debug!("Index is empty, skipping query embedding");
            return Ok(vec![]);
        }

        let vector = timeout(self.embed_timeout, self.embedder.embed_one(query))
            .await
            .map_err(|_| EmbeddingError::Timeout {
                seconds: self.embed_timeout.as_secs(),
            })??;

        let hits = match span {
            Some(span) => self.index.search_filtered(&vector, k, span)?,
            None => self.index.search(&vector, k)?,
        };
        debug!("Retrieved {} chunks for query (k={})", hits.len(), k);
        Ok(hits)
    }
}
