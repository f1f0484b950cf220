//! Contracts for the external model collaborators.

use crate::error::{EmbeddingError, GenerationError};
use crate::types::Chunk;
use async_trait::async_trait;

/// Converts text into fixed-length vectors.
///
/// Implementations must return exactly one vector per input text, in input
/// order, or an error. Callers treat a short or long result as a failure.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        match vectors.len() {
            1 => Ok(vectors.remove(0)),
            actual => Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual,
            }),
        }
    }

    /// Dimension of every vector this gateway produces.
    fn dimension(&self) -> usize;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Produces an answer grounded in retrieved chunks.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String, GenerationError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
