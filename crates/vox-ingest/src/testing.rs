//! Deterministic in-process collaborators for tests.
//!
//! Enabled inside this crate's tests and, for dependent crates, through the
//! `test-util` feature.

use crate::extract::Extractor;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vox_core::{
    AnswerGenerator, Chunk, Document, EmbeddingError, EmbeddingGateway, ExtractionError,
    GenerationError,
};

/// Bag-of-words embedder: each lower-cased word bumps one hashed bucket.
///
/// Texts sharing words land close together, which is enough to make ranking
/// assertions meaningful without a model.
#[derive(Debug)]
pub struct HashingEmbedder {
    dimension: usize,
    calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let slot = fnv1a(&word.to_lowercase()) as usize % self.dimension;
            vector[slot] += 1.0;
        }
        vector
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf29ce484222325, |hash, b| {
        (hash ^ b as u64).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl EmbeddingGateway for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// How a [`FaultyEmbedder`] misbehaves.
#[derive(Debug, Clone)]
pub enum EmbedFault {
    /// Fail any batch containing a text with this marker.
    Marker(String),
    /// Return one vector fewer than requested.
    ShortBatch,
    /// Return vectors of the wrong length while advertising the right one.
    WrongDimension(usize),
    /// Every call fails as if the service were down.
    Unavailable,
}

/// A [`HashingEmbedder`] with a scripted fault.
#[derive(Debug)]
pub struct FaultyEmbedder {
    inner: HashingEmbedder,
    fault: EmbedFault,
}

impl FaultyEmbedder {
    pub fn new(dimension: usize, fault: EmbedFault) -> Self {
        Self {
            inner: HashingEmbedder::new(dimension),
            fault,
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait]
impl EmbeddingGateway for FaultyEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = self.inner.embed(texts).await?;
        match &self.fault {
            EmbedFault::Marker(marker) if texts.iter().any(|t| t.contains(marker.as_str())) => {
                Err(EmbeddingError::Server {
                    status: 500,
                    message: format!("cannot embed text containing {}", marker),
                })
            }
            EmbedFault::Marker(_) => Ok(vectors),
            EmbedFault::ShortBatch => {
                vectors.pop();
                Ok(vectors)
            }
            EmbedFault::WrongDimension(dimension) => {
                Ok(vectors.into_iter().map(|_| vec![1.0; *dimension]).collect())
            }
            EmbedFault::Unavailable => {
                Err(EmbeddingError::Unavailable("connection refused".to_string()))
            }
        }
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        "faulty"
    }
}

/// Extractor that reads the payload as UTF-8 text.
///
/// Payloads may start with a directive:
/// - `!fail <message>` fails with a corrupt-file error carrying the message
/// - `!slow <text>` waits for the configured delay before returning the text
#[derive(Debug, Clone)]
pub struct ScriptedExtractor {
    delay: Duration,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self {
            delay: Duration::from_millis(200),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for ScriptedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, document: &Document) -> Result<String, ExtractionError> {
        let text = String::from_utf8_lossy(&document.payload).to_string();

        if let Some(message) = text.strip_prefix("!fail ") {
            return Err(ExtractionError::Corrupt {
                filename: document.filename.clone(),
                message: message.to_string(),
            });
        }
        if let Some(rest) = text.strip_prefix("!slow ") {
            tokio::time::sleep(self.delay).await;
            return Ok(rest.to_string());
        }
        Ok(text)
    }
}

/// Generator that echoes its context so tests can see what it was given.
#[derive(Debug, Default)]
pub struct EchoGenerator {
    calls: AtomicUsize,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerGenerator for EchoGenerator {
    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let first = context.first().map(|c| c.text.as_str()).unwrap_or_default();
        Ok(format!("{} ({} chunks): {}", question, context.len(), first))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Generator whose service is always down.
#[derive(Debug, Default)]
pub struct UnavailableGenerator;

#[async_trait]
impl AnswerGenerator for UnavailableGenerator {
    async fn generate(&self, _question: &str, _context: &[Chunk]) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
