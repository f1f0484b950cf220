//! Ollama-backed implementations of the embedding and generation contracts.

use crate::client::OllamaClient;
use crate::error::OllamaResult;
use crate::rag::{build_rag_prompt, build_system_prompt};
use crate::types::{GenerateOptions, GenerateRequest};
use async_trait::async_trait;
use tracing::{debug, info};
use vox_config::OllamaConfig;
use vox_core::{AnswerGenerator, Chunk, EmbeddingError, EmbeddingGateway, GenerationError};

/// Embedding gateway backed by Ollama's /api/embed.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
        }
    }

    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Ok(Self::new(
            OllamaClient::from_config(config)?,
            &config.embedding_model,
            config.embedding_dimension,
        ))
    }

    /// One vector per text, each of the configured dimension.
    fn check_vectors(&self, sent: usize, vectors: &[Vec<f32>]) -> Result<(), EmbeddingError> {
        if vectors.len() != sent {
            return Err(EmbeddingError::CountMismatch {
                expected: sent,
                actual: vectors.len(),
            });
        }
        if let Some((i, v)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != self.dimension)
        {
            return Err(EmbeddingError::Malformed(format!(
                "{} returned a {}-dimensional vector at position {}, expected {}",
                self.model,
                v.len(),
                i,
                self.dimension
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingGateway for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.client.embed(&self.model, texts).await?;
        self.check_vectors(texts.len(), &vectors)?;
        debug!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Answer generator backed by Ollama's /api/generate.
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.2,
        }
    }

    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Ok(Self::new(OllamaClient::from_config(config)?, &config.model))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String, GenerationError> {
        let request = GenerateRequest::new(&self.model, build_rag_prompt(question, context))
            .with_system(build_system_prompt())
            .with_options(GenerateOptions::new().with_temperature(self.temperature));

        let response = self.client.generate(request).await?;
        info!(
            "Generated answer with {} ({} context chunks)",
            response.model,
            context.len()
        );
        Ok(response.response.trim().to_string())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        // nothing listens here; an empty batch must not try
        let client = OllamaClient::new("http://127.0.0.1:9").unwrap();
        let embedder = OllamaEmbedder::new(client, "nomic-embed-text", 768);

        assert!(embedder.embed(&[]).await.unwrap().is_empty());
        assert_eq!(embedder.dimension(), 768);
        assert_eq!(embedder.name(), "nomic-embed-text");
    }

    #[test]
    fn test_vectors_must_match_dimension() {
        let client = OllamaClient::new("http://127.0.0.1:9").unwrap();
        let embedder = OllamaEmbedder::new(client, "nomic-embed-text", 4);

        let good = vec![vec![0.1; 4], vec![0.2; 4]];
        assert!(embedder.check_vectors(2, &good).is_ok());

        let short = vec![vec![0.1; 4], vec![0.2; 3]];
        match embedder.check_vectors(2, &short) {
            Err(EmbeddingError::Malformed(msg)) => assert!(msg.contains("position 1")),
            other => panic!("expected Malformed, got {:?}", other),
        }

        assert!(matches!(
            embedder.check_vectors(3, &good),
            Err(EmbeddingError::CountMismatch { expected: 3, actual: 2 })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_generator_is_retryable() {
        let client = OllamaClient::new("http://127.0.0.1:9").unwrap();
        let generator = OllamaGenerator::new(client, "llama3.2").with_temperature(0.0);

        let context = vec![Chunk::new("doc", vox_core::SpanClass::Short, 0, "text")];
        let err = generator.generate("question?", &context).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
