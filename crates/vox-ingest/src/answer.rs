//! Grounded question answering on top of retrieval.

use crate::error::RetrievalError;
use crate::retrieval::RetrievalEngine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use vox_config::{ProcessingConfig, RetrievalConfig};
use vox_core::{AnswerGenerator, Chunk, GenerationError, ScoredChunk, SpanClass};

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AskMode {
    /// Pick `qa` or `summary` from the wording of the question.
    #[default]
    Auto,
    /// Precise answers from short chunks.
    Qa,
    /// Broad answers from long chunks.
    Summary,
}

impl AskMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AskMode::Auto => "auto",
            AskMode::Qa => "qa",
            AskMode::Summary => "summary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(AskMode::Auto),
            "qa" => Some(AskMode::Qa),
            "summary" => Some(AskMode::Summary),
            _ => None,
        }
    }

    /// Resolve `auto` against the summary keywords.
    pub fn resolve(self, question: &str, summary_keywords: &[String]) -> AskMode {
        match self {
            AskMode::Auto => {
                let question = question.to_lowercase();
                if summary_keywords
                    .iter()
                    .any(|kw| question.contains(&kw.to_lowercase()))
                {
                    AskMode::Summary
                } else {
                    AskMode::Qa
                }
            }
            mode => mode,
        }
    }

    fn span(&self) -> SpanClass {
        match self {
            AskMode::Summary => SpanClass::Long,
            _ => SpanClass::Short,
        }
    }
}

impl std::fmt::Display for AskMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Answer to one question, with the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    /// The resolved mode, never `auto`.
    pub mode: AskMode,
    pub question: String,
    pub answer: Option<String>,
    pub retrieved_chunks: Vec<ScoredChunk>,
    /// Why `answer` is missing, when it is.
    pub degraded_reason: Option<String>,
}

/// Settings for [`AnswerService`].
#[derive(Debug, Clone)]
pub struct AskSettings {
    pub qa_k: usize,
    pub summary_k: usize,
    pub summary_keywords: Vec<String>,
    pub generate_timeout: Duration,
}

impl Default for AskSettings {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default(), &ProcessingConfig::default())
    }
}

impl AskSettings {
    pub fn from_config(retrieval: &RetrievalConfig, processing: &ProcessingConfig) -> Self {
        Self {
            qa_k: retrieval.qa_k,
            summary_k: retrieval.summary_k,
            summary_keywords: retrieval.summary_keywords.clone(),
            generate_timeout: processing.generate_timeout(),
        }
    }
}

/// Retrieves context for a question and hands it to the answer generator.
#[derive(Clone)]
pub struct AnswerService {
    retrieval: RetrievalEngine,
    generator: Arc<dyn AnswerGenerator>,
    settings: AskSettings,
}

impl AnswerService {
    pub fn new(
        retrieval: RetrievalEngine,
        generator: Arc<dyn AnswerGenerator>,
        settings: AskSettings,
    ) -> Self {
        Self {
            retrieval,
            generator,
            settings,
        }
    }

    pub fn retrieval(&self) -> &RetrievalEngine {
        &self.retrieval
    }

    /// Answer a question. Generator failures degrade the response instead of
    /// failing it; retrieval failures are returned as errors.
    pub async fn ask(
        &self,
        question: &str,
        mode: AskMode,
        k: Option<usize>,
    ) -> Result<AskResponse, RetrievalError> {
        let mode = mode.resolve(question, &self.settings.summary_keywords);
        let k = k.unwrap_or(match mode {
            AskMode::Summary => self.settings.summary_k,
            _ => self.settings.qa_k,
        });
        debug!("Asking in {} mode with k={}", mode, k);

        let retrieved = self
            .retrieval
            .retrieve_span(question, k, Some(mode.span()))
            .await?;

        let mut response = AskResponse {
            mode,
            question: question.to_string(),
            answer: None,
            retrieved_chunks: retrieved,
            degraded_reason: None,
        };

        if response.retrieved_chunks.is_empty() {
            response.degraded_reason = Some("No relevant content has been indexed yet".to_string());
            return Ok(response);
        }

        let context: Vec<Chunk> = response
            .retrieved_chunks
            .iter()
            .map(|hit| hit.chunk.clone())
            .collect();

        match self.generate(question, &context).await {
            Ok(answer) => response.answer = Some(answer),
            Err(err) => {
                warn!("Answer generation via {} failed: {}", self.generator.name(), err);
                response.degraded_reason = Some(err.to_string());
            }
        }
        Ok(response)
    }

    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String, GenerationError> {
        let limit = self.settings.generate_timeout;
        timeout(limit, self.generator.generate(question, context))
            .await
            .map_err(|_| GenerationError::Timeout {
                seconds: limit.as_secs(),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EchoGenerator, HashingEmbedder, UnavailableGenerator};
    use vox_core::IndexEntry;
    use vox_store::VectorIndex;

    const DIM: usize = 1024;

    fn keywords() -> Vec<String> {
        AskSettings::default().summary_keywords
    }

    fn engine(embedder: Arc<HashingEmbedder>, texts: &[(SpanClass, &str)]) -> RetrievalEngine {
        let index = Arc::new(VectorIndex::new(DIM));
        if !texts.is_empty() {
            let entries = texts
                .iter()
                .enumerate()
                .map(|(i, (span, text))| {
                    IndexEntry::new(Chunk::new("doc1", *span, i, *text), embedder.vector_for(text))
                })
                .collect();
            index.insert(entries).unwrap();
        }
        RetrievalEngine::new(embedder, index)
    }

    fn corpus() -> Vec<(SpanClass, &'static str)> {
        vec![
            (SpanClass::Short, "pricing is too high"),
            (SpanClass::Short, "onboarding was smooth"),
            (SpanClass::Long, "overall the interview covered pricing and onboarding"),
        ]
    }

    #[test]
    fn test_mode_resolution() {
        let kw = keywords();
        assert_eq!(AskMode::Auto.resolve("Please SUMMARIZE the call", &kw), AskMode::Summary);
        assert_eq!(AskMode::Auto.resolve("Give me an overview", &kw), AskMode::Summary);
        assert_eq!(AskMode::Auto.resolve("What about pricing?", &kw), AskMode::Qa);
        assert_eq!(AskMode::Qa.resolve("summarize", &kw), AskMode::Qa);
        assert_eq!(AskMode::from_str("Summary"), Some(AskMode::Summary));
        assert_eq!(AskMode::from_str("chat"), None);
    }

    #[tokio::test]
    async fn test_qa_uses_short_chunks() {
        let generator = Arc::new(EchoGenerator::new());
        let service = AnswerService::new(
            engine(Arc::new(HashingEmbedder::new(DIM)), &corpus()),
            generator.clone(),
            AskSettings::default(),
        );

        let response = service
            .ask("What did users say about pricing?", AskMode::Auto, None)
            .await
            .unwrap();

        assert_eq!(response.mode, AskMode::Qa);
        assert_eq!(response.retrieved_chunks.len(), 2);
        assert!(response
            .retrieved_chunks
            .iter()
            .all(|hit| hit.chunk.span == SpanClass::Short));
        assert_eq!(response.retrieved_chunks[0].chunk.text, "pricing is too high");
        assert!(response.answer.unwrap().contains("pricing is too high"));
        assert!(response.degraded_reason.is_none());
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_summary_uses_long_chunks() {
        let service = AnswerService::new(
            engine(Arc::new(HashingEmbedder::new(DIM)), &corpus()),
            Arc::new(EchoGenerator::new()),
            AskSettings::default(),
        );

        let response = service
            .ask("Summarize the interview", AskMode::Auto, Some(5))
            .await
            .unwrap();
        assert_eq!(response.mode, AskMode::Summary);
        assert_eq!(response.retrieved_chunks.len(), 1);
        assert_eq!(response.retrieved_chunks[0].chunk.span, SpanClass::Long);
    }

    #[tokio::test]
    async fn test_generator_failure_degrades() {
        let service = AnswerService::new(
            engine(Arc::new(HashingEmbedder::new(DIM)), &corpus()),
            Arc::new(UnavailableGenerator),
            AskSettings::default(),
        );

        let response = service.ask("pricing?", AskMode::Qa, Some(1)).await.unwrap();
        assert!(response.answer.is_none());
        assert_eq!(response.retrieved_chunks.len(), 1);
        assert!(response.degraded_reason.unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_no_chunks_skips_generator() {
        let generator = Arc::new(EchoGenerator::new());
        let service = AnswerService::new(
            engine(Arc::new(HashingEmbedder::new(DIM)), &[]),
            generator.clone(),
            AskSettings::default(),
        );

        let response = service.ask("anything", AskMode::Auto, None).await.unwrap();
        assert!(response.retrieved_chunks.is_empty());
        assert!(response.answer.is_none());
        assert!(response.degraded_reason.is_some());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_k_is_an_error() {
        let service = AnswerService::new(
            engine(Arc::new(HashingEmbedder::new(DIM)), &corpus()),
            Arc::new(EchoGenerator::new()),
            AskSettings::default(),
        );
        assert!(service.ask("pricing", AskMode::Qa, Some(0)).await.is_err());
    }
}
