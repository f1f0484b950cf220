//! Ollama HTTP client.

use crate::error::{OllamaError, OllamaResult};
use crate::types::*;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;
use vox_config::OllamaConfig;

/// Client for interacting with Ollama's API.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Self::with_timeout(&config.host, Duration::from_secs(config.timeout_seconds))
    }

    /// Create a new client with the default timeout.
    pub fn new(host: impl Into<String>) -> OllamaResult<Self> {
        let host: String = host.into();
        Self::with_timeout(&host, Duration::from_secs(120))
    }

    fn with_timeout(host: &str, timeout: Duration) -> OllamaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OllamaError::Http)?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn send_error(&self, e: reqwest::Error) -> OllamaError {
        if e.is_connect() {
            OllamaError::ServerNotRunning {
                host: self.host.clone(),
            }
        } else if e.is_timeout() {
            OllamaError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            OllamaError::Http(e)
        }
    }

    async fn check_status(response: Response, model: &str) -> OllamaResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        if status.as_u16() == 404 || text.contains("not found") {
            return Err(OllamaError::ModelNotFound {
                model: model.to_string(),
            });
        }
        Err(OllamaError::ApiError {
            status: status.as_u16(),
            message: text,
        })
    }

    /// Check if Ollama server is available.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// List all available models.
    pub async fn list_models(&self) -> OllamaResult<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.host);
        debug!("Listing models from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = Self::check_status(response, "").await?;

        let list: ListModelsResponse = response.json().await?;
        Ok(list.models)
    }

    /// Check if a specific model is available.
    pub async fn has_model(&self, model: &str) -> OllamaResult<bool> {
        let models = self.list_models().await?;
        // Check both exact match and model without tag
        Ok(models
            .iter()
            .any(|m| m.name == model || m.name.starts_with(&format!("{}:", model))))
    }

    /// Embed a batch of texts in one request.
    pub async fn embed(&self, model: &str, texts: &[String]) -> OllamaResult<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.host);
        debug!("Embedding {} texts with model {}", texts.len(), model);

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest { model, input: texts })
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = Self::check_status(response, model).await?;

        let body: EmbedResponse = response.json().await?;
        Ok(body.embeddings)
    }

    /// Generate text (non-streaming).
    pub async fn generate(&self, request: GenerateRequest) -> OllamaResult<GenerateResponse> {
        let url = format!("{}/api/generate", self.host);
        debug!("Generating with model {}", request.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = Self::check_status(response, &request.model).await?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = OllamaConfig {
            host: "http://localhost:11434/".to_string(),
            ..OllamaConfig::default()
        };
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.host(), "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        // port 9 (discard) is closed on any sane test machine
        let client = OllamaClient::new("http://127.0.0.1:9").unwrap();
        assert!(!client.is_available().await);

        let err = client
            .embed("nomic-embed-text", &["hello".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, OllamaError::ServerNotRunning { .. }));
    }
}
