//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl Config {
    /// Load configuration from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, Self::default_config_string()).map_err(write_err)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        self.chunking.short.validate("short")?;
        self.chunking.long.validate("long")?;

        if self.ollama.embedding_dimension == 0 {
            return Err(ConfigError::Invalid(
                "ollama.embedding_dimension must be greater than zero".to_string(),
            ));
        }
        if self.processing.max_concurrent_jobs == 0 {
            return Err(ConfigError::Invalid(
                "processing.max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        if self.processing.embed_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "processing.embed_batch_size must be at least 1".to_string(),
            ));
        }
        if self.retrieval.default_k == 0 || self.retrieval.qa_k == 0 || self.retrieval.summary_k == 0 {
            return Err(ConfigError::Invalid(
                "retrieval k values must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# vox configuration
# Upload documents, recordings and videos; ask questions about them.

[server]
host = "127.0.0.1"
port = 8000
# Largest accepted upload in bytes
max_upload_size = 536870912

[ollama]
# Ollama server address
host = "http://localhost:11434"

# Model used to answer questions
model = "llama3.2"

# Model for generating embeddings, and the size of its vectors
embedding_model = "nomic-embed-text"
embedding_dimension = 768

# Request timeout in seconds
timeout_seconds = 120

# Chunk windows. unit is "chars" or "words"; overlap must be smaller than size.
# Short windows answer precise questions, long windows feed summaries.
[chunking.short]
unit = "chars"
size = 1000
overlap = 150

[chunking.long]
unit = "chars"
size = 2500
overlap = 300

[retrieval]
# Results returned by plain search
default_k = 3
# Chunks handed to the model in qa and summary mode
qa_k = 6
summary_k = 30
# Questions containing any of these words are answered in summary mode
summary_keywords = ["summarize", "overview", "elaborate", "explain", "detailed"]

[processing]
# Uploads processed at the same time
max_concurrent_jobs = 2

# Whisper model size: tiny, base, small, medium, large
whisper_model = "base"
whisper_language = "en"

# Chunks sent to the embedding model per request
embed_batch_size = 16

# Timeouts in seconds
extract_timeout_seconds = 1800
embed_timeout_seconds = 120
generate_timeout_seconds = 300
"#
        .to_string()
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_size: 512 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Ollama model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dimension: 768,
            timeout_seconds: 120,
        }
    }
}

/// Unit a chunk window is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowUnit {
    Chars,
    Words,
}

/// Size and overlap of one chunk window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub unit: WindowUnit,
    pub size: usize,
    pub overlap: usize,
}

impl WindowConfig {
    pub fn chars(size: usize, overlap: usize) -> Self {
        Self {
            unit: WindowUnit::Chars,
            size,
            overlap,
        }
    }

    pub fn words(size: usize, overlap: usize) -> Self {
        Self {
            unit: WindowUnit::Words,
            size,
            overlap,
        }
    }

    pub fn validate(&self, profile: &str) -> ConfigResult<()> {
        if self.size == 0 || self.overlap >= self.size {
            return Err(ConfigError::InvalidWindow {
                profile: profile.to_string(),
                size: self.size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

/// Short and long chunk windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub short: WindowConfig,
    pub long: WindowConfig,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            short: WindowConfig::chars(1000, 150),
            long: WindowConfig::chars(2500, 300),
        }
    }
}

/// Retrieval and question answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_k: usize,
    pub qa_k: usize,
    pub summary_k: usize,
    pub summary_keywords: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: 3,
            qa_k: 6,
            summary_k: 30,
            summary_keywords: ["summarize", "overview", "elaborate", "explain", "detailed"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Content processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub max_concurrent_jobs: usize,
    pub whisper_model: String,
    pub whisper_language: String,
    pub embed_batch_size: usize,
    pub extract_timeout_seconds: u64,
    pub embed_timeout_seconds: u64,
    pub generate_timeout_seconds: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            whisper_model: "base".to_string(),
            whisper_language: "en".to_string(),
            embed_batch_size: 16,
            extract_timeout_seconds: 1800,
            embed_timeout_seconds: 120,
            generate_timeout_seconds: 300,
        }
    }
}

impl ProcessingConfig {
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_seconds)
    }

    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_seconds)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.chunking.short, WindowConfig::chars(1000, 150));
        assert_eq!(config.chunking.long, WindowConfig::chars(2500, 300));
        assert_eq!(config.processing.max_concurrent_jobs, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_string_matches_defaults() {
        let parsed: Config = toml::from_str(&Config::default_config_string()).unwrap();
        let defaults = Config::default();

        assert_eq!(parsed.server.port, defaults.server.port);
        assert_eq!(parsed.server.max_upload_size, defaults.server.max_upload_size);
        assert_eq!(parsed.ollama.embedding_dimension, defaults.ollama.embedding_dimension);
        assert_eq!(parsed.chunking.short, defaults.chunking.short);
        assert_eq!(parsed.chunking.long, defaults.chunking.long);
        assert_eq!(parsed.retrieval.summary_keywords, defaults.retrieval.summary_keywords);
        assert_eq!(parsed.processing.embed_batch_size, defaults.processing.embed_batch_size);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            [ollama]
            model = "mistral"

            [chunking.short]
            unit = "words"
            size = 10
            overlap = 2
            "#
        )
        .unwrap();

        let config = Config::load_from(temp_file.path()).unwrap();

        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.chunking.short, WindowConfig::words(10, 2));
        // Defaults should still work
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.chunking.long, WindowConfig::chars(2500, 300));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let mut config = Config::default();
        config.chunking.long = WindowConfig::words(10, 10);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindow { ref profile, .. }) if profile == "long"
        ));

        config.chunking.long = WindowConfig::words(0, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[processing]\nmax_concurrent_jobs = 0").unwrap();
        assert!(matches!(
            Config::load_from(temp_file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_default_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_default_file(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.port, 8000);
        assert_eq!(loaded.retrieval.default_k, Config::default().retrieval.default_k);
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[server\nport = 1").unwrap();

        let err = Config::load_from(temp_file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&temp_file.path().display().to_string()));
    }
}
