//! CLI command implementations.

pub mod check;
pub mod config;
pub mod init;
pub mod query;
pub mod serve;

use anyhow::{Context, Result};
use std::sync::Arc;
use vox_config::{AppPaths, Config};
use vox_ingest::{
    AnswerService, AskSettings, ChunkConfig, Chunker, IngestPipeline, MediaExtractor,
    PipelineSettings, RetrievalEngine,
};
use vox_ollama::{OllamaEmbedder, OllamaGenerator};

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// Load the config file, falling back to defaults before `vox init`.
pub fn load_config() -> Result<Config> {
    let paths = get_paths()?;
    Config::load_from(&paths.config_file)
        .with_context(|| format!("Failed to load {}", paths.config_file.display()))
}

/// Wire the pipeline and answer service to Ollama and the local media tools.
pub fn build_services(config: &Config) -> Result<(IngestPipeline, AnswerService)> {
    let embedder = OllamaEmbedder::from_config(&config.ollama)
        .context("Failed to create Ollama embedding client")?;
    let generator = OllamaGenerator::from_config(&config.ollama)
        .context("Failed to create Ollama generation client")?;
    let chunker = Chunker::new(ChunkConfig::from_chunking_config(&config.chunking))
        .context("Invalid chunking configuration")?;

    let pipeline = IngestPipeline::new(
        Arc::new(MediaExtractor::from_config(&config.processing)),
        Arc::new(embedder),
        chunker,
        PipelineSettings::from_config(&config.processing),
    );

    let retrieval = RetrievalEngine::new(pipeline.embedder().clone(), pipeline.index().clone())
        .with_timeout(config.processing.embed_timeout());
    let answers = AnswerService::new(
        retrieval,
        Arc::new(generator),
        AskSettings::from_config(&config.retrieval, &config.processing),
    );

    Ok((pipeline, answers))
}

/// Format a file size in human-readable form.
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_build_services_uses_configured_dimension() {
        let mut config = Config::default();
        config.ollama.embedding_dimension = 384;

        let (pipeline, _answers) = build_services(&config).unwrap();
        assert_eq!(pipeline.index().dimension(), 384);
        assert!(pipeline.index().is_empty());
    }
}
