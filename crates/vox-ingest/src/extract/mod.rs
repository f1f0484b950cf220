//! Text extraction for uploaded documents.
//!
//! Extraction is the only stage that touches external tools. Everything here
//! is blocking, so [`MediaExtractor`] moves the work onto tokio's blocking pool.

mod audio;
mod pdf;
mod text;
mod video;

pub use pdf::clean_pdf_text;
pub use text::{decode_text, markdown_to_text};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use vox_config::ProcessingConfig;
use vox_core::{Document, ExtractionError, MediaKind};
use vox_process::{ProcessError, WhisperOptions};

/// Turns a stored document into plain text.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, document: &Document) -> Result<String, ExtractionError>;
}

/// Extractor backed by pdf-extract, pulldown-cmark, ffmpeg and Whisper.
#[derive(Debug, Clone, Default)]
pub struct MediaExtractor {
    whisper: WhisperOptions,
}

impl MediaExtractor {
    pub fn new(whisper: WhisperOptions) -> Self {
        Self { whisper }
    }

    /// Create from the `[processing]` settings.
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self::new(WhisperOptions {
            model: config.whisper_model.clone(),
            language: config.whisper_language.clone(),
        })
    }

    fn extract_blocking(&self, document: &Document) -> Result<String, ExtractionError> {
        debug!(
            "Extracting {} ({}, {} bytes)",
            document.filename,
            document.kind,
            document.size()
        );

        match document.kind {
            MediaKind::Document => match document.extension().as_deref() {
                Some("pdf") => pdf::extract_pdf(&document.payload, &document.filename),
                Some("md") | Some("markdown") => {
                    let source = decode_text(&document.payload, &document.filename)?;
                    Ok(markdown_to_text(&source))
                }
                _ if document.payload.starts_with(b"%PDF") => {
                    pdf::extract_pdf(&document.payload, &document.filename)
                }
                _ => decode_text(&document.payload, &document.filename),
            },
            MediaKind::Audio => {
                let workdir = scratch_dir()?;
                let input = stage_payload(document, workdir.path())?;
                audio::transcribe(&input, &self.whisper, workdir.path())
            }
            MediaKind::Video => {
                let workdir = scratch_dir()?;
                let input = stage_payload(document, workdir.path())?;
                video::transcribe(&input, &document.filename, &self.whisper, workdir.path())
            }
        }
    }
}

#[async_trait]
impl Extractor for MediaExtractor {
    async fn extract(&self, document: &Document) -> Result<String, ExtractionError> {
        let extractor = self.clone();
        let document = document.clone();
        tokio::task::spawn_blocking(move || extractor.extract_blocking(&document))
            .await
            .map_err(|e| ExtractionError::Failed(format!("extraction task aborted: {}", e)))?
    }
}

fn scratch_dir() -> Result<tempfile::TempDir, ExtractionError> {
    tempfile::tempdir()
        .map_err(|e| ExtractionError::Failed(format!("cannot create scratch directory: {}", e)))
}

/// Write the payload where the external tools can read it. The client's
/// filename is only used for its extension.
fn stage_payload(document: &Document, dir: &Path) -> Result<PathBuf, ExtractionError> {
    let name = match document.extension() {
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => format!("input.{}", ext),
        _ => "input".to_string(),
    };
    let path = dir.join(name);
    std::fs::write(&path, &document.payload)
        .map_err(|e| ExtractionError::Failed(format!("cannot stage upload: {}", e)))?;
    Ok(path)
}

/// Map a media-tool failure onto the extraction taxonomy.
pub(crate) fn process_error(err: ProcessError) -> ExtractionError {
    if let Some(tool) = err.missing_tool() {
        return ExtractionError::ToolMissing {
            tool: tool.to_string(),
        };
    }
    ExtractionError::Failed(err.to_string())
}
