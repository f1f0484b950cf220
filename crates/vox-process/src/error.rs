//! Error types for media processing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for processing operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Errors that can occur while running external media tools.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Tool not found: {tool}. Please install it.")]
    ToolNotFound { tool: String },

    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    #[error("Transcription error: {0}")]
    TranscriptionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ProcessError {
    /// Name of the missing tool, if this is a missing-tool error.
    pub fn missing_tool(&self) -> Option<&str> {
        match self {
            ProcessError::ToolNotFound { tool } => Some(tool),
            _ => None,
        }
    }
}
