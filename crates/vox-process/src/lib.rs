//! vox process - Media processing through external command-line tools.
//!
//! This crate provides:
//! - Audio track extraction and stream probing (via FFmpeg CLI)
//! - Speech transcription (via Whisper CLI)
//!
//! These rely on external tools being installed on the system.

mod error;
mod ffmpeg;
mod transcribe;

pub use error::{ProcessError, ProcessResult};
pub use ffmpeg::{extract_audio, probe_media, MediaInfo};
pub use transcribe::{
    parse_whisper_json, segments_to_text, transcribe_audio, TranscriptSegment, WhisperOptions,
};

/// Check which external tools are available.
pub fn check_dependencies() -> Vec<(&'static str, bool)> {
    vec![
        ("ffmpeg", which::which("ffmpeg").is_ok()),
        ("ffprobe", which::which("ffprobe").is_ok()),
        ("whisper", which::which("whisper").is_ok()),
    ]
}

/// Check if all required tools are installed.
pub fn all_tools_available() -> bool {
    check_dependencies().iter().all(|(_, available)| *available)
}
