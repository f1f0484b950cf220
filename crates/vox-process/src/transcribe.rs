//! Speech to text through the Whisper CLI.

use crate::error::{ProcessError, ProcessResult};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// A timed span of transcribed speech.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

/// Whisper invocation settings.
#[derive(Debug, Clone)]
pub struct WhisperOptions {
    /// Model size: tiny, base, small, medium, large.
    pub model: String,
    /// Spoken language hint. Empty lets Whisper detect it.
    pub language: String,
}

impl Default for WhisperOptions {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WhisperJsonOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    text: String,
    start: f64,
    end: f64,
}

/// Transcribe an audio file.
///
/// Requires the `whisper` CLI (pip install openai-whisper). The JSON transcript
/// is written into `output_dir`, which the caller owns.
pub fn transcribe_audio(
    audio_path: &Path,
    options: &WhisperOptions,
    output_dir: &Path,
) -> ProcessResult<Vec<TranscriptSegment>> {
    if !audio_path.exists() {
        return Err(ProcessError::FileNotFound(audio_path.to_path_buf()));
    }

    if which::which("whisper").is_err() {
        return Err(ProcessError::ToolNotFound {
            tool: "whisper".to_string(),
        });
    }

    info!("Transcribing {:?} with model '{}'", audio_path, options.model);

    let mut command = Command::new("whisper");
    command
        .arg(audio_path)
        .args(["--model", options.model.as_str()])
        .args(["--output_format", "json"])
        .arg("--output_dir")
        .arg(output_dir);
    if !options.language.is_empty() {
        command.args(["--language", options.language.as_str()]);
    }

    let output = command.output()?;
    if !output.status.success() {
        return Err(ProcessError::TranscriptionError(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    let stem = audio_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let json_path = output_dir.join(format!("{}.json", stem));

    if !json_path.exists() {
        return Err(ProcessError::TranscriptionError(
            "Whisper output file not found".to_string(),
        ));
    }

    let segments = parse_whisper_json(&std::fs::read_to_string(&json_path)?)?;
    debug!("Transcribed {} segments", segments.len());
    Ok(segments)
}

/// Parse Whisper's JSON transcript. Blank segments are dropped.
pub fn parse_whisper_json(json: &str) -> ProcessResult<Vec<TranscriptSegment>> {
    let output: WhisperJsonOutput = serde_json::from_str(json)
        .map_err(|e| ProcessError::ParseError(format!("Failed to parse Whisper output: {}", e)))?;

    Ok(output
        .segments
        .into_iter()
        .map(|s| TranscriptSegment {
            text: s.text.trim().to_string(),
            start: s.start,
            end: s.end,
        })
        .filter(|s| !s.text.is_empty())
        .collect())
}

/// Join segments into one transcript, one segment per line.
pub fn segments_to_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whisper_json() {
        let json = r#"{
            "text": " Q: pricing is too high. A: we plan to lower prices.",
            "segments": [
                {"id": 0, "text": " Q: pricing is too high.", "start": 0.0, "end": 2.5},
                {"id": 1, "text": "   ", "start": 2.5, "end": 3.0},
                {"id": 2, "text": " A: we plan to lower prices.", "start": 3.0, "end": 5.0}
            ],
            "language": "en"
        }"#;

        let segments = parse_whisper_json(json).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Q: pricing is too high.");
        assert_eq!(segments[1].start, 3.0);
        assert_eq!(
            segments_to_text(&segments),
            "Q: pricing is too high.\nA: we plan to lower prices."
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_whisper_json("not json"),
            Err(ProcessError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = transcribe_audio(
            &dir.path().join("missing.wav"),
            &WhisperOptions::default(),
            dir.path(),
        );
        assert!(matches!(result, Err(ProcessError::FileNotFound(_))));
    }
}
