//! FFmpeg integration for pulling speech out of video files.

use crate::error::{ProcessError, ProcessResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Stream summary of a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Duration in seconds.
    pub duration: f64,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

impl MediaInfo {
    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
}

fn require_tool(tool: &str) -> ProcessResult<()> {
    which::which(tool)
        .map(|_| ())
        .map_err(|_| ProcessError::ToolNotFound {
            tool: tool.to_string(),
        })
}

/// Probe a media file's streams with ffprobe.
pub fn probe_media(path: &Path) -> ProcessResult<MediaInfo> {
    if !path.exists() {
        return Err(ProcessError::FileNotFound(path.to_path_buf()));
    }
    require_tool("ffprobe")?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()?;

    if !output.status.success() {
        return Err(ProcessError::FfmpegError(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    parse_probe_json(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_json(json: &str) -> ProcessResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| ProcessError::ParseError(format!("Failed to parse ffprobe output: {}", e)))?;

    let codec_of = |kind: &str| {
        probe
            .streams
            .iter()
            .find(|s| s.codec_type == kind)
            .map(|s| s.codec_name.clone().unwrap_or_else(|| "unknown".to_string()))
    };

    Ok(MediaInfo {
        duration: probe
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0),
        video_codec: codec_of("video"),
        audio_codec: codec_of("audio"),
    })
}

/// Extract the audio track of a video as 16 kHz mono WAV, the format Whisper expects.
///
/// Returns the path of the written file inside `output_dir`.
pub fn extract_audio(video_path: &Path, output_dir: &Path) -> ProcessResult<PathBuf> {
    if !video_path.exists() {
        return Err(ProcessError::FileNotFound(video_path.to_path_buf()));
    }
    require_tool("ffmpeg")?;

    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let audio_path = output_dir.join(format!("{}.wav", stem));

    info!("Extracting audio from {:?} to {:?}", video_path, audio_path);

    let output = Command::new("ffmpeg")
        .arg("-i")
        .arg(video_path)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1", "-y"])
        .arg(&audio_path)
        .output()?;

    if !output.status.success() {
        return Err(ProcessError::FfmpegError(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    debug!("Audio extracted successfully");
    Ok(audio_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_with_audio() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "codec_name": "h264"},
                {"codec_type": "audio", "codec_name": "aac"}
            ],
            "format": {"duration": "61.5"}
        }"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.duration, 61.5);
        assert_eq!(info.video_codec.as_deref(), Some("h264"));
        assert!(info.has_audio());
    }

    #[test]
    fn test_parse_probe_silent_video() {
        let json = r#"{"streams": [{"codec_type": "video"}], "format": {}}"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.duration, 0.0);
        assert_eq!(info.video_codec.as_deref(), Some("unknown"));
        assert!(!info.has_audio());
    }

    #[test]
    fn test_missing_video_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            extract_audio(&dir.path().join("nope.mp4"), dir.path()),
            Err(ProcessError::FileNotFound(_))
        ));
    }
}
