//! Video transcription: pull the audio track out with ffmpeg, then transcribe it.

use super::{audio, process_error};
use std::path::Path;
use tracing::debug;
use vox_core::ExtractionError;
use vox_process::{extract_audio, probe_media, WhisperOptions};

pub(super) fn transcribe(
    input: &Path,
    filename: &str,
    options: &WhisperOptions,
    workdir: &Path,
) -> Result<String, ExtractionError> {
    let info = probe_media(input).map_err(process_error)?;
    debug!(
        "Probed {}: duration={:?} video={:?} audio={:?}",
        filename, info.duration, info.video_codec, info.audio_codec
    );

    if !info.has_audio() {
        return Err(ExtractionError::NoText {
            filename: filename.to_string(),
        });
    }

    let wav = extract_audio(input, workdir).map_err(process_error)?;
    audio::transcribe(&wav, options, workdir)
}
