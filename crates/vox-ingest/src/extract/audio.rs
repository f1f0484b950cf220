//! Audio transcription.

use super::process_error;
use std::path::Path;
use tracing::info;
use vox_core::ExtractionError;
use vox_process::{segments_to_text, transcribe_audio, WhisperOptions};

pub(super) fn transcribe(
    input: &Path,
    options: &WhisperOptions,
    workdir: &Path,
) -> Result<String, ExtractionError> {
    let segments = transcribe_audio(input, options, workdir).map_err(process_error)?;
    info!("Transcribed {} segments", segments.len());
    Ok(segments_to_text(&segments))
}
