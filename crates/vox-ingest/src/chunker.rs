//! Content chunking for retrieval.
//!
//! Every document is cut twice: once with the short window, used to answer
//! precise questions, and once with the long window, used for summaries.
//! Windows slide over words or characters; each chunk is a slice of the
//! extracted text, so offsets always point back into it.

use vox_config::{ChunkingConfig, ConfigResult, WindowConfig, WindowUnit};
use vox_core::{Chunk, SpanClass};

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub short: WindowConfig,
    pub long: WindowConfig,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::from_chunking_config(&ChunkingConfig::default())
    }
}

impl ChunkConfig {
    /// Create config from the `[chunking]` settings.
    pub fn from_chunking_config(config: &ChunkingConfig) -> Self {
        Self {
            short: config.short,
            long: config.long,
        }
    }
}

/// Content chunker for splitting text.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Create a chunker, rejecting windows whose overlap is not smaller than their size.
    pub fn new(config: ChunkConfig) -> ConfigResult<Self> {
        config.short.validate("short")?;
        config.long.validate("long")?;
        Ok(Self { config })
    }

    /// Split text into short chunks followed by long chunks, each group in source order.
    pub fn chunk(&self, text: &str, document_id: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return vec![];
        }

        let mut chunks = windows(text, document_id, SpanClass::Short, &self.config.short);
        chunks.extend(windows(text, document_id, SpanClass::Long, &self.config.long));
        chunks
    }
}

/// Byte ranges of the units a window counts.
fn unit_spans(text: &str, unit: WindowUnit) -> Vec<(usize, usize)> {
    match unit {
        WindowUnit::Chars => text
            .char_indices()
            .map(|(i, c)| (i, i + c.len_utf8()))
            .collect(),
        WindowUnit::Words => {
            let mut spans = Vec::new();
            let mut start: Option<usize> = None;
            for (i, c) in text.char_indices() {
                match (c.is_whitespace(), start) {
                    (true, Some(s)) => {
                        spans.push((s, i));
                        start = None;
                    }
                    (false, None) => start = Some(i),
                    _ => {}
                }
            }
            if let Some(s) = start {
                spans.push((s, text.len()));
            }
            spans
        }
    }
}

fn windows(text: &str, document_id: &str, span: SpanClass, window: &WindowConfig) -> Vec<Chunk> {
    let units = unit_spans(text, window.unit);
    // validated size > overlap, but never loop forever on a hand-built config
    let step = window.size.saturating_sub(window.overlap).max(1);
    let size = window.size.max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < units.len() {
        let end = (start + size).min(units.len());
        let (from, to) = (units[start].0, units[end - 1].1);
        let slice = &text[from..to];

        if !slice.trim().is_empty() {
            chunks.push(Chunk::new(document_id, span, chunks.len(), slice).with_offsets(from, to));
        }
        if end == units.len() {
            break;
        }
        start += step;
    }
    chunks
}
