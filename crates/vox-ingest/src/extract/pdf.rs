//! PDF text extraction.

use tracing::debug;
use vox_core::ExtractionError;

pub(super) fn extract_pdf(bytes: &[u8], filename: &str) -> Result<String, ExtractionError> {
    let raw = pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Corrupt {
        filename: filename.to_string(),
        message: format!("Failed to extract text from PDF: {}", e),
    })?;

    let text = clean_pdf_text(&raw);
    debug!("Extracted {} characters from {}", text.len(), filename);
    Ok(text)
}

/// Trim lines, collapse blank runs and turn form feeds into paragraph breaks.
pub fn clean_pdf_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.split(['\n', '\x0C']).map(str::trim) {
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_pdf_text() {
        let messy = "  Hello  \n\n\n\nWorld  \n\nTest\n\n";
        assert_eq!(clean_pdf_text(messy), "Hello\n\nWorld\n\nTest");
    }

    #[test]
    fn test_form_feed_page_breaks() {
        assert_eq!(clean_pdf_text("page one\x0Cpage two"), "page one\npage two");
        assert_eq!(clean_pdf_text("\x0C\x0C  \n"), "");
    }
}
