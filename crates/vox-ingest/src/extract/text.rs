//! Plain text and markdown.

use pulldown_cmark::{Event, Parser, Tag};
use vox_core::ExtractionError;

/// Decode a UTF-8 payload, dropping a leading byte-order mark.
pub fn decode_text(bytes: &[u8], filename: &str) -> Result<String, ExtractionError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ExtractionError::Corrupt {
        filename: filename.to_string(),
        message: format!("not valid UTF-8: {}", e),
    })?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Flatten markdown into readable text, keeping headings and code.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::End(Tag::Heading(..)) | Event::End(Tag::Paragraph) => text.push_str("\n\n"),
            Event::Start(Tag::CodeBlock(_)) => text.push_str("\n```\n"),
            Event::End(Tag::CodeBlock(_)) => text.push_str("```\n\n"),
            Event::Start(Tag::Item) => text.push_str("- "),
            Event::End(Tag::Item) | Event::End(Tag::List(_)) => text.push('\n'),
            Event::Text(t) => text.push_str(&t),
            Event::Code(code) => {
                text.push('`');
                text.push_str(&code);
                text.push('`');
            }
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            _ => {}
        }
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_bom() {
        let bytes = "\u{feff}hello".as_bytes();
        assert_eq!(decode_text(bytes, "a.txt").unwrap(), "hello");
    }

    #[test]
    fn test_markdown_structure() {
        let md = r#"# Meeting Notes

Discussed **pricing** with the team.

- lower the base tier
- keep `enterprise` as is

```
plan = "b"
```
"#;
        let text = markdown_to_text(md);
        assert!(text.starts_with("Meeting Notes\n\n"));
        assert!(text.contains("Discussed pricing with the team."));
        assert!(text.contains("- lower the base tier"));
        assert!(text.contains("`enterprise`"));
        assert!(text.contains("plan = \"b\""));
    }
}
