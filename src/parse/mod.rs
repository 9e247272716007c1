//! Document parsing and text extraction
//!
//! This module handles:
//! - Plain text and CSV rendering
//! - Markdown and HTML text extraction
//! - PDF text extraction (feature `pdf`)
//! - Content type detection

mod html;
mod markdown;
mod pdf;
mod text;

pub use html::*;
pub use markdown::*;
pub use pdf::*;
pub use text::*;

use crate::error::Result;
use std::path::Path;

/// Content types we can parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    PlainText,
    Csv,
    Markdown,
    Html,
    Pdf,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension
    pub fn from_extension(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("txt") | Some("text") | Some("rst") => ContentType::PlainText,
            Some("csv") => ContentType::Csv,
            Some("md") | Some("markdown") | Some("mdx") => ContentType::Markdown,
            Some("html") | Some("htm") => ContentType::Html,
            Some("pdf") => ContentType::Pdf,
            _ => ContentType::Unknown,
        }
    }
}

/// Parsed document with extracted content
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Extracted title (if found)
    pub title: Option<String>,

    /// Main text content
    pub text: String,
}

impl ParsedDocument {
    pub fn new(text: String) -> Self {
        Self { title: None, text }
    }
}

/// Parse raw file bytes according to the file's extension.
///
/// Returns `Ok(None)` for content that should not be indexed (binary data
/// under a text extension, or PDFs when the `pdf` feature is off).
pub fn parse_bytes(path: &Path, data: &[u8]) -> Result<Option<ParsedDocument>> {
    let content_type = ContentType::from_extension(path);

    let doc = match content_type {
        ContentType::Pdf => return parse_pdf(data),
        _ if is_binary_content(data) => return Ok(None),
        ContentType::Csv => parse_csv(&String::from_utf8_lossy(data)),
        ContentType::Markdown => parse_markdown(&String::from_utf8_lossy(data)),
        ContentType::Html => parse_html(&String::from_utf8_lossy(data)),
        ContentType::PlainText | ContentType::Unknown => {
            parse_plain_text(&String::from_utf8_lossy(data))
        }
    };

    Ok(Some(doc))
}

/// Check if content appears to be binary
pub fn is_binary_content(data: &[u8]) -> bool {
    let check_len = std::cmp::min(data.len(), 8192);
    data[..check_len].iter().any(|&b| b == 0)
}

/// Check if file should be skipped based on extension
pub fn should_skip_file(path: &Path) -> bool {
    let skip_extensions = [
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "mp3", "mp4", "wav", "ogg",
        "webm", "avi", "mov", "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "exe", "dll", "so",
        "dylib", "bin", "woff", "woff2", "ttf", "otf", "eot", "pyc", "class", "o", "obj", "lock",
        "xlsx", "docx", "pptx",
    ];

    #[cfg(not(feature = "pdf"))]
    let skip_extensions = {
        let mut exts = skip_extensions.to_vec();
        exts.push("pdf");
        exts
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => skip_extensions.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Normalize whitespace in text, keeping paragraph breaks
pub fn normalize_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_whitespace = false;
    let mut newline_count = 0;

    for c in text.chars() {
        if c.is_whitespace() {
            if c == '\n' {
                newline_count += 1;
            }
            pending_whitespace = true;
            continue;
        }

        if pending_whitespace && !result.is_empty() {
            match newline_count {
                0 => result.push(' '),
                1 => result.push('\n'),
                _ => result.push_str("\n\n"),
            }
        }
        newline_count = 0;
        pending_whitespace = false;
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            ContentType::from_extension(Path::new("deck.PDF")),
            ContentType::Pdf
        );
        assert_eq!(
            ContentType::from_extension(Path::new("investors.csv")),
            ContentType::Csv
        );
        assert_eq!(
            ContentType::from_extension(Path::new("schemes.txt")),
            ContentType::PlainText
        );
        assert_eq!(
            ContentType::from_extension(Path::new("notes.md")),
            ContentType::Markdown
        );
        assert_eq!(
            ContentType::from_extension(Path::new("Makefile")),
            ContentType::Unknown
        );
    }

    #[test]
    fn test_normalize_whitespace() {
        let input = "  Hello   world\n\n\n\ntest\nline  ";
        assert_eq!(normalize_whitespace(input), "Hello world\n\ntest\nline");
    }

    #[test]
    fn test_should_skip_file() {
        assert!(should_skip_file(Path::new("logo.png")));
        assert!(should_skip_file(Path::new("archive.ZIP")));
        assert!(!should_skip_file(Path::new("schemes.txt")));
        assert!(!should_skip_file(Path::new("investors.csv")));
    }

    #[test]
    fn test_binary_text_file_is_not_indexed() {
        let doc = parse_bytes(Path::new("weird.txt"), &[b'a', 0x00, b'b']).unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn test_parse_bytes_dispatches_csv() {
        let doc = parse_bytes(Path::new("x.csv"), b"name,stage\nAcme,seed\n")
            .unwrap()
            .unwrap();
        assert!(doc.title.is_none());
        assert!(doc.text.contains("Acme, seed"));
    }
}
