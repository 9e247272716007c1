//! HTML text extraction

use super::{normalize_whitespace, ParsedDocument};
use scraper::{Html, Selector};

/// Parse an HTML document into readable text
pub fn parse_html(content: &str) -> ParsedDocument {
    let document = Html::parse_document(content);
    let mut doc = ParsedDocument::new(String::new());

    if let Ok(selector) = Selector::parse("title") {
        doc.title = document
            .select(&selector)
            .next()
            .map(|elem| elem.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty());
    }

    // Render only the body so the <title> text is not repeated in the content
    let body_selector = Selector::parse("body").ok();
    let root = body_selector
        .as_ref()
        .and_then(|s| document.select(s).next())
        .map(|e| e.html())
        .unwrap_or_else(|| content.to_string());

    let rendered = html2text::from_read(root.as_bytes(), 100).unwrap_or_else(|_| root.clone());
    doc.text = normalize_whitespace(&rendered);
    doc
}
