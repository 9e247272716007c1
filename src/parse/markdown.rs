//! Markdown parsing and text extraction

use super::{normalize_whitespace, ParsedDocument};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// Parse Markdown content into plain text, keeping block structure as line breaks
pub fn parse_markdown(content: &str) -> ParsedDocument {
    let mut text = String::with_capacity(content.len());
    let mut title: Option<String> = None;
    let mut heading: Option<(HeadingLevel, String)> = None;

    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some((level, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, heading_text)) = heading.take() {
                    let heading_text = heading_text.trim().to_string();
                    if title.is_none() && level == HeadingLevel::H1 && !heading_text.is_empty() {
                        title = Some(heading_text.clone());
                    }
                    text.push_str("\n\n");
                    text.push_str(&heading_text);
                    text.push_str("\n\n");
                }
            }
            Event::Text(t) | Event::Code(t) => match heading.as_mut() {
                Some((_, heading_text)) => heading_text.push_str(&t),
                None => text.push_str(&t),
            },
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::CodeBlock)
            | Event::End(TagEnd::BlockQuote(_)) => text.push_str("\n\n"),
            Event::End(TagEnd::Item) | Event::End(TagEnd::TableRow) => text.push('\n'),
            Event::End(TagEnd::TableCell) => text.push_str(" | "),
            _ => {}
        }
    }

    ParsedDocument {
        title,
        text: normalize_whitespace(&text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markdown_title_and_text() {
        let md = "# Funding Schemes\n\nThe **SISFS** scheme supports startups.\n\n## Eligibility\n\n- DPIIT recognised\n- Under 2 years old\n";
        let doc = parse_markdown(md);

        assert_eq!(doc.title, Some("Funding Schemes".to_string()));
        assert!(doc.text.contains("The SISFS scheme supports startups."));
        assert!(doc.text.contains("Eligibility"));
        assert!(doc.text.contains("DPIIT recognised\nUnder 2 years old"));
        assert!(!doc.text.contains("**"));
    }
}
