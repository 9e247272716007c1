//! Plain text and CSV parsing

use super::{normalize_whitespace, ParsedDocument};

/// Parse plain text content
pub fn parse_plain_text(content: &str) -> ParsedDocument {
    let text = normalize_whitespace(content);

    let title = text
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.len() < 100)
        .map(str::to_string);

    ParsedDocument { title, text }
}

/// Render CSV content as one `", "`-joined line per row.
///
/// Quoted fields may contain commas, doubled quotes and newlines.
pub fn parse_csv(content: &str) -> ParsedDocument {
    let rows: Vec<String> = split_csv_rows(content)
        .into_iter()
        .filter(|fields| fields.iter().any(|f| !f.trim().is_empty()))
        .map(|fields| {
            fields
                .iter()
                .map(|f| f.trim())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect();

    ParsedDocument::new(rows.join("\n"))
}

fn split_csv_rows(content: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut fields));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        rows.push(fields);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text() {
        let text = "Startup India Seed Fund\n\nGrants up to 20 lakh.\n\nConvertible debt up to 50 lakh.";
        let doc = parse_plain_text(text);

        assert_eq!(doc.title, Some("Startup India Seed Fund".to_string()));
        assert!(doc.text.contains("Grants up to 20 lakh."));
    }

    #[test]
    fn test_no_title_for_long_first_line() {
        let text = "This is a very long first line that should not be considered a title because it exceeds the character limit we set for titles.";
        let doc = parse_plain_text(text);
        assert_eq!(doc.title, None);
    }

    #[test]
    fn test_parse_csv_rows() {
        let csv = "investor,sector,ticket\r\nBlume Ventures,SaaS,\"1,00,00,000\"\r\n\r\n";
        let doc = parse_csv(csv);
        assert_eq!(
            doc.text,
            "investor, sector, ticket\nBlume Ventures, SaaS, 1,00,00,000"
        );
    }

    #[test]
    fn test_parse_csv_quoted_quotes_and_newlines() {
        let csv = "name,notes\nAcme,\"says \"\"hi\"\"\nand bye\"";
        let doc = parse_csv(csv);
        assert_eq!(doc.text, "name, notes\nAcme, says \"hi\"\nand bye");
    }
}
