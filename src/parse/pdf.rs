//! PDF text extraction

use super::ParsedDocument;
use crate::error::Result;

/// Extract the text layer of a PDF
#[cfg(feature = "pdf")]
pub fn parse_pdf(data: &[u8]) -> Result<Option<ParsedDocument>> {
    use super::normalize_whitespace;
    use crate::error::Error;

    let raw = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| Error::Parse(format!("PDF extraction failed: {}", e)))?;

    Ok(Some(ParsedDocument::new(normalize_whitespace(&raw))))
}

/// PDF support is compiled out; PDFs are not indexed
#[cfg(not(feature = "pdf"))]
pub fn parse_pdf(_data: &[u8]) -> Result<Option<ParsedDocument>> {
    tracing::debug!("Skipping PDF: built without the `pdf` feature");
    Ok(None)
}
