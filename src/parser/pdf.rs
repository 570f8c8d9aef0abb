use anyhow::anyhow;
use tracing::debug;

use super::ParseError;
use crate::documents::Document;

/// Extract a PDF's text, one document per page when page breaks are present.
///
/// Split pages are labelled `page N` in the document section.
#[inline]
pub fn extract_pages(origin: &str, bytes: &[u8]) -> Result<Vec<Document>, ParseError> {
    // pdf-extract panics on some malformed documents
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| anyhow!("PDF extraction aborted for '{}'", origin))?
        .map_err(|e| anyhow!("PDF extraction failed for '{}': {}", origin, e))?;

    let documents = split_pages(origin, &text);
    debug!("Extracted {} page document(s) from '{}'", documents.len(), origin);
    Ok(documents)
}

/// Split extracted text on form feeds; text without any becomes one document
#[inline]
pub fn split_pages(origin: &str, text: &str) -> Vec<Document> {
    if !text.contains('\x0C') {
        return vec![Document::new(text.trim(), origin)];
    }

    text.split('\x0C')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(index, page)| {
            Document::new(page.trim(), origin).with_section(format!("page {}", index + 1))
        })
        .collect()
}
