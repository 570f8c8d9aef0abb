// Plain-text documents produced by the crawler and the upload parsers


use serde::{Deserialize, Serialize};

/// Where a document came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Source URL for crawled pages, file name (or archive member path) for uploads
    pub origin: String,
    /// First path segment of a crawled page, or the page label of a PDF
    pub section: Option<String>,
}

/// A unit of plain text ready for chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    #[inline]
    pub fn new(text: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: DocumentMetadata {
                origin: origin.into(),
                section: None,
            },
        }
    }

    #[inline]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.metadata.section = Some(section.into());
        self
    }

    #[inline]
    pub fn origin(&self) -> &str {
        &self.metadata.origin
    }

    /// True when the document carries no indexable text
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
