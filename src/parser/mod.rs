// Upload parsers
// Turn uploaded bytes (text, markdown, PDF or an archive of those) into documents


pub mod archive;
pub mod markdown;
pub mod pdf;

use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::documents::Document;

pub use archive::ArchiveKind;

#[derive(Debug, Error)]
pub enum ParseError {
    /// Unsupported content type, at the top level or inside an archive
    #[error("{0}")]
    InvalidFile(String),
    /// The archive container itself is unreadable
    #[error("The file uploaded is not a valid archive file: {0}")]
    ArchiveFormat(String),
    #[error("Error parsing file: {0}")]
    Processing(#[from] anyhow::Error),
}

/// Every input the parsers accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Text,
    Markdown,
    Pdf,
    Archive(ArchiveKind),
}

impl SourceKind {
    /// Kind of a top-level upload. A recognized content type wins; generic or
    /// missing content types fall back to the file extension.
    #[inline]
    pub fn detect(filename: &str, content_type: Option<&str>) -> Option<Self> {
        content_type
            .and_then(Self::from_content_type)
            .or_else(|| Self::from_name(filename))
    }

    #[inline]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/plain" => Some(Self::Text),
            "text/markdown" | "text/x-markdown" => Some(Self::Markdown),
            "application/pdf" => Some(Self::Pdf),
            "application/zip" | "application/x-zip-compressed" => {
                Some(Self::Archive(ArchiveKind::Zip))
            }
            "application/x-tar" => Some(Self::Archive(ArchiveKind::Tar)),
            "application/gzip" | "application/x-gzip" => Some(Self::Archive(ArchiveKind::Gzip)),
            _ => None,
        }
    }

    #[inline]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            return Some(Self::Archive(ArchiveKind::Gzip));
        }

        let extension = Path::new(&lower).extension()?.to_str()?.to_string();
        match extension.as_str() {
            "txt" | "text" => Some(Self::Text),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            "zip" => Some(Self::Archive(ArchiveKind::Zip)),
            "tar" => Some(Self::Archive(ArchiveKind::Tar)),
            "gz" => Some(Self::Archive(ArchiveKind::Gzip)),
            _ => None,
        }
    }

    #[inline]
    pub fn is_archive(self) -> bool {
        matches!(self, Self::Archive(_))
    }
}

/// Parse an uploaded file into documents.
///
/// No network access; the whole input is in `bytes`.
#[inline]
pub fn parse_upload(
    filename: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<Vec<Document>, ParseError> {
    let kind = SourceKind::detect(filename, content_type).ok_or_else(|| {
        ParseError::InvalidFile(format!(
            "Unsupported file type for '{}' (content type: {})",
            filename,
            content_type.unwrap_or("unknown")
        ))
    })?;

    debug!("Parsing '{}' as {:?}", filename, kind);

    let documents = match kind {
        SourceKind::Archive(archive_kind) => archive::extract(archive_kind, filename, bytes)?,
        leaf => parse_leaf(leaf, filename, bytes)?,
    };

    info!(
        "Parsed {} document(s) from uploaded file '{}'",
        documents.len(),
        filename
    );
    Ok(documents)
}

/// Parse a single non-archive input
#[inline]
pub fn parse_leaf(kind: SourceKind, origin: &str, bytes: &[u8]) -> Result<Vec<Document>, ParseError> {
    let documents = match kind {
        SourceKind::Text => vec![Document::new(decode_utf8(origin, bytes)?, origin)],
        SourceKind::Markdown => {
            let source = decode_utf8(origin, bytes)?;
            vec![Document::new(markdown::strip_markup(&source), origin)]
        }
        SourceKind::Pdf => pdf::extract_pages(origin, bytes)?,
        SourceKind::Archive(_) => {
            return Err(ParseError::InvalidFile(format!(
                "Nested archives are not supported: {}",
                origin
            )));
        }
    };

    Ok(documents.into_iter().filter(|d| !d.is_blank()).collect())
}

fn decode_utf8(origin: &str, bytes: &[u8]) -> Result<String, ParseError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| anyhow::anyhow!("'{}' is not valid UTF-8: {}", origin, e))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}
