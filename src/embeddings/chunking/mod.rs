#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::documents::{Document, DocumentMetadata};

/// A window of document text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The window text
    pub text: String,
    /// Copy of the parent document's metadata
    pub metadata: DocumentMetadata,
    /// Start offset of the window in the parent text, in characters
    pub position: usize,
}

/// Configuration for content chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive windows; always smaller than `chunk_size`
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

impl ChunkingConfig {
    /// Distance between the start offsets of consecutive chunks
    #[inline]
    pub fn stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap).max(1)
    }
}

/// Split a document into overlapping fixed-size windows.
///
/// Offsets count characters, not bytes, so windows never cut a UTF-8 sequence.
/// The same text and config always produce the same boundaries.
#[inline]
pub fn split_document(document: &Document, config: &ChunkingConfig) -> Vec<Chunk> {
    let chars: Vec<char> = document.text.chars().collect();
    let size = config.chunk_size.max(1);
    let stride = config.stride();

    let mut chunks = Vec::with_capacity(expected_chunk_count(chars.len(), config));
    let mut start = 0;

    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(Chunk {
            text: chars[start..end].iter().collect(),
            metadata: document.metadata.clone(),
            position: start,
        });

        if end == chars.len() {
            break;
        }
        start += stride;
    }

    debug!(
        "Split '{}' ({} chars) into {} chunks",
        document.metadata.origin,
        chars.len(),
        chunks.len()
    );

    chunks
}

/// Number of chunks `split_document` yields for a text of `len` characters
#[inline]
pub fn expected_chunk_count(len: usize, config: &ChunkingConfig) -> usize {
    if len == 0 {
        return 0;
    }
    let size = config.chunk_size.max(1);
    if len <= size {
        return 1;
    }
    (len - size).div_ceil(config.stride()) + 1
}
