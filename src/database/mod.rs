// Database module
// Vector collections (LanceDB or in-memory) plus SQLite chat history

#[cfg(test)]
mod tests;

pub mod lancedb;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::embeddings::Chunk;

pub use self::lancedb::LanceVectorStore;
pub use memory::MemoryVectorStore;
pub use sqlite::{Chat, ChatQueries, Database, Message, MessageQueries, Sender};

/// Metric used to rank similarity search results; smaller distances rank first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    #[default]
    L2,
    Dot,
}

impl DistanceMetric {
    /// Distance between two vectors of equal length, with the same
    /// conventions LanceDB uses (squared L2, `1 - cos`, `1 - dot`)
    #[inline]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Self::Dot => 1.0 - a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>(),
            Self::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 1.0;
                }
                1.0 - dot / (norm_a * norm_b)
            }
        }
    }
}

/// Shape of a collection: created once, never altered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub dimension: usize,
    pub distance: DistanceMetric,
}

/// One embedded chunk as stored in a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    /// URL or filename of the source document
    pub origin: String,
    pub section: Option<String>,
    /// Start offset of the chunk in its document, in characters
    pub position: u32,
    /// RFC 3339 timestamp
    pub created_at: String,
}

impl VectorRecord {
    #[inline]
    pub fn from_chunk(chunk: &Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vector,
            text: chunk.text.clone(),
            origin: chunk.metadata.origin.clone(),
            section: chunk.metadata.section.clone(),
            position: u32::try_from(chunk.position).unwrap_or(u32::MAX),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A stored chunk returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub origin: String,
    pub section: Option<String>,
    pub position: u32,
    pub distance: f32,
}

/// Collection lifecycle and the upsert/search contract the pipeline needs
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection unless it already exists. An existing collection
    /// with a different dimension is an error.
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<()>;

    /// Append records to an existing collection
    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// The `k` records nearest to `query`, closest first
    async fn similarity_search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>>;

    /// Number of records in the collection
    async fn count(&self, collection: &str) -> Result<usize>;
}
