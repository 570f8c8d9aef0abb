// Embeddings module
// Sliding-window chunking and the Ollama-backed embedding/chat client

pub mod chunking;
pub mod ollama;

use anyhow::Result;
use async_trait::async_trait;

pub use chunking::{Chunk, ChunkingConfig, split_document};
pub use ollama::{ChatMessage, OllamaClient};

/// Dimension used when the embedding model is not in the lookup table
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;

/// Vector size produced by well-known embedding models
#[inline]
pub fn embedding_dimension_for_model(model: &str) -> usize {
    let name = model.split(':').next().unwrap_or(model);
    let name = name.rsplit('/').next().unwrap_or(name);

    match name {
        "all-minilm" => 384,
        "nomic-embed-text" => 768,
        "mxbai-embed-large" | "snowflake-arctic-embed" | "bge-large" => 1024,
        "bge-m3" => 1024,
        "text-embedding-ada-002" | "text-embedding-3-small" => 1536,
        "text-embedding-3-large" => 3072,
        _ => DEFAULT_EMBEDDING_DIMENSION,
    }
}

/// Turns text into vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Name of the model producing the vectors
    fn model_name(&self) -> &str;

    /// Embed every input; the output has one vector per input, in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Produces the assistant's reply to a conversation
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_resolve_to_their_dimension() {
        assert_eq!(embedding_dimension_for_model("nomic-embed-text:latest"), 768);
        assert_eq!(embedding_dimension_for_model("all-minilm:l6-v2"), 384);
        assert_eq!(embedding_dimension_for_model("mxbai-embed-large"), 1024);
        assert_eq!(
            embedding_dimension_for_model("openai/text-embedding-3-large"),
            3072
        );
    }

    #[test]
    fn unknown_models_use_default() {
        assert_eq!(
            embedding_dimension_for_model("my-custom-embedder"),
            DEFAULT_EMBEDDING_DIMENSION
        );
    }
}
