// Retrieval-augmented chat completion

pub mod prompt;


use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::database::{SearchHit, VectorStore};
use crate::embeddings::{ChatMessage, ChatModel, Embedder};
use crate::{RagError, Result};

/// A retrieved chunk cited by a completion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub content: String,
    /// Set when the chunk came from a crawled page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<SearchHit> for Reference {
    #[inline]
    fn from(hit: SearchHit) -> Self {
        let url = url::Url::parse(&hit.origin)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .map(|_| hit.origin);

        Self {
            content: hit.text,
            url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    pub message: String,
    pub references: Vec<Reference>,
}

/// Answers queries from the indexed collection
pub struct Assistant {
    embedder: Arc<dyn Embedder>,
    chat_model: Arc<dyn ChatModel>,
    store: Arc<dyn VectorStore>,
    collection: String,
    max_documents: usize,
    max_score_distance: Option<f32>,
}

impl Assistant {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            chat_model,
            store,
            collection: collection.into(),
            max_documents: 4,
            max_score_distance: None,
        }
    }

    #[inline]
    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self::new(
            embedder,
            chat_model,
            store,
            config.vector_store.collection_name.clone(),
        )
        .with_retrieval_limits(
            config.vector_store.max_documents_to_retrieve,
            config.vector_store.max_score_distance,
        )
    }

    #[inline]
    pub fn with_retrieval_limits(mut self, max_documents: usize, max_distance: Option<f32>) -> Self {
        self.max_documents = max_documents.max(1);
        self.max_score_distance = max_distance;
        self
    }

    /// Chunks nearest to `query`, closest first, beyond-cutoff hits dropped
    #[inline]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchHit>> {
        let vectors = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("No embedding returned for query".to_string()))?;

        let mut hits = self
            .store
            .similarity_search(&self.collection, &vector, self.max_documents)
            .await?;
        if let Some(max) = self.max_score_distance {
            hits.retain(|hit| hit.distance <= max);
        }

        debug!("Retrieved {} chunks for query", hits.len());
        Ok(hits)
    }

    /// Answer `query` given the earlier turns of the conversation
    #[inline]
    pub async fn complete(&self, query: &str, history: &[ChatMessage]) -> Result<Completion> {
        let hits = self.retrieve(query).await?;
        let messages = prompt::build_messages(query, history, &hits);

        let message = self
            .chat_model
            .complete(&messages)
            .await
            .map_err(|e| RagError::Network(format!("Chat model request failed: {:#}", e)))?;

        info!(
            "Completed query with {} ({} references)",
            self.chat_model.model_name(),
            hits.len()
        );
        Ok(Completion {
            message,
            references: hits.into_iter().map(Reference::from).collect(),
        })
    }
}
