
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::crawler::{Crawler, CrawlerConfig, crawl};
use crate::database::{CollectionSpec, VectorRecord, VectorStore};
use crate::documents::Document;
use crate::embeddings::{ChunkingConfig, Embedder, split_document};
use crate::{RagError, Result};

/// Totals for one generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Documents whose chunks were all stored
    pub documents: usize,
    /// Chunks stored
    pub chunks: usize,
    /// Documents skipped because embedding or storing them failed
    pub failed_documents: usize,
}

/// Chunks documents, embeds the chunks and appends them to the collection
pub struct EmbeddingGenerator {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: CollectionSpec,
    chunking: ChunkingConfig,
    crawler: CrawlerConfig,
    batch_size: usize,
}

impl EmbeddingGenerator {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: CollectionSpec,
        chunking: ChunkingConfig,
        crawler: CrawlerConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            collection,
            chunking,
            crawler,
            batch_size: batch_size.max(1),
        }
    }

    #[inline]
    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self::new(
            embedder,
            store,
            collection_spec(config),
            config.chunking.clone(),
            config.crawler.clone(),
            config.ollama.batch_size as usize,
        )
    }

    #[inline]
    pub fn collection(&self) -> &CollectionSpec {
        &self.collection
    }

    /// Create the target collection if it does not exist yet
    #[inline]
    pub async fn ensure_collection(&self) -> Result<()> {
        self.store.ensure_collection(&self.collection).await
    }

    /// Crawl from `url` and index every page the crawl yields
    #[inline]
    pub async fn generate_from_url(
        &self,
        url: &str,
        filter_domain: Option<&str>,
    ) -> Result<GenerationStats> {
        let crawler = crawl(url, filter_domain, &self.crawler)
            .map_err(|e| RagError::Crawler(format!("{:#}", e)))?;
        self.ensure_collection().await?;

        info!(
            "Generating embeddings from {} (scope: {})",
            url,
            crawler.scope()
        );
        let mut stats = GenerationStats::default();
        let mut crawler = Some(crawler);

        while let Some(current) = crawler.take() {
            let (document, current) = next_page(current).await?;
            let Some(document) = document else {
                break;
            };
            crawler = Some(current);
            self.record(&document, &mut stats).await;
        }

        info!(
            "Finished {}: {} documents, {} chunks, {} failed",
            url, stats.documents, stats.chunks, stats.failed_documents
        );
        Ok(stats)
    }

    /// Index one externally supplied document
    #[inline]
    pub async fn generate_from_text(&self, document: Document) -> Result<GenerationStats> {
        self.generate_from_documents(vec![document]).await
    }

    /// Index a batch of parsed documents, e.g. the contents of an upload
    #[inline]
    pub async fn generate_from_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<GenerationStats> {
        self.ensure_collection().await?;

        let mut stats = GenerationStats::default();
        for document in &documents {
            self.record(document, &mut stats).await;
        }

        info!(
            "Indexed {} of {} documents ({} chunks)",
            stats.documents,
            documents.len(),
            stats.chunks
        );
        Ok(stats)
    }

    async fn record(&self, document: &Document, stats: &mut GenerationStats) {
        match self.index_document(document).await {
            Ok(chunks) => {
                stats.documents += 1;
                stats.chunks += chunks;
            }
            Err(e) => {
                warn!("Skipping document '{}': {}", document.origin(), e);
                stats.failed_documents += 1;
            }
        }
    }

    /// Embed and store every chunk of one document; returns the chunk count.
    ///
    /// Nothing is stored unless every batch embeds successfully.
    #[inline]
    pub async fn index_document(&self, document: &Document) -> Result<usize> {
        if document.is_blank() {
            debug!("Document '{}' has no text", document.origin());
            return Ok(0);
        }

        let chunks = split_document(document, &self.chunking);
        let mut records = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self
                .embedder
                .embed(&texts)
                .await
                .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;

            if vectors.len() != batch.len() {
                return Err(RagError::Embedding(format!(
                    "Expected {} embeddings, received {}",
                    batch.len(),
                    vectors.len()
                )));
            }
            if let Some(bad) = vectors.iter().find(|v| v.len() != self.collection.dimension) {
                return Err(RagError::Embedding(format!(
                    "Model '{}' returned {} dimensions, collection '{}' expects {}",
                    self.embedder.model_name(),
                    bad.len(),
                    self.collection.name,
                    self.collection.dimension
                )));
            }

            records.extend(
                batch
                    .iter()
                    .zip(vectors)
                    .map(|(chunk, vector)| VectorRecord::from_chunk(chunk, vector)),
            );
        }

        let count = records.len();
        self.store.upsert(&self.collection.name, records).await?;
        debug!("Stored {} chunks from '{}'", count, document.origin());
        Ok(count)
    }
}

/// Target collection derived from the configuration
#[inline]
pub fn collection_spec(config: &Config) -> CollectionSpec {
    CollectionSpec {
        name: config.vector_store.collection_name.clone(),
        dimension: config.embedding_dimension(),
        distance: config.vector_store.distance,
    }
}

/// Advance the crawler on the blocking pool and hand it back
async fn next_page(mut crawler: Crawler) -> Result<(Option<Document>, Crawler)> {
    tokio::task::spawn_blocking(move || {
        let document = crawler.next();
        (document, crawler)
    })
    .await
    .map_err(|e| RagError::Crawler(format!("Crawler task failed: {}", e)))
}
