use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::assistant::Assistant;
use crate::config::Config;
use crate::database::{Database, LanceVectorStore, VectorStore};
use crate::embeddings::{ChatModel, Embedder, OllamaClient};
use crate::indexer::{EmbeddingGenerator, JobGate};

/// Everything the request handlers share
pub struct AppState {
    pub config: Config,
    pub gate: Arc<JobGate>,
    pub generator: Arc<EmbeddingGenerator>,
    pub assistant: Assistant,
    pub database: Database,
}

impl AppState {
    #[inline]
    pub fn new(
        config: Config,
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
        store: Arc<dyn VectorStore>,
        database: Database,
    ) -> Self {
        let generator =
            EmbeddingGenerator::from_config(&config, Arc::clone(&embedder), Arc::clone(&store));
        let assistant = Assistant::from_config(&config, embedder, chat_model, store);

        Self {
            config,
            gate: Arc::new(JobGate::new()),
            generator: Arc::new(generator),
            assistant,
            database,
        }
    }

    /// Wire up Ollama, LanceDB and SQLite from the configuration
    #[inline]
    pub async fn from_config(config: Config) -> Result<Self> {
        let ollama = Arc::new(
            OllamaClient::new(&config.ollama).context("Failed to initialize Ollama client")?,
        );
        // Ollama may come up after the service does, so an unreachable server
        // only warns
        let probe = Arc::clone(&ollama);
        match tokio::task::spawn_blocking(move || probe.ping()).await {
            Ok(Ok(())) => info!("Ollama reachable at {}", ollama.base_url()),
            Ok(Err(e)) => warn!("Ollama is not reachable yet: {:#}", e),
            Err(e) => warn!("Ollama ping task failed: {}", e),
        }
        let store: Arc<dyn VectorStore> = Arc::new(
            LanceVectorStore::open(&config)
                .await
                .context("Failed to open vector store")?,
        );
        let database = Database::initialize_from_config_dir(config.get_base_dir())
            .await
            .context("Failed to open chat history database")?;

        Ok(Self::new(
            config,
            Arc::clone(&ollama) as Arc<dyn Embedder>,
            ollama,
            store,
            database,
        ))
    }
}
