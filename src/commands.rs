use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::{LanceVectorStore, VectorStore};
use crate::embeddings::{Embedder, OllamaClient};
use crate::indexer::{EmbeddingGenerator, GenerationStats, JobGate};
use crate::parser::parse_upload;

/// Start the HTTP service
#[inline]
pub async fn serve(port: Option<u16>) -> Result<()> {
    let mut config = Config::load_default()?;
    if let Some(port) = port {
        config.server.port = port;
    }

    crate::server::serve(config).await
}

/// Crawl a site in the foreground and index every page
#[inline]
pub async fn ingest_url(url: &str, filter_domain: Option<&str>) -> Result<()> {
    let config = Config::load_default()?;
    let generator = build_generator(&config).await?;

    let stats = run_exclusive(&format!("Crawling {}", url), async {
        generator.generate_from_url(url, filter_domain).await
    })
    .await?;

    print_stats(&stats);
    Ok(())
}

/// Parse a local file with the upload parsers and index its documents
#[inline]
pub async fn ingest_file(path: &Path) -> Result<()> {
    let config = Config::load_default()?;

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let documents = parse_upload(&filename, None, &bytes)?;
    if documents.is_empty() {
        warn!("No text found in {}", path.display());
        return Ok(());
    }
    println!("Parsed {} document(s) from {}", documents.len(), filename);

    let generator = build_generator(&config).await?;
    let stats = run_exclusive(&format!("Indexing {}", filename), async {
        generator.generate_from_documents(documents).await
    })
    .await?;

    print_stats(&stats);
    Ok(())
}

async fn build_generator(config: &Config) -> Result<EmbeddingGenerator> {
    let ollama = OllamaClient::new(&config.ollama)?;
    let probe = ollama.clone();
    tokio::task::spawn_blocking(move || probe.health_check())
        .await
        .context("Ollama health check panicked")?
        .context("Ollama is not reachable; check the [ollama] section of config.toml")?;

    let store: Arc<dyn VectorStore> = Arc::new(LanceVectorStore::open(config).await?);
    let embedder: Arc<dyn Embedder> = Arc::new(ollama);
    Ok(EmbeddingGenerator::from_config(config, embedder, store))
}

/// Run one generation under a gate, with a spinner when a terminal is attached
async fn run_exclusive<F>(label: &str, work: F) -> Result<GenerationStats>
where
    F: Future<Output = crate::Result<GenerationStats>>,
{
    let gate = Arc::new(JobGate::new());
    let Some(guard) = gate.try_acquire_owned() else {
        bail!("A process to generate embeddings is already in progress.");
    };

    let bar = if console::user_attended_stderr() {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    } else {
        ProgressBar::hidden()
    };
    bar.set_message(label.to_string());

    let result = work.await;
    bar.finish_and_clear();
    guard.finish(&result);

    let stats = result?;
    info!("{} finished", label);
    Ok(stats)
}

fn print_stats(stats: &GenerationStats) {
    println!("Embedding generation completed!");
    println!("  Documents indexed: {}", stats.documents);
    println!("  Chunks stored: {}", stats.chunks);
    if stats.failed_documents > 0 {
        println!("  Documents skipped after errors: {}", stats.failed_documents);
    }
}
