// HTTP service
// Embedding generation endpoints, chat history CRUD and chat completions

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;


use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;

/// Open the stores, make sure the collection exists and serve until Ctrl-C
#[inline]
pub async fn serve(config: Config) -> Result<()> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::from_config(config).await?);

    state
        .generator
        .ensure_collection()
        .await
        .context("Failed to initialize the vector collection")?;
    info!(
        "Vector collection '{}' ready ({} dimensions)",
        state.generator.collection().name,
        state.generator.collection().dimension
    );

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
