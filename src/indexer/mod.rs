// Indexer module
// Runs embedding generation in the background, one run at a time

pub mod gate;
pub mod generator;

#[cfg(test)]
mod tests;

use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub use gate::{JobGate, JobGuard, JobStatus, RunOutcome, RunReport, StatusReport};
pub use generator::{EmbeddingGenerator, GenerationStats};

/// Run `work` on a background task while `guard` holds the gate.
///
/// The gate is released when the task ends, whether the run succeeded,
/// failed or panicked.
#[inline]
pub fn spawn_generation<F>(guard: JobGuard, work: F) -> JoinHandle<()>
where
    F: Future<Output = crate::Result<GenerationStats>> + Send + 'static,
{
    tokio::spawn(async move {
        let result = work.await;
        match &result {
            Ok(stats) => info!(
                "Embedding generation finished: {} documents, {} chunks, {} failed",
                stats.documents, stats.chunks, stats.failed_documents
            ),
            Err(e) => error!("Embedding generation aborted: {}", e),
        }
        guard.finish(&result);
    })
}
