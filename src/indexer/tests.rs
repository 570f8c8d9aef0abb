use super::*;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::RagError;

#[tokio::test]
async fn gate_is_held_for_the_whole_run() {
    let gate = Arc::new(JobGate::new());
    let guard = gate.try_acquire_owned().expect("gate should be free");
    let (tx, rx) = oneshot::channel::<()>();

    let handle = spawn_generation(guard, async move {
        rx.await.ok();
        Ok(GenerationStats {
            documents: 2,
            chunks: 5,
            failed_documents: 0,
        })
    });

    assert_eq!(gate.status(), JobStatus::Running);
    assert!(gate.try_acquire_owned().is_none());

    tx.send(()).expect("run should be waiting");
    handle.await.expect("task should not panic");

    assert_eq!(gate.status(), JobStatus::Idle);
    let report = gate.last_run().expect("run should be recorded");
    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(report.documents, 2);
}

#[tokio::test]
async fn failed_run_releases_gate() {
    let gate = Arc::new(JobGate::new());
    let guard = gate.try_acquire_owned().expect("gate should be free");

    spawn_generation(guard, async {
        Err(RagError::Database("connection refused".to_string()))
    })
    .await
    .expect("task should not panic");

    assert_eq!(gate.status(), JobStatus::Idle);
    assert_eq!(
        gate.last_run().map(|r| r.outcome),
        Some(RunOutcome::Failed)
    );
    assert!(gate.try_acquire());
}
