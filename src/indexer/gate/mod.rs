
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use super::GenerationStats;

/// Whether a generation run currently holds the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

/// Summary of the most recent finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents: usize,
    pub chunks: usize,
    pub failed_documents: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<RunReport>,
}

/// Process-wide single-flight gate for generation runs.
///
/// Only one `try_acquire` can win until the holder releases.
#[derive(Debug, Default)]
pub struct JobGate {
    active: AtomicBool,
    last_run: Mutex<Option<RunReport>>,
}

impl JobGate {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Become the exclusive holder; false when a run is already active
    #[inline]
    pub fn try_acquire(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub fn release(&self) {
        self.active.store(false, Ordering::Release);
    }

    #[inline]
    pub fn status(&self) -> JobStatus {
        if self.active.load(Ordering::Acquire) {
            JobStatus::Running
        } else {
            JobStatus::Idle
        }
    }

    #[inline]
    pub fn last_run(&self) -> Option<RunReport> {
        self.last_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[inline]
    pub fn report(&self) -> StatusReport {
        StatusReport {
            status: self.status(),
            last_run: self.last_run(),
        }
    }

    /// Acquire the gate as a guard that releases it on drop
    #[inline]
    pub fn try_acquire_owned(self: &Arc<Self>) -> Option<JobGuard> {
        if !self.try_acquire() {
            debug!("Generation gate is busy");
            return None;
        }

        Some(JobGuard {
            gate: Arc::clone(self),
            started_at: Utc::now(),
            finished: false,
        })
    }

    fn record(&self, report: RunReport) {
        *self.last_run.lock().unwrap_or_else(PoisonError::into_inner) = Some(report);
    }
}

/// Holds the gate for one run
#[derive(Debug)]
pub struct JobGuard {
    gate: Arc<JobGate>,
    started_at: DateTime<Utc>,
    finished: bool,
}

impl JobGuard {
    #[inline]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Record the run's outcome and release the gate
    #[inline]
    pub fn finish(mut self, result: &crate::Result<GenerationStats>) {
        let finished_at = Utc::now();
        let report = match result {
            Ok(stats) => RunReport {
                outcome: RunOutcome::Succeeded,
                started_at: self.started_at,
                finished_at,
                documents: stats.documents,
                chunks: stats.chunks,
                failed_documents: stats.failed_documents,
                error: None,
            },
            Err(e) => RunReport {
                outcome: RunOutcome::Failed,
                started_at: self.started_at,
                finished_at,
                documents: 0,
                chunks: 0,
                failed_documents: 0,
                error: Some(e.to_string()),
            },
        };

        self.gate.record(report);
        self.finished = true;
        self.gate.release();
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        warn!("Generation run ended without reporting an outcome");
        self.gate.record(RunReport {
            outcome: RunOutcome::Failed,
            started_at: self.started_at,
            finished_at: Utc::now(),
            documents: 0,
            chunks: 0,
            failed_documents: 0,
            error: Some("Run was interrupted".to_string()),
        });
        self.gate.release();
    }
}
