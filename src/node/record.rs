//! # Per-worker bookkeeping.
//!
//! A [`WorkerRecord`] is the node's authoritative state for one worker:
//! the instance itself, its lifecycle status, and the handles the node uses
//! to cancel the run and observe its completion. Records are only ever
//! mutated by the node under its registry lock — never by the worker.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::address::Address;
use crate::worker::WorkerRef;

/// Classification of how a worker's run ended.
///
/// Assigned by the node's completion handling, never by the worker body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Returned cleanly after cancellation was requested, honoring it.
    Normal,
    /// Returned cleanly before any cancellation — the worker gave up early.
    Premature,
    /// Returned an explicit [`WorkerError`](crate::WorkerError).
    RuntimeError,
    /// The body panicked; the fault was caught at the supervisory boundary.
    Panic,
}

impl ExitCode {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExitCode::Normal => "normal",
            ExitCode::Premature => "premature",
            ExitCode::RuntimeError => "runtime_error",
            ExitCode::Panic => "panic",
        }
    }

    /// True for the exit codes treated as abnormal in operator-facing
    /// reporting (`RuntimeError` and `Panic`).
    pub fn is_abnormal(&self) -> bool {
        matches!(self, ExitCode::RuntimeError | ExitCode::Panic)
    }
}

/// Snapshot of a worker's lifecycle status.
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    /// True while a run is in flight.
    pub active: bool,
    /// How the most recent run ended; `None` before the first run completes.
    pub exit: Option<ExitCode>,
    /// Error text from the most recent abnormal exit.
    pub last_error: Option<String>,
    /// Wall-clock start of the most recent run.
    pub started_at: Option<SystemTime>,
    /// Wall-clock end of the most recent run.
    pub exited_at: Option<SystemTime>,
}

/// The node's registry entry for one worker.
pub(crate) struct WorkerRecord {
    /// Factory type name the instance was created from.
    pub(crate) type_name: Arc<str>,
    /// The worker instance; shared with the run task while active.
    pub(crate) worker: WorkerRef,
    /// Lifecycle status, mutated only under the node's registry lock.
    pub(crate) status: WorkerStatus,
    /// Cancellation handle for the in-flight run; `None` while inactive.
    pub(crate) cancel: Option<CancellationToken>,
    /// Completion signal for the in-flight run; `None` while inactive.
    pub(crate) done: Option<watch::Receiver<bool>>,
    /// Addresses of mailboxes the current run created via its services
    /// handle; drained by completion cleanup.
    pub(crate) owned_mailboxes: Arc<Mutex<HashSet<Address>>>,
}

impl WorkerRecord {
    /// Creates a fresh inactive record for a newly constructed instance.
    pub(crate) fn new(type_name: impl Into<Arc<str>>, worker: WorkerRef) -> Self {
        Self {
            type_name: type_name.into(),
            worker,
            status: WorkerStatus::default(),
            cancel: None,
            done: None,
            owned_mailboxes: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}
