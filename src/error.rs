//! Error types used by the worknode runtime.
//!
//! Four error families, one per boundary:
//!
//! - [`DispatchError`] — message routing and mailbox registry failures.
//! - [`NodeError`] — worker registry and lifecycle transition failures.
//! - [`WorkerError`] — errors reported by a worker body itself.
//! - [`TaskError`] — task-document decode and instruction execution failures.
//!
//! All families provide `as_label()` returning a short stable snake_case
//! label for logs and metrics. Every failure is returned to the caller as a
//! value; nothing in the runtime panics across an API boundary.

use std::time::Duration;

use thiserror::Error;

use crate::address::Address;

/// Errors produced by the dispatcher.
///
/// All variants are synchronous, local, and recoverable: the caller decides
/// whether to retry, pick another destination, or give up.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No mailbox is registered under the destination address.
    #[error("no mailbox registered at {0}")]
    UnknownAddress(Address),

    /// A mailbox already exists under the requested address.
    #[error("mailbox already registered at {0}")]
    DuplicateAddress(Address),

    /// The destination mailbox buffer is saturated (non-blocking send only).
    #[error("mailbox at {0} is full")]
    QueueFull(Address),

    /// The mailbox was closed while the send was in flight.
    #[error("mailbox at {0} is closed")]
    Closed(Address),
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::UnknownAddress(_) => "dispatch_unknown_address",
            DispatchError::DuplicateAddress(_) => "dispatch_duplicate_address",
            DispatchError::QueueFull(_) => "dispatch_queue_full",
            DispatchError::Closed(_) => "dispatch_closed",
        }
    }
}

/// Errors produced by the worker supervisor ([`Node`](crate::Node)).
///
/// Rejected transitions leave the worker record untouched: a failed
/// `start_worker`/`stop_worker`/`remove_worker` has no side effects.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum NodeError {
    /// The factory registry has no constructor for the requested type name.
    #[error("unknown worker type {0:?}")]
    UnknownWorkerType(String),

    /// No worker record exists at the address.
    #[error("no worker registered at {0}")]
    UnknownWorker(Address),

    /// A worker record already exists at the address.
    #[error("worker already registered at {0}")]
    DuplicateWorker(Address),

    /// `start_worker` was called on a worker that is already running.
    #[error("worker at {0} is already active")]
    AlreadyActive(Address),

    /// `stop_worker` was called on a worker that is not running.
    #[error("worker at {0} is not active")]
    NotActive(Address),

    /// `remove_worker` was called while the worker is still running.
    #[error("worker at {0} is still active; stop it first")]
    StillActive(Address),

    /// `shutdown` exceeded its grace period; some workers ignored cancellation.
    #[error("shutdown grace {grace:?} exceeded; stuck workers: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Addresses of workers that did not complete in time.
        stuck: Vec<Address>,
    },
}

impl NodeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            NodeError::UnknownWorkerType(_) => "node_unknown_worker_type",
            NodeError::UnknownWorker(_) => "node_unknown_worker",
            NodeError::DuplicateWorker(_) => "node_duplicate_worker",
            NodeError::AlreadyActive(_) => "node_already_active",
            NodeError::NotActive(_) => "node_not_active",
            NodeError::StillActive(_) => "node_still_active",
            NodeError::GraceExceeded { .. } => "node_grace_exceeded",
        }
    }
}

/// Errors a worker body reports back to the supervisor.
///
/// A worker returning any of these ends its run with
/// [`ExitCode::RuntimeError`](crate::ExitCode::RuntimeError); the error text
/// is recorded on the worker's status for operator-facing reporting.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The opaque configuration blob could not be decoded or was invalid.
    #[error("invalid worker configuration: {error}")]
    Config {
        /// The underlying error message.
        error: String,
    },

    /// The worker body failed while running.
    #[error("worker execution failed: {error}")]
    Execution {
        /// The underlying error message.
        error: String,
    },
}

impl WorkerError {
    /// Shorthand for a configuration error.
    pub fn config(error: impl Into<String>) -> Self {
        WorkerError::Config { error: error.into() }
    }

    /// Shorthand for an execution error.
    pub fn execution(error: impl Into<String>) -> Self {
        WorkerError::Execution { error: error.into() }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Config { .. } => "worker_config",
            WorkerError::Execution { .. } => "worker_execution",
        }
    }
}

/// Errors produced while decoding or executing a task document.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// The document was malformed, or a recognized instruction had missing
    /// or mistyped arguments. Surfaced before any instruction executes.
    #[error("task document decode failed: {0}")]
    Decode(#[from] serde_yaml::Error),

    /// Execution reached an instruction whose type the executor does not
    /// recognize. Unknown types survive decoding but are a hard failure to run.
    #[error("instruction {index} has unsupported type {type_name:?}")]
    UnsupportedInstruction {
        /// Zero-based position in the task's instruction list.
        index: usize,
        /// The unrecognized `type` value, if the instruction carried one.
        type_name: String,
    },

    /// A recognized instruction was rejected by the supervisor. Remaining
    /// instructions of the task were not executed.
    #[error("instruction {index} ({kind}) failed: {source}")]
    Instruction {
        /// Zero-based position in the task's instruction list.
        index: usize,
        /// Instruction type name, e.g. `start_worker`.
        kind: &'static str,
        /// The supervisor's rejection.
        #[source]
        source: NodeError,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Decode(_) => "task_decode",
            TaskError::UnsupportedInstruction { .. } => "task_unsupported_instruction",
            TaskError::Instruction { .. } => "task_instruction_rejected",
        }
    }
}
