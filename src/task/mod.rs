//! # Tasks: declarative worker-lifecycle instructions.
//!
//! A [`Task`] is an ordered list of [`Instruction`]s decoded from a YAML
//! document; the [`Executor`] drives a [`Node`](crate::Node) through them
//! strictly in sequence. This is the only control plane above the
//! supervisor.
//!
//! ## Document shape
//! ```yaml
//! - type: create_worker
//!   args:
//!     worker_type: echo
//!     worker_address: 6f2c0e32-6c4f-4a3e-9b1d-0f6b6a1c2d3e
//! - type: start_worker
//!   args:
//!     worker_address: 6f2c0e32-6c4f-4a3e-9b1d-0f6b6a1c2d3e
//!     worker_raw_config: { greeting: hello }
//! ```
//!
//! ## Rules
//! - The whole document decodes before anything executes; malformed or
//!   missing arguments of a recognized type are decode-time errors.
//! - Unrecognized `type` values are preserved as generic mappings (documents
//!   stay forward-compatible) but executing one is a hard failure.
//! - The first failing instruction aborts the remainder of the task; there
//!   is no rollback of earlier instructions' effects.

mod executor;
mod instruction;

pub use executor::Executor;
pub use instruction::{
    CreateWorkerArgs, Instruction, Lifecycle, RemoveWorkerArgs, StartWorkerArgs, StopWorkerArgs,
    Task,
};
