//! # Worker supervision: registry, lifecycle, and fault containment.
//!
//! The [`Node`] owns the registry of worker instances. Each worker runs as
//! an independently scheduled tokio task; the node observes how every run
//! ends — clean return, early return, reported error, or panic — and records
//! a classified [`ExitCode`] on the worker's [`WorkerStatus`].
//!
//! Internal modules:
//! - `core`: the supervisor itself (`create/start/stop/remove`, completion
//!   handling, shutdown-with-grace);
//! - `record`: per-worker bookkeeping ([`WorkerStatus`], [`ExitCode`]);
//! - `services`: the [`Services`] handle a running worker uses to reach the
//!   runtime;
//! - `factory`: the [`WorkerTypes`] name → constructor registry.

mod core;
mod factory;
mod record;
mod services;

pub use core::Node;
pub use factory::{WorkerConstructor, WorkerTypes};
pub use record::{ExitCode, WorkerStatus};
pub use services::{Inbox, Services};
