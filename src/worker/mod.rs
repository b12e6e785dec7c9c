//! # Worker abstractions.
//!
//! This module defines the capability contract every deployable worker
//! implements:
//! - [`Worker`] — trait for pluggable, cancellable units of work
//! - [`WorkerFn`] — function-backed worker implementation
//! - [`WorkerRef`] — shared handle (`Arc<dyn Worker>`)
//! - [`RawConfig`] — the opaque configuration blob handed to `run`
//!
//! Concrete worker bodies (exchange readers, transformers, storers, strategy
//! logic) live outside the runtime; they plug in through a
//! [`WorkerTypes`](crate::WorkerTypes) factory registry.

mod worker;
mod worker_fn;

pub use worker::{RawConfig, Worker, WorkerRef};
pub use worker_fn::WorkerFn;
