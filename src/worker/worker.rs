//! # The worker capability contract.
//!
//! A [`Worker`] is an externally supplied unit of logic that runs to
//! completion or cancellation under the node's supervision. It communicates
//! with the rest of the system exclusively through the [`Services`] handle
//! it receives at start time.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;
use crate::node::Services;

/// Opaque worker configuration blob.
///
/// `start_worker` carries the configuration through the runtime undecoded;
/// its shape is private to the worker type, and decoding it is entirely the
/// worker's responsibility.
pub type RawConfig = serde_yaml::Value;

/// Shared handle to a worker instance.
pub type WorkerRef = Arc<dyn Worker>;

/// Asynchronous, cancellable, supervised unit of work.
///
/// Implementations must return promptly once `ctx` is cancelled; the runtime
/// never force-kills a worker task, so a body that ignores cancellation
/// stalls `stop_worker` indefinitely. That responsibility sits with the
/// worker, not the supervisor.
///
/// How the run ends determines the recorded exit classification — see
/// [`ExitCode`](crate::ExitCode). The worker itself only ever returns
/// `Ok(())` or a [`WorkerError`]; classification happens at the supervisory
/// boundary.
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use worknode::{RawConfig, Services, Worker, WorkerError};
///
/// struct Idler;
///
/// #[async_trait]
/// impl Worker for Idler {
///     async fn run(
///         &self,
///         ctx: CancellationToken,
///         _config: RawConfig,
///         _services: Services,
///     ) -> Result<(), WorkerError> {
///         ctx.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Executes the worker until completion or cancellation.
    ///
    /// - `ctx`: cooperative cancellation handle, signalled by `stop_worker`
    ///   or node shutdown; poll or await it at every suspension point.
    /// - `config`: the undecoded configuration blob from `start_worker`.
    /// - `services`: the runtime API bound to this worker's address.
    async fn run(
        &self,
        ctx: CancellationToken,
        config: RawConfig,
        services: Services,
    ) -> Result<(), WorkerError>;
}
