//! # Function-backed worker (`WorkerFn`)
//!
//! [`WorkerFn`] wraps a closure `F: Fn(ctx, config, services) -> Fut`,
//! producing a fresh future per start. Each start owns its own state; shared
//! state between starts must be made explicit with an `Arc` inside the
//! closure.
//!
//! Primarily useful for tests and small embedders that don't want a named
//! worker struct per behavior.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;
use crate::node::Services;
use crate::worker::worker::{RawConfig, Worker};

/// Function-backed [`Worker`] implementation.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use worknode::{RawConfig, Services, WorkerFn, WorkerRef};
///
/// let w: WorkerRef = WorkerFn::arc(
///     |ctx: CancellationToken, _config: RawConfig, _services: Services| async move {
///         ctx.cancelled().await;
///         Ok(())
///     },
/// );
/// ```
#[derive(Debug)]
pub struct WorkerFn<F> {
    f: F,
}

impl<F> WorkerFn<F> {
    /// Creates a new function-backed worker.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the worker and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Worker for WorkerFn<F>
where
    F: Fn(CancellationToken, RawConfig, Services) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkerError>> + Send + 'static,
{
    async fn run(
        &self,
        ctx: CancellationToken,
        config: RawConfig,
        services: Services,
    ) -> Result<(), WorkerError> {
        (self.f)(ctx, config, services).await
    }
}
