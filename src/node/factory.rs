//! # Worker type registry.
//!
//! [`WorkerTypes`] maps a worker type name to a constructor producing a
//! fresh instance. The string key is intentional late binding: task
//! documents name worker types as data, and the set of deployable types is
//! assembled at runtime by the embedding application.
//!
//! Registries compose: a domain (say, one exchange's connectors) can ship
//! its own `WorkerTypes` and the application merges them into one.

use std::collections::HashMap;

use crate::error::NodeError;
use crate::worker::WorkerRef;

/// Constructor for one worker type.
///
/// Configuration is not passed here — instances receive their opaque config
/// blob at `start_worker` time.
pub type WorkerConstructor = Box<dyn Fn() -> WorkerRef + Send + Sync>;

/// Name → constructor registry consulted by
/// [`Node::create_worker`](crate::Node::create_worker).
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use worknode::{RawConfig, Services, WorkerFn, WorkerTypes};
///
/// let mut types = WorkerTypes::new();
/// types.register("idler", || {
///     WorkerFn::arc(
///         |ctx: CancellationToken, _config: RawConfig, _services: Services| async move {
///             ctx.cancelled().await;
///             Ok(())
///         },
///     )
/// });
/// assert!(types.contains("idler"));
/// ```
#[derive(Default)]
pub struct WorkerTypes {
    constructors: HashMap<String, WorkerConstructor>,
}

impl WorkerTypes {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor under `type_name`, replacing any previous one.
    pub fn register<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn() -> WorkerRef + Send + Sync + 'static,
    {
        self.constructors
            .insert(type_name.into(), Box::new(constructor));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, type_name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> WorkerRef + Send + Sync + 'static,
    {
        self.register(type_name, constructor);
        self
    }

    /// Absorbs every registration from `other` (its entries win on clash).
    pub fn merge(&mut self, other: WorkerTypes) {
        self.constructors.extend(other.constructors);
    }

    /// Instantiates a fresh worker of the named type.
    pub fn create(&self, type_name: &str) -> Result<WorkerRef, NodeError> {
        let constructor = self
            .constructors
            .get(type_name)
            .ok_or_else(|| NodeError::UnknownWorkerType(type_name.to_string()))?;
        Ok(constructor())
    }

    /// Returns true if `type_name` is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Returns the sorted list of registered type names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}
