//! # Global runtime configuration.
//!
//! [`NodeConfig`] centralizes the node-wide settings: the shutdown grace
//! period and the event bus capacity. Per-mailbox buffer sizes are not
//! configured here — they are an argument of each `create_mailbox` call.
//!
//! ## Sentinel values
//! - `bus_capacity` below 1 is clamped to 1 by the bus.

use std::time::Duration;

/// Global configuration for a [`Node`](crate::Node).
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Maximum time [`Node::shutdown`](crate::Node::shutdown) waits for
    /// cancelled workers to complete before reporting them stuck.
    ///
    /// Workers are only ever cancelled cooperatively; a worker that ignores
    /// its cancellation token is reported in
    /// [`NodeError::GraceExceeded`](crate::NodeError::GraceExceeded) rather
    /// than force-killed.
    pub grace: Duration,

    /// Capacity of the event bus broadcast ring buffer.
    ///
    /// Subscribers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip the overwritten items. Minimum effective value is 1.
    pub bus_capacity: usize,
}

impl NodeConfig {
    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for NodeConfig {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}
