//! # Event subscribers: the observability extension point.
//!
//! A [`Subscribe`] implementation consumes the node's [`Event`](crate::Event)
//! stream — for logging, metrics, alerting, dashboards. Subscribers are
//! isolated from the runtime and from each other: each gets its own bounded
//! queue and worker task, a slow subscriber drops its own events rather than
//! delaying anyone, and a panicking subscriber is reported and survived.
//!
//! [`LogWriter`] is the built-in subscriber that forwards events to
//! `tracing`.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
