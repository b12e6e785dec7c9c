//! # Runtime events: classification, metadata, and the broadcast bus.
//!
//! The runtime reports everything it does — worker lifecycle transitions,
//! mailbox registration, shutdown progress — as [`Event`]s published on a
//! [`Bus`]. Subscribers (see [`crate::subscribers`]) consume the stream for
//! logging, metrics, or alerting; the runtime itself never depends on anyone
//! listening.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
