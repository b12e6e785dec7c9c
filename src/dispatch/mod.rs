//! # Message dispatch: mailbox registry, routing, and draining.
//!
//! The [`Dispatcher`] owns every mailbox in the node. A mailbox is a
//! per-addressee bounded FIFO queue with exactly one draining task that
//! feeds each dequeued envelope to the mailbox's [`Receive`] callback, in
//! arrival order, until the mailbox is closed and drained.
//!
//! ## Architecture
//! ```text
//! sender ──► Dispatcher::send(src, dst, msg, block)
//!               │  read-lock lookup: dst → (queue, close token)
//!               ▼
//!        [bounded FIFO queue]  ──►  drain task ──► Receive::on_message(env)
//!               ▲                      (one per mailbox)
//!               │
//!        Dispatcher::remove_mailbox(dst): close + unregister;
//!        the drain consumes the backlog, then exits.
//! ```
//!
//! ## Rules
//! - At most one draining task per mailbox.
//! - Delivery to a single mailbox is strictly FIFO by arrival.
//! - A receiver that blocks forever stalls only its own mailbox.
//! - All failures are typed [`DispatchError`](crate::DispatchError) values;
//!   dispatcher operations never panic the caller.

mod dispatcher;
mod mailbox;
mod receive;

pub use dispatcher::Dispatcher;
pub use receive::{Receive, ReceiveFn};
