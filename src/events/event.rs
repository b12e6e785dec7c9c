//! # Runtime events emitted by the node and dispatcher.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (timestamp, sequence number, address, exit code, reason). Events are
//! observability data only — no runtime decision is driven by them.
//!
//! ## Ordering
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Subscribers that receive events out of order can use `seq`
//! to restore it.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::address::Address;
use crate::node::ExitCode;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Worker lifecycle ===
    /// A worker record was created (inactive).
    ///
    /// Sets: `address`, `worker_type`.
    WorkerCreated,

    /// A worker run was launched.
    ///
    /// Sets: `address`, `worker_type`.
    WorkerStarting,

    /// A worker run ended cleanly (`ExitCode::Normal` or `Premature`).
    ///
    /// Sets: `address`, `exit`.
    WorkerStopped,

    /// A worker run ended with a reported error (`ExitCode::RuntimeError`).
    ///
    /// Sets: `address`, `exit`, `reason`.
    WorkerFailed,

    /// A worker body panicked; the fault was contained at the supervisory
    /// boundary (`ExitCode::Panic`).
    ///
    /// Sets: `address`, `exit`, `reason`.
    WorkerPanicked,

    /// A worker record was removed.
    ///
    /// Sets: `address`.
    WorkerRemoved,

    // === Mailboxes ===
    /// A mailbox was registered with the dispatcher.
    ///
    /// Sets: `address`.
    MailboxCreated,

    /// A mailbox was unregistered and closed.
    ///
    /// Sets: `address`.
    MailboxRemoved,

    // === Node shutdown ===
    /// `Node::shutdown` began cancelling active workers.
    ShutdownRequested,

    /// All active workers completed within the shutdown grace period.
    AllStoppedWithin,

    /// The shutdown grace period elapsed with workers still running.
    GraceExceeded,

    // === Subscriber plumbing ===
    /// A subscriber panicked while handling an event.
    ///
    /// Sets: `reason` (panic description, prefixed with the subscriber name).
    SubscriberPanicked,

    /// An event was dropped for one subscriber (queue full or closed).
    ///
    /// Sets: `reason`.
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - remaining fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker or mailbox address, if applicable.
    pub address: Option<Address>,
    /// Worker type name, if applicable.
    pub worker_type: Option<Arc<str>>,
    /// Exit classification for terminal worker events.
    pub exit: Option<ExitCode>,
    /// Human-readable reason (errors, panic text, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind with the current timestamp and the
    /// next global sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            address: None,
            worker_type: None,
            exit: None,
            reason: None,
        }
    }

    /// Attaches a worker or mailbox address.
    #[inline]
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Attaches a worker type name.
    #[inline]
    pub fn with_worker_type(mut self, worker_type: impl Into<Arc<str>>) -> Self {
        self.worker_type = Some(worker_type.into());
        self
    }

    /// Attaches an exit classification.
    #[inline]
    pub fn with_exit(mut self, exit: ExitCode) -> Self {
        self.exit = Some(exit);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub(crate) fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub(crate) fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}
