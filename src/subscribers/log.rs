//! # Built-in logging subscriber.
//!
//! [`LogWriter`] forwards runtime events to `tracing`, one record per
//! event. Lifecycle transitions log at `info`, abnormal worker exits and
//! subscriber trouble at `warn`, mailbox churn at `debug`. Install whatever
//! `tracing` subscriber the embedding application prefers to control the
//! output format.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::subscribe::Subscribe;

/// Subscriber that writes every event to `tracing`.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new log writer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, event: &Event) {
        let address = event.address.map(|a| a.to_string());
        let address = address.as_deref().unwrap_or("-");
        let reason = event.reason.as_deref().unwrap_or("");

        match event.kind {
            EventKind::WorkerCreated => {
                info!(seq = event.seq, address, worker_type = ?event.worker_type, "worker created");
            }
            EventKind::WorkerStarting => {
                info!(seq = event.seq, address, worker_type = ?event.worker_type, "worker starting");
            }
            EventKind::WorkerStopped => {
                let exit = event.exit.map(|e| e.as_label()).unwrap_or("-");
                info!(seq = event.seq, address, exit, "worker stopped");
            }
            EventKind::WorkerFailed => {
                warn!(seq = event.seq, address, reason, "worker failed");
            }
            EventKind::WorkerPanicked => {
                warn!(seq = event.seq, address, reason, "worker panicked");
            }
            EventKind::WorkerRemoved => {
                info!(seq = event.seq, address, "worker removed");
            }
            EventKind::MailboxCreated => {
                debug!(seq = event.seq, address, "mailbox created");
            }
            EventKind::MailboxRemoved => {
                debug!(seq = event.seq, address, "mailbox removed");
            }
            EventKind::ShutdownRequested => {
                info!(seq = event.seq, "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                info!(seq = event.seq, "all workers stopped within grace");
            }
            EventKind::GraceExceeded => {
                warn!(seq = event.seq, "shutdown grace exceeded");
            }
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                warn!(seq = event.seq, reason, "subscriber trouble");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
