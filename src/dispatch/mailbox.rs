//! # Mailbox internals: queue handle and draining task.
//!
//! A registered mailbox is represented by a [`MailboxEntry`] in the
//! dispatcher's registry (the sending side) plus one spawned draining task
//! (the consuming side). The two halves are connected by a bounded
//! [`tokio::sync::mpsc`] channel.
//!
//! ## Closing discipline
//! Removal cancels the entry's close token and drops the registry's sender.
//! Senders blocked on a full queue observe the token and fail; the drain
//! keeps consuming the remaining backlog and exits once the queue is empty
//! and the last sender clone is gone. Nothing already enqueued is discarded.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::dispatch::receive::Receive;
use crate::message::Envelope;

/// Sending half of one registered mailbox.
pub(crate) struct MailboxEntry {
    /// Bounded FIFO queue feeding the draining task.
    pub(crate) tx: mpsc::Sender<Envelope>,
    /// Cancelled on removal; prevents new pushes, including blocked ones.
    pub(crate) closed: CancellationToken,
}

/// Spawns the single draining task for a mailbox.
///
/// Pops envelopes in FIFO order, awaiting `receiver.on_message` for each, and
/// exits cleanly when the queue is closed and empty. The handle is returned
/// for observability; the drain needs no external signal to terminate.
pub(crate) fn spawn_drain<R>(mut rx: mpsc::Receiver<Envelope>, mut receiver: R) -> JoinHandle<()>
where
    R: Receive,
{
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            receiver.on_message(envelope).await;
        }
    })
}
