//! # Worker services: the runtime API handed to a running worker.
//!
//! A [`Services`] handle is bound to exactly one worker address at
//! construction and is the only way a worker body reaches the runtime:
//! sending messages, creating mailboxes it owns, and removing them.
//!
//! Every mailbox created through a handle is recorded in the owning
//! worker's set, so the node can clean it up when the run ends even if the
//! worker forgot to — see the cleanup guarantee on
//! [`Node::start_worker`](crate::Node::start_worker).

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::address::Address;
use crate::dispatch::{Dispatcher, Receive};
use crate::error::DispatchError;
use crate::message::{Envelope, Message};

/// Receiving end of a worker-owned mailbox.
///
/// Envelopes arrive in strict FIFO order. Dropping the inbox while the
/// mailbox is still registered causes subsequently forwarded envelopes to
/// be discarded; remove the mailbox instead when done with it.
pub type Inbox = mpsc::Receiver<Envelope>;

/// Forwards drained envelopes into the worker-facing inbox channel.
///
/// Runs on the mailbox's draining task; a worker that stops reading its
/// inbox backpressures this forward, which in turn backpressures the
/// mailbox queue — stalling only that mailbox.
struct InboxForwarder {
    tx: mpsc::Sender<Envelope>,
}

#[async_trait]
impl Receive for InboxForwarder {
    async fn on_message(&mut self, envelope: Envelope) {
        // Err means the worker dropped its inbox; the envelope is discarded.
        let _ = self.tx.send(envelope).await;
    }
}

/// Runtime API bound to one worker's identity.
///
/// Cheap to clone; all clones share the same owned-mailbox set.
#[derive(Clone)]
pub struct Services {
    address: Address,
    dispatcher: Arc<Dispatcher>,
    owned: Arc<Mutex<HashSet<Address>>>,
}

impl Services {
    /// Binds a handle to `address`. Called by the node at start time.
    pub(crate) fn new(
        address: Address,
        dispatcher: Arc<Dispatcher>,
        owned: Arc<Mutex<HashSet<Address>>>,
    ) -> Self {
        Self {
            address,
            dispatcher,
            owned,
        }
    }

    /// The worker address this handle is bound to.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sends `message` to the mailbox at `destination`.
    ///
    /// `block` selects the enqueue discipline per call: `false` fails fast
    /// on a saturated queue, `true` suspends until space frees or the
    /// mailbox is removed. Dispatcher errors are returned unchanged.
    ///
    /// Routing is local to this node; inter-node destinations are not
    /// supported.
    pub async fn send(
        &self,
        destination: Address,
        message: Message,
        block: bool,
    ) -> Result<(), DispatchError> {
        self.dispatcher
            .send(self.address, destination, message, block)
            .await
    }

    /// Creates a mailbox owned by this worker and returns its inbox.
    ///
    /// The address is recorded in the worker's owned set; the node removes
    /// any still-registered owned mailboxes when the run ends.
    pub async fn create_mailbox(
        &self,
        address: Address,
        capacity: usize,
    ) -> Result<Inbox, DispatchError> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.dispatcher
            .create_mailbox(address, capacity, InboxForwarder { tx })
            .await?;
        self.owned().insert(address);
        Ok(rx)
    }

    /// Removes a mailbox and forgets it from the owned set.
    pub async fn remove_mailbox(&self, address: Address) -> Result<(), DispatchError> {
        self.dispatcher.remove_mailbox(address).await?;
        self.owned().remove(&address);
        Ok(())
    }

    /// Drains the owned-mailbox set. Used by completion cleanup.
    pub(crate) fn take_owned(owned: &Arc<Mutex<HashSet<Address>>>) -> Vec<Address> {
        let mut guard = owned.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.drain().collect()
    }

    fn owned(&self) -> std::sync::MutexGuard<'_, HashSet<Address>> {
        // The set is only touched in short non-panicking sections; recover
        // the data if a guard was nevertheless poisoned.
        self.owned.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
