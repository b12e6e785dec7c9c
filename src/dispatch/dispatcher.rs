//! # Dispatcher: the mailbox registry and message router.
//!
//! Owns the address → mailbox map behind a single read-mostly lock: lookups
//! for `send` take a read lock, registration and removal take a write lock.
//! The existence check and the acquisition of the route are one atomic step
//! under that lock, so a send can never race a concurrent removal into a
//! silently dropped message — it either routes or returns a typed error.
//!
//! Registries are plain values owned by whoever builds the runtime; nothing
//! here is process-global, so multiple independent dispatchers coexist in
//! one process (useful for tests).

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::address::Address;
use crate::dispatch::mailbox::{spawn_drain, MailboxEntry};
use crate::dispatch::receive::Receive;
use crate::error::DispatchError;
use crate::events::{Bus, Event, EventKind};
use crate::message::{Envelope, Message};

/// Registry of mailboxes and router of outbound messages.
pub struct Dispatcher {
    mailboxes: RwLock<HashMap<Address, MailboxEntry>>,
    bus: Bus,
}

impl Dispatcher {
    /// Creates an empty dispatcher publishing lifecycle events to `bus`.
    pub fn new(bus: Bus) -> Self {
        Self {
            mailboxes: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Registers a new mailbox and spawns its draining task.
    ///
    /// `capacity` bounds the FIFO buffer (clamped to 1). `receiver` is
    /// invoked by the drain for every delivered envelope, in arrival order.
    ///
    /// Fails with [`DispatchError::DuplicateAddress`] if the address is
    /// already registered.
    pub async fn create_mailbox<R>(
        &self,
        address: Address,
        capacity: usize,
        receiver: R,
    ) -> Result<(), DispatchError>
    where
        R: Receive,
    {
        {
            let mut mailboxes = self.mailboxes.write().await;
            if mailboxes.contains_key(&address) {
                return Err(DispatchError::DuplicateAddress(address));
            }

            let (tx, rx) = mpsc::channel(capacity.max(1));
            let _drain = spawn_drain(rx, receiver);
            mailboxes.insert(
                address,
                MailboxEntry {
                    tx,
                    closed: CancellationToken::new(),
                },
            );
        }

        debug!(%address, capacity, "mailbox registered");
        self.bus
            .publish(Event::now(EventKind::MailboxCreated).with_address(address));
        Ok(())
    }

    /// Unregisters and closes a mailbox.
    ///
    /// Safe to call while the drain is mid-callback: closing only prevents
    /// new pushes, and the drain exits after the current backlog is
    /// consumed. Blocked senders fail with [`DispatchError::Closed`].
    pub async fn remove_mailbox(&self, address: Address) -> Result<(), DispatchError> {
        let entry = {
            let mut mailboxes = self.mailboxes.write().await;
            mailboxes
                .remove(&address)
                .ok_or(DispatchError::UnknownAddress(address))?
        };
        entry.closed.cancel();
        // Dropping the entry drops the registry's sender; once transient
        // per-send clones are gone the drain sees end-of-queue.
        drop(entry);

        debug!(%address, "mailbox removed");
        self.bus
            .publish(Event::now(EventKind::MailboxRemoved).with_address(address));
        Ok(())
    }

    /// Routes `message` from `source` into the mailbox at `destination`.
    ///
    /// The envelope (source, destination, send timestamp) is stamped here,
    /// not by the sender. The blocking discipline is a per-call flag:
    ///
    /// - `block = false`: fails immediately with
    ///   [`DispatchError::QueueFull`] if the buffer is saturated.
    /// - `block = true`: suspends until space frees or the mailbox is
    ///   removed, whichever happens first.
    ///
    /// An unknown destination fails with [`DispatchError::UnknownAddress`]
    /// and has no side effects.
    pub async fn send(
        &self,
        source: Address,
        destination: Address,
        message: Message,
        block: bool,
    ) -> Result<(), DispatchError> {
        // Lookup and route acquisition are atomic under the read lock; the
        // lock is released before any suspension.
        let (tx, closed) = {
            let mailboxes = self.mailboxes.read().await;
            let entry = mailboxes
                .get(&destination)
                .ok_or(DispatchError::UnknownAddress(destination))?;
            (entry.tx.clone(), entry.closed.clone())
        };

        let envelope = Envelope::stamp(source, destination, message);

        if block {
            tokio::select! {
                res = tx.send(envelope) => {
                    res.map_err(|_| DispatchError::Closed(destination))
                }
                _ = closed.cancelled() => Err(DispatchError::Closed(destination)),
            }
        } else {
            if closed.is_cancelled() {
                return Err(DispatchError::Closed(destination));
            }
            tx.try_send(envelope).map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull(destination),
                mpsc::error::TrySendError::Closed(_) => DispatchError::Closed(destination),
            })
        }
    }

    /// Returns true if a mailbox is registered at `address`.
    pub async fn contains(&self, address: Address) -> bool {
        self.mailboxes.read().await.contains_key(&address)
    }

    /// Returns the sorted list of registered mailbox addresses.
    pub async fn addresses(&self) -> Vec<Address> {
        let mailboxes = self.mailboxes.read().await;
        let mut addresses: Vec<Address> = mailboxes.keys().copied().collect();
        addresses.sort_unstable();
        addresses
    }
}
