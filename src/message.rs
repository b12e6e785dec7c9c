//! # Messages and transport envelopes.
//!
//! A [`Message`] is what a sender hands to the runtime: a routing `tag` plus
//! an opaque payload. The payload's concrete type is a contract between the
//! sending and receiving workers; the runtime never inspects it.
//!
//! An [`Envelope`] is what a mailbox receiver observes: the message plus
//! transport metadata (source, destination, send timestamp) stamped by the
//! dispatcher at routing time, never by the sender.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::address::Address;

/// Opaque message payload.
///
/// Shared so that messages stay cheap to clone; receivers recover the
/// concrete type with [`Message::payload_as`].
pub type Payload = Arc<dyn Any + Send + Sync>;

/// An addressed unit of communication between workers.
///
/// The `tag` is the only interpretation hint the runtime carries; what a
/// given tag means, and what payload type travels with it, is private to the
/// workers involved.
///
/// ## Example
/// ```rust
/// use worknode::Message;
///
/// let msg = Message::new("tick", 42u64);
/// assert_eq!(msg.tag(), "tick");
/// assert_eq!(msg.payload_as::<u64>(), Some(&42));
/// assert_eq!(msg.payload_as::<String>(), None);
/// ```
#[derive(Clone)]
pub struct Message {
    tag: String,
    payload: Payload,
}

impl Message {
    /// Creates a message with the given tag and payload.
    pub fn new(tag: impl Into<String>, payload: impl Any + Send + Sync) -> Self {
        Self {
            tag: tag.into(),
            payload: Arc::new(payload),
        }
    }

    /// Creates a message from an already shared payload (no extra allocation).
    pub fn from_payload(tag: impl Into<String>, payload: Payload) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }

    /// Returns the routing/interpretation tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the payload as the expected concrete type, if it matches.
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Returns the raw shared payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message").field("tag", &self.tag).finish_non_exhaustive()
    }
}

/// A routed message plus the transport metadata the dispatcher attached.
#[derive(Clone, Debug)]
pub struct Envelope {
    /// Address the sending worker was bound to.
    pub source: Address,
    /// Address of the mailbox this envelope was routed into.
    pub destination: Address,
    /// Wall-clock time at which the dispatcher accepted the send.
    pub sent_at: SystemTime,
    /// The sender's message, unmodified.
    pub message: Message,
}

impl Envelope {
    /// Stamps a message for transport. Called by the dispatcher only.
    pub(crate) fn stamp(source: Address, destination: Address, message: Message) -> Self {
        Self {
            source,
            destination,
            sent_at: SystemTime::now(),
            message,
        }
    }
}
