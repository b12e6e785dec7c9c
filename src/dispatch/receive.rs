//! # Mailbox receiver contract.
//!
//! A [`Receive`] implementation is the consuming end of a mailbox: the
//! draining task calls [`Receive::on_message`] once per dequeued envelope,
//! strictly in arrival order, and awaits each call before dequeuing the
//! next. A slow receiver therefore backpressures its own mailbox (senders
//! see a full queue) without affecting any other mailbox.

use std::future::Future;

use async_trait::async_trait;

use crate::message::Envelope;

/// Consumer callback for one mailbox.
///
/// Called from the mailbox's dedicated draining task. Implementations may
/// suspend freely; doing so stalls only this mailbox.
#[async_trait]
pub trait Receive: Send + 'static {
    /// Handles a single envelope delivered to the mailbox.
    async fn on_message(&mut self, envelope: Envelope);
}

/// Function-backed [`Receive`] implementation.
///
/// ## Example
/// ```rust
/// use worknode::{Envelope, ReceiveFn};
///
/// let recv = ReceiveFn::new(|env: Envelope| async move {
///     let _ = env.message.tag();
/// });
/// # let _ = recv;
/// ```
#[derive(Debug)]
pub struct ReceiveFn<F> {
    f: F,
}

impl<F> ReceiveFn<F> {
    /// Wraps a closure as a mailbox receiver.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Receive for ReceiveFn<F>
where
    F: FnMut(Envelope) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    async fn on_message(&mut self, envelope: Envelope) {
        (self.f)(envelope).await;
    }
}
