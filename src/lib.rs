//! # worknode
//!
//! **worknode** is a pluggable single-process runtime for deploying
//! independent, concurrently executing units of work ("workers") that
//! communicate exclusively through addressed, ordered message queues
//! ("mailboxes").
//!
//! It grew out of market-data ingestion and trading-strategy pipelines, but
//! the crate is the generic runtime only: concrete workers (exchange
//! readers, transformers, storers, strategies) plug in through a factory
//! registry and are not part of this crate.
//!
//! ## Architecture
//! ```text
//!  task document (YAML)
//!        │
//!        ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Executor: ordered instructions                               │
//! │   create_worker / start_worker / stop_worker / remove_worker │
//! └──────┬───────────────────────────────────────────────────────┘
//!        ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Node (worker supervisor)                                     │
//! │  - WorkerTypes (name → constructor factory)                  │
//! │  - worker registry (address → WorkerRecord)                  │
//! │  - panic boundary + ExitCode classification                  │
//! │  - Bus (broadcast events) ──► SubscriberSet ──► Subscribe    │
//! └──────┬───────────────────────────────────────────────────────┘
//!        │ spawns one task per active worker
//!        ▼
//!   Worker::run(ctx, config, services)
//!        │ Services::send / create_mailbox / remove_mailbox
//!        ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Dispatcher (mailbox registry + router)                       │
//! │   address ──► [bounded FIFO] ──► drain task ──► Receive      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - **FIFO per mailbox**: delivery order equals arrival order; no ordering
//!   across mailboxes.
//! - **Isolation**: a stalled receiver backpressures only its own mailbox.
//! - **Fault containment**: a panicking worker body becomes
//!   [`ExitCode::Panic`] on its status; the node and every other worker
//!   keep running.
//! - **Cleanup**: every mailbox a worker created through its [`Services`]
//!   handle is removed when its run ends, however it ends.
//! - **Cooperative cancellation**: workers are signalled, never killed.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use worknode::{
//!     Executor, Message, Node, NodeConfig, RawConfig, Services, WorkerError, WorkerFn,
//!     WorkerTypes,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let types = WorkerTypes::new().with("printer", || {
//!         WorkerFn::arc(
//!             |ctx: CancellationToken, _config: RawConfig, services: Services| async move {
//!                 let mut inbox = services
//!                     .create_mailbox(services.address(), 64)
//!                     .await
//!                     .map_err(|e| WorkerError::execution(e.to_string()))?;
//!                 loop {
//!                     tokio::select! {
//!                         _ = ctx.cancelled() => return Ok(()),
//!                         Some(env) = inbox.recv() => {
//!                             println!("got {}", env.message.tag());
//!                         }
//!                     }
//!                 }
//!             },
//!         )
//!     });
//!
//!     let node = Node::new(NodeConfig::default(), types);
//!     let addr = worknode::Address::generate();
//!     node.create_worker("printer", addr).await?;
//!     node.start_worker(addr, serde_yaml::Value::Null).await?;
//!
//!     node.dispatcher().send(addr, addr, Message::new("tick", ()), true).await?;
//!
//!     node.stop_worker(addr).await?;
//!     # let _ = Executor::new(node);
//!     Ok(())
//! }
//! ```

mod address;
mod config;
mod dispatch;
mod error;
mod events;
mod message;
mod node;
mod subscribers;
mod task;
mod worker;

// ---- Public re-exports ----

pub use address::Address;
pub use config::NodeConfig;
pub use dispatch::{Dispatcher, Receive, ReceiveFn};
pub use error::{DispatchError, NodeError, TaskError, WorkerError};
pub use events::{Bus, Event, EventKind};
pub use message::{Envelope, Message, Payload};
pub use node::{ExitCode, Inbox, Node, Services, WorkerConstructor, WorkerStatus, WorkerTypes};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use task::{
    CreateWorkerArgs, Executor, Instruction, Lifecycle, RemoveWorkerArgs, StartWorkerArgs,
    StopWorkerArgs, Task,
};
pub use worker::{RawConfig, Worker, WorkerFn, WorkerRef};
