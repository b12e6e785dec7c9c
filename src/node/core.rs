//! # Node: the worker supervisor.
//!
//! Owns the worker registry and drives every lifecycle transition:
//!
//! ```text
//! Unregistered ──create_worker──► Registered(inactive)
//! Registered(inactive) ──start_worker──► Active
//! Active ──run ends (any way)──► Registered(inactive)   [exit recorded]
//! Registered(inactive) ──remove_worker──► Unregistered
//! ```
//!
//! Each started worker runs on its own tokio task, wrapped in the one
//! supervisory boundary that is allowed to catch everything: a panicking
//! worker body is converted into [`ExitCode::Panic`] plus an error string,
//! and the node keeps running. Completion handling also removes every
//! mailbox the run created through its [`Services`] handle, so a worker
//! cannot leak mailboxes whichever way it ends.
//!
//! ## Locking
//! The worker registry sits behind one read-mostly lock. Status fields are
//! mutated only here, under that lock. The node never holds its registry
//! lock across dispatcher calls or completion waits, and the dispatcher
//! never calls back into the node — the two registries cannot deadlock.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use futures::FutureExt;
use tokio::sync::{watch, RwLock};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::address::Address;
use crate::config::NodeConfig;
use crate::dispatch::Dispatcher;
use crate::error::NodeError;
use crate::events::{Bus, Event, EventKind};
use crate::node::factory::WorkerTypes;
use crate::node::record::{ExitCode, WorkerRecord, WorkerStatus};
use crate::node::services::Services;
use crate::worker::RawConfig;

/// Outcome of one supervised run, before classification.
type RunOutcome = Result<Result<(), crate::error::WorkerError>, Box<dyn std::any::Any + Send>>;

/// Shared worker registry; completion handling keeps its own handle since
/// it runs on the worker's task, which may outlive the caller's borrow.
type WorkerMap = Arc<RwLock<HashMap<Address, WorkerRecord>>>;

/// The worker supervisor: registry, lifecycle, fault containment.
pub struct Node {
    cfg: NodeConfig,
    bus: Bus,
    dispatcher: Arc<Dispatcher>,
    types: WorkerTypes,
    workers: WorkerMap,
}

impl Node {
    /// Creates a node with its own event bus and dispatcher.
    pub fn new(cfg: NodeConfig, types: WorkerTypes) -> Arc<Self> {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let dispatcher = Arc::new(Dispatcher::new(bus.clone()));
        Arc::new(Self {
            cfg,
            bus,
            dispatcher,
            types,
            workers: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// The node's event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The node's dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Instantiates a worker of `type_name` and registers it, inactive, at
    /// `address`.
    ///
    /// Fails if the type is unknown to the factory registry or a record
    /// already exists at the address.
    pub async fn create_worker(&self, type_name: &str, address: Address) -> Result<(), NodeError> {
        let worker = self.types.create(type_name)?;

        {
            let mut workers = self.workers.write().await;
            if workers.contains_key(&address) {
                return Err(NodeError::DuplicateWorker(address));
            }
            workers.insert(address, WorkerRecord::new(type_name, worker));
        }

        debug!(%address, worker_type = type_name, "worker created");
        self.bus.publish(
            Event::now(EventKind::WorkerCreated)
                .with_address(address)
                .with_worker_type(type_name),
        );
        Ok(())
    }

    /// Launches the worker's run on an independently scheduled task.
    ///
    /// Rejects absent or already active records; otherwise builds a fresh
    /// cancellation handle and completion signal, marks the record active,
    /// binds a [`Services`] handle to the address, and spawns the body
    /// inside the supervisory boundary.
    ///
    /// Completion handling runs however the body ends: it removes every
    /// mailbox created via the services handle, records the classified
    /// [`ExitCode`] and error, and fires the completion signal that
    /// [`stop_worker`](Self::stop_worker) waits on.
    pub async fn start_worker(&self, address: Address, config: RawConfig) -> Result<(), NodeError> {
        let (worker, type_name, token, owned, done_tx) = {
            let mut workers = self.workers.write().await;
            let record = workers
                .get_mut(&address)
                .ok_or(NodeError::UnknownWorker(address))?;
            if record.status.active {
                return Err(NodeError::AlreadyActive(address));
            }

            let token = CancellationToken::new();
            let (done_tx, done_rx) = watch::channel(false);
            let owned = Arc::new(Mutex::new(std::collections::HashSet::new()));

            record.cancel = Some(token.clone());
            record.done = Some(done_rx);
            record.owned_mailboxes = Arc::clone(&owned);
            record.status.active = true;
            record.status.started_at = Some(SystemTime::now());
            record.status.exited_at = None;
            record.status.exit = None;
            record.status.last_error = None;

            (
                Arc::clone(&record.worker),
                Arc::clone(&record.type_name),
                token,
                owned,
                done_tx,
            )
        };

        debug!(%address, worker_type = %type_name, "worker starting");
        self.bus.publish(
            Event::now(EventKind::WorkerStarting)
                .with_address(address)
                .with_worker_type(Arc::clone(&type_name)),
        );

        let services = Services::new(address, Arc::clone(&self.dispatcher), owned);
        let workers = Arc::clone(&self.workers);
        let dispatcher = Arc::clone(&self.dispatcher);
        let bus = self.bus.clone();
        let run_token = token.clone();
        tokio::spawn(async move {
            let outcome: RunOutcome = AssertUnwindSafe(worker.run(run_token, config, services))
                .catch_unwind()
                .await;
            finish_run(workers, dispatcher, bus, address, &type_name, &token, done_tx, outcome)
                .await;
        });

        Ok(())
    }

    /// Signals the worker's cancellation handle and waits for completion.
    ///
    /// Rejects absent or inactive records. The wait is unbounded: the body
    /// is expected to observe cancellation and return promptly, and a body
    /// that never does stalls this call — by contract that is the worker's
    /// defect, not the supervisor's.
    pub async fn stop_worker(&self, address: Address) -> Result<(), NodeError> {
        let (token, mut done) = {
            let workers = self.workers.read().await;
            let record = workers
                .get(&address)
                .ok_or(NodeError::UnknownWorker(address))?;
            match (&record.cancel, &record.done) {
                (Some(token), Some(done)) if record.status.active => {
                    (token.clone(), done.clone())
                }
                _ => return Err(NodeError::NotActive(address)),
            }
        };

        token.cancel();
        // Err means the completion handler already ran and dropped the
        // sender; either way the run is over.
        let _ = done.wait_for(|finished| *finished).await;
        Ok(())
    }

    /// Deletes an inactive worker record.
    pub async fn remove_worker(&self, address: Address) -> Result<(), NodeError> {
        {
            let mut workers = self.workers.write().await;
            let record = workers
                .get(&address)
                .ok_or(NodeError::UnknownWorker(address))?;
            if record.status.active {
                return Err(NodeError::StillActive(address));
            }
            workers.remove(&address);
        }

        debug!(%address, "worker removed");
        self.bus
            .publish(Event::now(EventKind::WorkerRemoved).with_address(address));
        Ok(())
    }

    /// Returns a snapshot of the worker's status.
    pub async fn status(&self, address: Address) -> Result<WorkerStatus, NodeError> {
        let workers = self.workers.read().await;
        workers
            .get(&address)
            .map(|record| record.status.clone())
            .ok_or(NodeError::UnknownWorker(address))
    }

    /// Returns the sorted list of registered worker addresses.
    pub async fn list(&self) -> Vec<Address> {
        let workers = self.workers.read().await;
        let mut addresses: Vec<Address> = workers.keys().copied().collect();
        addresses.sort_unstable();
        addresses
    }

    /// Cancels every active worker and waits up to [`NodeConfig::grace`]
    /// for their completion signals.
    ///
    /// Workers that ignore cancellation past the grace period are reported
    /// in [`NodeError::GraceExceeded`]; they are never force-killed.
    pub async fn shutdown(&self) -> Result<(), NodeError> {
        self.bus.publish(Event::now(EventKind::ShutdownRequested));

        let mut targets = {
            let workers = self.workers.read().await;
            workers
                .iter()
                .filter(|(_, record)| record.status.active)
                .filter_map(|(address, record)| {
                    match (&record.cancel, &record.done) {
                        (Some(token), Some(done)) => {
                            Some((*address, token.clone(), done.clone()))
                        }
                        _ => None,
                    }
                })
                .collect::<Vec<_>>()
        };

        for (_, token, _) in &targets {
            token.cancel();
        }

        let wait_all = async {
            for (_, _, done) in &mut targets {
                let _ = done.wait_for(|finished| *finished).await;
            }
        };

        match time::timeout(self.cfg.grace, wait_all).await {
            Ok(()) => {
                self.bus.publish(Event::now(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                self.bus.publish(Event::now(EventKind::GraceExceeded));
                let stuck = {
                    let workers = self.workers.read().await;
                    let mut stuck: Vec<Address> = workers
                        .iter()
                        .filter(|(_, record)| record.status.active)
                        .map(|(address, _)| *address)
                        .collect();
                    stuck.sort_unstable();
                    stuck
                };
                warn!(?stuck, grace = ?self.cfg.grace, "shutdown grace exceeded");
                Err(NodeError::GraceExceeded {
                    grace: self.cfg.grace,
                    stuck,
                })
            }
        }
    }
}

/// Completion handling for one run. Runs on the worker's task, after the
/// body has ended in any of the four ways.
#[allow(clippy::too_many_arguments)]
async fn finish_run(
    workers: WorkerMap,
    dispatcher: Arc<Dispatcher>,
    bus: Bus,
    address: Address,
    type_name: &Arc<str>,
    token: &CancellationToken,
    done_tx: watch::Sender<bool>,
    outcome: RunOutcome,
) {
    // Release every mailbox the run created, whether or not the worker
    // removed them itself. Unknown-address errors mean it already did.
    let owned = {
        let workers = workers.read().await;
        workers
            .get(&address)
            .map(|record| Arc::clone(&record.owned_mailboxes))
    };
    if let Some(owned) = owned {
        for mailbox in Services::take_owned(&owned) {
            let _ = dispatcher.remove_mailbox(mailbox).await;
        }
    }

    let (exit, error) = match outcome {
        Ok(Ok(())) => {
            if token.is_cancelled() {
                (ExitCode::Normal, None)
            } else {
                (ExitCode::Premature, None)
            }
        }
        Ok(Err(err)) => (ExitCode::RuntimeError, Some(err.to_string())),
        Err(panic) => (ExitCode::Panic, Some(panic_description(panic.as_ref()))),
    };

    {
        let mut workers = workers.write().await;
        if let Some(record) = workers.get_mut(&address) {
            record.status.active = false;
            record.status.exit = Some(exit);
            record.status.last_error = error.clone();
            record.status.exited_at = Some(SystemTime::now());
            record.cancel = None;
            record.done = None;
        }
    }

    let event = match exit {
        ExitCode::Normal | ExitCode::Premature => {
            debug!(%address, exit = exit.as_label(), "worker stopped");
            Event::now(EventKind::WorkerStopped)
        }
        ExitCode::RuntimeError => {
            warn!(%address, error = error.as_deref().unwrap_or(""), "worker failed");
            Event::now(EventKind::WorkerFailed)
        }
        ExitCode::Panic => {
            warn!(%address, error = error.as_deref().unwrap_or(""), "worker panicked");
            Event::now(EventKind::WorkerPanicked)
        }
    };
    let mut event = event
        .with_address(address)
        .with_exit(exit)
        .with_worker_type(Arc::clone(type_name));
    if let Some(reason) = error {
        event = event.with_reason(reason);
    }
    bus.publish(event);

    // Signalled last so that a waiting stop_worker observes the final
    // recorded status once it resumes.
    let _ = done_tx.send(true);
}

/// Extracts a printable description from a caught panic payload.
fn panic_description(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
