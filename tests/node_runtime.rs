//! Integration tests for the worknode runtime.
//!
//! Exercises the full stack the way an embedding application would:
//! - FIFO delivery within one mailbox and isolation across mailboxes
//! - panic containment at the supervisory boundary
//! - mailbox cleanup when a worker run ends, however it ends
//! - rejected lifecycle transitions leaving state untouched
//! - echo round-trip, unknown-address sends, exit classification,
//!   and task-document abort semantics

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use tokio_util::sync::CancellationToken;
use worknode::{
    Address, DispatchError, Envelope, Event, EventKind, Executor, ExitCode, Message, Node,
    NodeConfig, RawConfig, ReceiveFn, Services, TaskError, WorkerError, WorkerFn, WorkerRef,
    WorkerTypes,
};

const WAIT: Duration = Duration::from_secs(2);

/// Installs a fmt subscriber once so `RUST_LOG=worknode=debug` shows the
/// runtime's tracing output during test runs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Worker that parks until cancelled, then returns cleanly.
fn idler() -> WorkerRef {
    WorkerFn::arc(
        |ctx: CancellationToken, _config: RawConfig, _services: Services| async move {
            ctx.cancelled().await;
            Ok(())
        },
    )
}

fn node_with_idler() -> Arc<Node> {
    Node::new(NodeConfig::default(), WorkerTypes::new().with("idler", idler))
}

/// Waits on a bus receiver until a terminal worker event for `addr` shows up.
async fn wait_for_exit(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
    addr: Address,
) -> Event {
    timeout(WAIT, async {
        loop {
            let ev = rx.recv().await.expect("bus closed while waiting");
            let terminal = matches!(
                ev.kind,
                EventKind::WorkerStopped | EventKind::WorkerFailed | EventKind::WorkerPanicked
            );
            if terminal && ev.address == Some(addr) {
                return ev;
            }
        }
    })
    .await
    .expect("no terminal event within timeout")
}

#[tokio::test]
async fn fifo_delivery_within_one_mailbox() {
    init_tracing();
    let node = node_with_idler();
    let dispatcher = node.dispatcher().clone();

    let mailbox = Address::generate();
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    dispatcher
        .create_mailbox(
            mailbox,
            64,
            ReceiveFn::new(move |env: Envelope| {
                let seen = seen_tx.clone();
                async move {
                    let _ = seen.send(env.message.tag().to_string());
                }
            }),
        )
        .await
        .unwrap();

    let sender = Address::generate();
    for i in 0..20 {
        dispatcher
            .send(sender, mailbox, Message::new(format!("m{i}"), ()), true)
            .await
            .unwrap();
    }

    for i in 0..20 {
        let tag = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
        assert_eq!(tag, format!("m{i}"));
    }
}

#[tokio::test]
async fn stalled_receiver_does_not_delay_other_mailboxes() {
    init_tracing();
    let node = node_with_idler();
    let dispatcher = node.dispatcher().clone();

    // Mailbox X: receiver never completes.
    let x = Address::generate();
    dispatcher
        .create_mailbox(
            x,
            1,
            ReceiveFn::new(|_env: Envelope| async {
                std::future::pending::<()>().await;
            }),
        )
        .await
        .unwrap();

    // Mailbox Y: normal receiver.
    let y = Address::generate();
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    dispatcher
        .create_mailbox(
            y,
            8,
            ReceiveFn::new(move |env: Envelope| {
                let seen = seen_tx.clone();
                async move {
                    let _ = seen.send(env.message.tag().to_string());
                }
            }),
        )
        .await
        .unwrap();

    let sender = Address::generate();
    // Stall X's drain inside its callback.
    dispatcher
        .send(sender, x, Message::new("stall", ()), true)
        .await
        .unwrap();

    // Y must still deliver promptly.
    dispatcher
        .send(sender, y, Message::new("through", ()), true)
        .await
        .unwrap();
    let tag = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
    assert_eq!(tag, "through");
}

#[tokio::test]
async fn panicking_worker_is_contained_and_node_stays_usable() {
    init_tracing();
    let types = WorkerTypes::new()
        .with("bomb", || {
            WorkerFn::arc(
                |_ctx: CancellationToken, _config: RawConfig, _services: Services| async move {
                    panic!("worker body exploded");
                },
            )
        })
        .with("idler", idler);
    let node = Node::new(NodeConfig::default(), types);
    let mut events = node.bus().subscribe();

    let bomb = Address::generate();
    node.create_worker("bomb", bomb).await.unwrap();
    node.start_worker(bomb, serde_yaml::Value::Null).await.unwrap();

    let ev = wait_for_exit(&mut events, bomb).await;
    assert_eq!(ev.kind, EventKind::WorkerPanicked);

    let status = node.status(bomb).await.unwrap();
    assert!(!status.active);
    assert_eq!(status.exit, Some(ExitCode::Panic));
    assert!(status
        .last_error
        .as_deref()
        .unwrap_or("")
        .contains("exploded"));

    // The supervisor survived: start and stop another worker.
    let other = Address::generate();
    node.create_worker("idler", other).await.unwrap();
    node.start_worker(other, serde_yaml::Value::Null).await.unwrap();
    node.stop_worker(other).await.unwrap();
    assert_eq!(
        node.status(other).await.unwrap().exit,
        Some(ExitCode::Normal)
    );
}

#[tokio::test]
async fn owned_mailboxes_are_cleaned_up_on_every_exit_path() {
    init_tracing();
    // Worker creates two mailboxes, removes neither, and returns on its own.
    let types = WorkerTypes::new().with("litterbug", || {
        WorkerFn::arc(
            |_ctx: CancellationToken, config: RawConfig, services: Services| async move {
                let first: Address = config
                    .get("first")
                    .and_then(serde_yaml::Value::as_str)
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| WorkerError::config("missing first"))?;
                let second: Address = config
                    .get("second")
                    .and_then(serde_yaml::Value::as_str)
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| WorkerError::config("missing second"))?;
                let _a = services.create_mailbox(first, 4).await;
                let _b = services.create_mailbox(second, 4).await;
                Ok(())
            },
        )
    });
    let node = Node::new(NodeConfig::default(), types);
    let mut events = node.bus().subscribe();

    let worker = Address::generate();
    let first = Address::generate();
    let second = Address::generate();
    let config: serde_yaml::Value = serde_yaml::from_str(&format!(
        "first: {first}\nsecond: {second}\n"
    ))
    .unwrap();

    node.create_worker("litterbug", worker).await.unwrap();
    node.start_worker(worker, config).await.unwrap();
    wait_for_exit(&mut events, worker).await;

    assert!(!node.dispatcher().contains(first).await);
    assert!(!node.dispatcher().contains(second).await);
}

#[tokio::test]
async fn rejected_transitions_leave_state_unchanged() {
    init_tracing();
    let node = node_with_idler();
    let addr = Address::generate();
    node.create_worker("idler", addr).await.unwrap();

    // stop on inactive: rejected, still inactive.
    assert!(matches!(
        node.stop_worker(addr).await,
        Err(worknode::NodeError::NotActive(_))
    ));
    assert!(!node.status(addr).await.unwrap().active);

    // start twice: second rejected, still active with one run.
    node.start_worker(addr, serde_yaml::Value::Null).await.unwrap();
    assert!(matches!(
        node.start_worker(addr, serde_yaml::Value::Null).await,
        Err(worknode::NodeError::AlreadyActive(_))
    ));
    assert!(node.status(addr).await.unwrap().active);

    node.stop_worker(addr).await.unwrap();
}

// Scenario A: echo worker observes exactly the message sent to the mailbox
// it created at its own address.
#[tokio::test]
async fn echo_worker_receives_exactly_one_message() {
    init_tracing();
    let (echo_tx, mut echo_rx) = mpsc::unbounded_channel::<(String, String)>();
    let types = WorkerTypes::new().with("echo", move || {
        let echo = echo_tx.clone();
        WorkerFn::arc(move |ctx: CancellationToken, _config: RawConfig, services: Services| {
            let echo = echo.clone();
            async move {
                let mut inbox = services
                    .create_mailbox(services.address(), 16)
                    .await
                    .map_err(|e| WorkerError::execution(e.to_string()))?;
                loop {
                    tokio::select! {
                        _ = ctx.cancelled() => return Ok(()),
                        env = inbox.recv() => match env {
                            Some(env) => {
                                let payload = env
                                    .message
                                    .payload_as::<&str>()
                                    .map(|s| s.to_string())
                                    .unwrap_or_default();
                                let _ = echo.send((env.message.tag().to_string(), payload));
                            }
                            None => return Ok(()),
                        },
                    }
                }
            }
        })
    });
    let node = Node::new(NodeConfig::default(), types);

    let x = Address::generate();
    node.create_worker("echo", x).await.unwrap();
    node.start_worker(x, serde_yaml::Value::Null).await.unwrap();

    // The worker registers its mailbox asynchronously; wait for it.
    timeout(WAIT, async {
        while !node.dispatcher().contains(x).await {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let sender = Address::generate();
    node.dispatcher()
        .send(sender, x, Message::new("t", "hi"), true)
        .await
        .unwrap();

    let (tag, payload) = timeout(WAIT, echo_rx.recv()).await.unwrap().unwrap();
    assert_eq!(tag, "t");
    assert_eq!(payload, "hi");

    // Exactly once: nothing else arrives.
    assert!(timeout(Duration::from_millis(100), echo_rx.recv())
        .await
        .is_err());

    node.stop_worker(x).await.unwrap();
}

// Scenario B: sending to an unregistered address is a typed error.
#[tokio::test]
async fn send_to_unknown_address_returns_typed_error() {
    init_tracing();
    let node = node_with_idler();
    let err = node
        .dispatcher()
        .send(
            Address::generate(),
            Address::generate(),
            Message::new("t", ()),
            true,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnknownAddress(_)));
}

// Scenario C: spontaneous clean return classifies as Premature without a
// prior stop, and as Normal when the stop came first.
#[tokio::test]
async fn exit_classification_depends_on_cancellation() {
    init_tracing();
    let types = WorkerTypes::new().with("sleeper", || {
        WorkerFn::arc(
            |_ctx: CancellationToken, _config: RawConfig, _services: Services| async move {
                // Returns cleanly without ever checking cancellation.
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(())
            },
        )
    });
    let node = Node::new(NodeConfig::default(), types);
    let mut events = node.bus().subscribe();

    // No stop call: premature.
    let a = Address::generate();
    node.create_worker("sleeper", a).await.unwrap();
    node.start_worker(a, serde_yaml::Value::Null).await.unwrap();
    wait_for_exit(&mut events, a).await;
    assert_eq!(node.status(a).await.unwrap().exit, Some(ExitCode::Premature));

    // Stop before the body returns: normal.
    let b = Address::generate();
    node.create_worker("sleeper", b).await.unwrap();
    node.start_worker(b, serde_yaml::Value::Null).await.unwrap();
    node.stop_worker(b).await.unwrap();
    assert_eq!(node.status(b).await.unwrap().exit, Some(ExitCode::Normal));
}

// Scenario D: the executor aborts at the failing instruction, and the
// effects of the instructions before it persist.
#[tokio::test]
async fn task_aborts_at_failing_instruction_keeping_earlier_effects() {
    init_tracing();
    let node = node_with_idler();
    let exec = Executor::new(node.clone());

    let a = Address::generate();
    let doc = format!(
        r#"
- type: create_worker
  args: {{ worker_type: idler, worker_address: {a} }}
- type: start_worker
  args: {{ worker_address: {a} }}
- type: create_worker
  args: {{ worker_type: idler, worker_address: {a} }}
"#
    );

    let err = exec.execute_document(&doc).await.unwrap_err();
    assert!(matches!(
        err,
        TaskError::Instruction {
            index: 2,
            kind: "create_worker",
            ..
        }
    ));

    let status = node.status(a).await.unwrap();
    assert!(status.active, "worker A exists and is active");
    node.stop_worker(a).await.unwrap();
}

#[tokio::test]
async fn worker_reported_error_is_recorded_as_runtime_error() {
    init_tracing();
    let types = WorkerTypes::new().with("failer", || {
        WorkerFn::arc(
            |_ctx: CancellationToken, _config: RawConfig, _services: Services| async move {
                Err(WorkerError::execution("connection refused"))
            },
        )
    });
    let node = Node::new(NodeConfig::default(), types);
    let mut events = node.bus().subscribe();

    let addr = Address::generate();
    node.create_worker("failer", addr).await.unwrap();
    node.start_worker(addr, serde_yaml::Value::Null).await.unwrap();

    let ev = wait_for_exit(&mut events, addr).await;
    assert_eq!(ev.kind, EventKind::WorkerFailed);

    let status = node.status(addr).await.unwrap();
    assert_eq!(status.exit, Some(ExitCode::RuntimeError));
    assert!(status
        .last_error
        .as_deref()
        .unwrap_or("")
        .contains("connection refused"));
    assert!(status.exit.unwrap().is_abnormal());
}

#[tokio::test]
async fn shutdown_stops_all_active_workers_within_grace() {
    init_tracing();
    let node = node_with_idler();
    let mut addrs = Vec::new();
    for _ in 0..3 {
        let addr = Address::generate();
        node.create_worker("idler", addr).await.unwrap();
        node.start_worker(addr, serde_yaml::Value::Null).await.unwrap();
        addrs.push(addr);
    }

    node.shutdown().await.unwrap();

    for addr in addrs {
        let status = node.status(addr).await.unwrap();
        assert!(!status.active);
        assert_eq!(status.exit, Some(ExitCode::Normal));
    }
}

#[tokio::test]
async fn shutdown_reports_workers_that_ignore_cancellation() {
    init_tracing();
    let types = WorkerTypes::new().with("deaf", || {
        WorkerFn::arc(
            |_ctx: CancellationToken, _config: RawConfig, _services: Services| async move {
                std::future::pending::<()>().await;
                Ok(())
            },
        )
    });
    let node = Node::new(
        NodeConfig {
            grace: Duration::from_millis(50),
            ..NodeConfig::default()
        },
        types,
    );

    let addr = Address::generate();
    node.create_worker("deaf", addr).await.unwrap();
    node.start_worker(addr, serde_yaml::Value::Null).await.unwrap();

    match node.shutdown().await {
        Err(worknode::NodeError::GraceExceeded { stuck, .. }) => {
            assert_eq!(stuck, vec![addr]);
        }
        other => panic!("expected GraceExceeded, got {other:?}"),
    }
}
