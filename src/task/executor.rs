//! # Task execution against the supervisor.
//!
//! The [`Executor`] walks a task's instructions strictly in order and calls
//! the matching [`Node`] method for each. The first failure aborts the
//! remaining instructions and is reported with its position, kind, and the
//! supervisor's rejection; effects of earlier instructions persist (no
//! rollback — tasks must be written to be safely restartable, or callers
//! must inspect node state before retrying).

use std::sync::Arc;

use tracing::debug;

use crate::error::TaskError;
use crate::node::Node;
use crate::task::instruction::{Instruction, Lifecycle, Task};

/// Drives a [`Node`] through task documents.
pub struct Executor {
    node: Arc<Node>,
}

impl Executor {
    /// Creates an executor bound to `node`.
    pub fn new(node: Arc<Node>) -> Self {
        Self { node }
    }

    /// Parses and executes a YAML task document.
    ///
    /// Decode errors surface before any instruction runs.
    pub async fn execute_document(&self, document: &str) -> Result<(), TaskError> {
        let task = Task::parse(document)?;
        self.execute(&task).await
    }

    /// Executes a decoded task, strictly in instruction order.
    pub async fn execute(&self, task: &Task) -> Result<(), TaskError> {
        for (index, instruction) in task.instructions().iter().enumerate() {
            let lifecycle = match instruction {
                Instruction::Lifecycle(lifecycle) => lifecycle,
                Instruction::Unknown(_) => {
                    return Err(TaskError::UnsupportedInstruction {
                        index,
                        type_name: instruction.type_name().unwrap_or("<none>").to_string(),
                    });
                }
            };

            let kind = lifecycle.kind();
            debug!(index, kind, "executing instruction");

            let result = match lifecycle {
                Lifecycle::CreateWorker(args) => {
                    self.node
                        .create_worker(&args.worker_type, args.worker_address)
                        .await
                }
                Lifecycle::StartWorker(args) => {
                    self.node
                        .start_worker(args.worker_address, args.worker_raw_config.clone())
                        .await
                }
                Lifecycle::StopWorker(args) => self.node.stop_worker(args.worker_address).await,
                Lifecycle::RemoveWorker(args) => {
                    self.node.remove_worker(args.worker_address).await
                }
            };

            result.map_err(|source| TaskError::Instruction {
                index,
                kind,
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::config::NodeConfig;
    use crate::node::{Services, WorkerTypes};
    use crate::worker::{RawConfig, WorkerFn, WorkerRef};
    use tokio_util::sync::CancellationToken;

    fn idler() -> WorkerRef {
        WorkerFn::arc(
            |ctx: CancellationToken, _config: RawConfig, _services: Services| async move {
                ctx.cancelled().await;
                Ok(())
            },
        )
    }

    fn executor() -> Executor {
        let types = WorkerTypes::new().with("idler", idler);
        Executor::new(Node::new(NodeConfig::default(), types))
    }

    #[tokio::test]
    async fn runs_a_full_lifecycle_document() {
        let exec = executor();
        let addr = Address::generate();
        let doc = format!(
            r#"
- type: create_worker
  args: {{ worker_type: idler, worker_address: {addr} }}
- type: start_worker
  args: {{ worker_address: {addr} }}
- type: stop_worker
  args: {{ worker_address: {addr} }}
- type: remove_worker
  args: {{ worker_address: {addr} }}
"#
        );
        exec.execute_document(&doc).await.unwrap();
        assert!(exec.node.list().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_instruction_type_fails_execution_with_position() {
        let exec = executor();
        let doc = r#"
- type: drain_pool
  args: { pool: alpha }
"#;
        let err = exec.execute_document(doc).await.unwrap_err();
        match err {
            TaskError::UnsupportedInstruction { index, type_name } => {
                assert_eq!(index, 0);
                assert_eq!(type_name, "drain_pool");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn failing_instruction_aborts_the_rest_but_keeps_earlier_effects() {
        let exec = executor();
        let addr = Address::generate();
        // Instruction 2 reuses the same address and must fail; the stop in
        // instruction 3 must never run, so the worker stays active.
        let doc = format!(
            r#"
- type: create_worker
  args: {{ worker_type: idler, worker_address: {addr} }}
- type: start_worker
  args: {{ worker_address: {addr} }}
- type: create_worker
  args: {{ worker_type: idler, worker_address: {addr} }}
- type: stop_worker
  args: {{ worker_address: {addr} }}
"#
        );
        let err = exec.execute_document(&doc).await.unwrap_err();
        assert!(matches!(
            err,
            TaskError::Instruction { index: 2, kind: "create_worker", .. }
        ));

        let status = exec.node.status(addr).await.unwrap();
        assert!(status.active, "earlier instructions' effects persist");
        exec.node.stop_worker(addr).await.unwrap();
    }
}
