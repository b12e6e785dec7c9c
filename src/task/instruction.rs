//! # Instruction decoding.
//!
//! Instructions arrive as `{type, args}` mappings. The four recognized
//! types decode into strongly typed argument structs — a missing or
//! mistyped field is a decode error, surfaced before any instruction runs.
//! Anything else decodes into [`Instruction::Unknown`], preserving the raw
//! mapping so documents written for newer runtimes still parse.
//!
//! `start_worker`'s `worker_raw_config` is deliberately left as an
//! undecoded [`RawConfig`]: its shape is private to the worker type.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};

use crate::address::Address;
use crate::error::TaskError;
use crate::worker::RawConfig;

/// Arguments of `create_worker`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkerArgs {
    /// Factory type name to instantiate.
    pub worker_type: String,
    /// Address to register the new worker under.
    pub worker_address: Address,
}

/// Arguments of `start_worker`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartWorkerArgs {
    /// Address of the worker to start.
    pub worker_address: Address,
    /// Opaque configuration blob handed to the worker undecoded.
    #[serde(default)]
    pub worker_raw_config: RawConfig,
}

/// Arguments of `stop_worker`.
#[derive(Debug, Clone, Deserialize)]
pub struct StopWorkerArgs {
    /// Address of the worker to stop.
    pub worker_address: Address,
}

/// Arguments of `remove_worker`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveWorkerArgs {
    /// Address of the worker record to delete.
    pub worker_address: Address,
}

/// One of the four recognized lifecycle instructions.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum Lifecycle {
    CreateWorker(CreateWorkerArgs),
    StartWorker(StartWorkerArgs),
    StopWorker(StopWorkerArgs),
    RemoveWorker(RemoveWorkerArgs),
}

impl Lifecycle {
    /// The instruction's type name as it appears in documents.
    pub fn kind(&self) -> &'static str {
        match self {
            Lifecycle::CreateWorker(_) => "create_worker",
            Lifecycle::StartWorker(_) => "start_worker",
            Lifecycle::StopWorker(_) => "stop_worker",
            Lifecycle::RemoveWorker(_) => "remove_worker",
        }
    }
}

/// A decoded instruction: recognized, or preserved as raw data.
#[derive(Debug, Clone)]
pub enum Instruction {
    /// A recognized lifecycle instruction with validated arguments.
    Lifecycle(Lifecycle),
    /// An instruction of a type this runtime does not know. Kept as the raw
    /// mapping; executing it fails.
    Unknown(serde_yaml::Mapping),
}

impl Instruction {
    /// The instruction's `type` value, if present.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Instruction::Lifecycle(lifecycle) => Some(lifecycle.kind()),
            Instruction::Unknown(mapping) => {
                mapping.get("type").and_then(serde_yaml::Value::as_str)
            }
        }
    }
}

const RECOGNIZED: [&str; 4] = [
    "create_worker",
    "start_worker",
    "stop_worker",
    "remove_worker",
];

impl<'de> Deserialize<'de> for Instruction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Decode the raw mapping first so an unknown type can be preserved
        // while a malformed known type still fails hard.
        let value = serde_yaml::Value::deserialize(deserializer)?;
        let mapping = match value {
            serde_yaml::Value::Mapping(mapping) => mapping,
            other => {
                return Err(D::Error::custom(format!(
                    "instruction must be a mapping, got {other:?}"
                )))
            }
        };

        let type_name = mapping
            .get("type")
            .and_then(serde_yaml::Value::as_str)
            .ok_or_else(|| D::Error::custom("instruction is missing a string `type` field"))?
            .to_string();

        if RECOGNIZED.contains(&type_name.as_str()) {
            let lifecycle =
                serde_yaml::from_value(serde_yaml::Value::Mapping(mapping)).map_err(|err| {
                    D::Error::custom(format!("invalid {type_name} arguments: {err}"))
                })?;
            Ok(Instruction::Lifecycle(lifecycle))
        } else {
            Ok(Instruction::Unknown(mapping))
        }
    }
}

/// An ordered sequence of instructions.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct Task {
    instructions: Vec<Instruction>,
}

impl Task {
    /// Decodes a task from a YAML document (a top-level list of
    /// instructions).
    ///
    /// All instructions decode before any executes; a single malformed
    /// recognized instruction fails the whole document.
    pub fn parse(document: &str) -> Result<Self, TaskError> {
        Ok(serde_yaml::from_str(document)?)
    }

    /// The decoded instructions, in document order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}
