use std::fs;
use std::path::Path;

use mc_core::errors::ErrorInfo;
use mc_core::McError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::layout::write_atomic;

/// Final state of a completed condition, used to seed the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointPayload<C, S> {
    /// Index of the condition in the drive sequence.
    pub index: usize,
    /// Condition the state was equilibrated at.
    pub conditions: C,
    /// Engine state at the end of the measurement phase.
    pub state: S,
}

impl<C: DeserializeOwned, S: DeserializeOwned> CheckpointPayload<C, S> {
    /// Restores the payload from disk.
    pub fn load(path: &Path) -> Result<Self, McError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            McError::Io(
                ErrorInfo::new("checkpoint-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            McError::Serde(
                ErrorInfo::new("checkpoint-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}

impl<C: Serialize, S: Serialize> CheckpointPayload<C, S> {
    /// Writes the payload to disk.
    ///
    /// The file only appears under its final name once fully written, so a
    /// present checkpoint is always a complete one.
    pub fn store(&self, path: &Path) -> Result<(), McError> {
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            McError::Serde(
                ErrorInfo::new("checkpoint-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        write_atomic(path, json.as_bytes(), "checkpoint")
    }
}
