use std::fs;
use std::path::{Path, PathBuf};

use mc_core::errors::ErrorInfo;
use mc_core::McError;

use crate::config::OutputFormat;

/// Paths of every artefact written below the output directory.
///
/// ```text
/// <root>/results.csv
/// <root>/results.json
/// <root>/conditions.<i>/final_state.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Results summary for `format`.
    pub fn results(&self, format: OutputFormat) -> PathBuf {
        match format {
            OutputFormat::Csv => self.root.join("results.csv"),
            OutputFormat::Json => self.root.join("results.json"),
        }
    }

    /// Per-condition directory.
    pub fn conditions_dir(&self, index: usize) -> PathBuf {
        self.root.join(format!("conditions.{index}"))
    }

    /// Checkpoint holding the final state of condition `index`.
    pub fn final_state(&self, index: usize) -> PathBuf {
        self.conditions_dir(index).join("final_state.json")
    }
}

/// Writes `contents` next to `path` and renames it into place.
pub(crate) fn write_atomic(path: &Path, contents: &[u8], code: &str) -> Result<(), McError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            McError::Io(
                ErrorInfo::new(format!("{code}-mkdir"), err.to_string())
                    .with_context("path", parent.display().to_string()),
            )
        })?;
    }
    let mut staging = path.as_os_str().to_owned();
    staging.push(".partial");
    let staging = PathBuf::from(staging);
    fs::write(&staging, contents).map_err(|err| {
        McError::Io(
            ErrorInfo::new(format!("{code}-write"), err.to_string())
                .with_context("path", staging.display().to_string()),
        )
    })?;
    fs::rename(&staging, path).map_err(|err| {
        McError::Io(
            ErrorInfo::new(format!("{code}-rename"), err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}
