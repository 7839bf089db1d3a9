use std::fs;
use std::path::{Path, PathBuf};

use mc_core::errors::ErrorInfo;
use mc_core::McError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::sequence::DriveMode;

/// YAML/JSON configurable parameters governing a condition sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteSettings<C> {
    /// How the condition sequence is built: `single`, `incremental` or `custom`.
    #[serde(default = "default_drive_mode")]
    pub drive_mode: String,
    /// Condition values consumed by the drive mode.
    pub conditions: ConditionsConfig<C>,
    /// Unmeasured passes run before measuring.
    #[serde(default)]
    pub equilibration: EquilibrationConfig,
    /// Sampling cadence and run-length bounds.
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Output formats and directory.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Emits per-step progress to the log sink.
    #[serde(default)]
    pub debug: bool,
}

fn default_drive_mode() -> String {
    "single".to_string()
}

impl<C> MonteSettings<C> {
    /// Creates settings for a single condition with default sampling and storage.
    pub fn single(initial: C) -> Self {
        Self {
            drive_mode: default_drive_mode(),
            conditions: ConditionsConfig {
                initial,
                final_conditions: None,
                increment: None,
                custom: Vec::new(),
            },
            equilibration: EquilibrationConfig::default(),
            sampling: SamplingConfig::default(),
            storage: StorageConfig::default(),
            debug: false,
        }
    }

    /// Checks settings that can be validated without an engine.
    pub fn validate(&self) -> Result<(), McError> {
        self.drive_mode.parse::<DriveMode>()?;
        if self.sampling.period == 0 {
            return Err(McError::Config(
                ErrorInfo::new("invalid-sample-period", "sampling period must be positive")
                    .with_context("period", "0"),
            ));
        }
        Ok(())
    }
}

impl<C: DeserializeOwned> MonteSettings<C> {
    /// Parses settings from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, McError> {
        serde_yaml::from_str(yaml).map_err(|err| {
            McError::Serde(
                ErrorInfo::new("settings-parse", err.to_string()).with_context("format", "yaml"),
            )
        })
    }

    /// Parses settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, McError> {
        serde_json::from_str(json).map_err(|err| {
            McError::Serde(
                ErrorInfo::new("settings-parse", err.to_string()).with_context("format", "json"),
            )
        })
    }

    /// Loads settings from disk, choosing the format from the file extension.
    pub fn load(path: &Path) -> Result<Self, McError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            McError::Io(
                ErrorInfo::new("settings-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let parsed = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        };
        parsed.map_err(|err| match err {
            McError::Serde(info) => {
                McError::Serde(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }
}

/// Condition values for every drive mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "C: Deserialize<'de>"))]
pub struct ConditionsConfig<C> {
    /// First condition; also the only one in `single` mode.
    pub initial: C,
    /// Last condition reachable in `incremental` mode.
    #[serde(default, rename = "final")]
    pub final_conditions: Option<C>,
    /// Step between consecutive conditions in `incremental` mode.
    #[serde(default)]
    pub increment: Option<C>,
    /// Conditions visited after `initial` in `custom` mode.
    #[serde(default)]
    pub custom: Vec<C>,
}

/// Explicit equilibration passes. `None` disables the corresponding phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquilibrationConfig {
    /// Passes run once, before the first condition of a fresh drive.
    #[serde(default)]
    pub first_run_passes: Option<u64>,
    /// Passes run at the start of every condition.
    #[serde(default)]
    pub each_run_passes: Option<u64>,
}

/// Unit the sampling period is measured in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMode {
    /// Sample at the end of every `period`-th pass.
    #[default]
    Pass,
    /// Sample after every `period`-th step.
    Step,
}

/// Optional limits on passes, steps and samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunBounds {
    /// Completed passes.
    #[serde(default)]
    pub passes: Option<u64>,
    /// Total steps taken.
    #[serde(default)]
    pub steps: Option<u64>,
    /// Samples recorded.
    #[serde(default)]
    pub samples: Option<u64>,
}

impl RunBounds {
    /// Returns `true` if no bound is configured.
    pub fn is_empty(&self) -> bool {
        self.passes.is_none() && self.steps.is_none() && self.samples.is_none()
    }
}

/// Sampling cadence and termination bounds for the measurement phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Unit of the sampling period.
    #[serde(default)]
    pub sample_by: SampleMode,
    /// Sample every `period` passes or steps.
    #[serde(default = "default_period")]
    pub period: u64,
    /// Floors that must all be met before a converging run may stop.
    #[serde(default)]
    pub minimums: RunBounds,
    /// Caps; reaching any of them stops a converging run.
    #[serde(default)]
    pub maximums: RunBounds,
    /// Fixed run length used when the engine does not converge.
    #[serde(default)]
    pub length: RunBounds,
}

fn default_period() -> u64 {
    1
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_by: SampleMode::default(),
            period: default_period(),
            minimums: RunBounds::default(),
            maximums: RunBounds::default(),
            length: RunBounds::default(),
        }
    }
}

/// Results store formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Row oriented `results.csv`.
    Csv,
    /// Column oriented `results.json`.
    Json,
}

impl OutputFormat {
    /// Lowercase label used in logs and error context.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Output directory layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for results and checkpoints. Created if it does not exist.
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    /// Enabled results formats. At least one is required to run.
    #[serde(default = "default_output_format")]
    pub output_format: Vec<OutputFormat>,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("mc_output")
}

fn default_output_format() -> Vec<OutputFormat> {
    vec![OutputFormat::Csv, OutputFormat::Json]
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            output_format: default_output_format(),
        }
    }
}
