#![deny(missing_docs)]

//! Condition-sweep Monte Carlo driver.
//!
//! Expands a drive mode into an ordered sequence of conditions, runs
//! equilibration and measurement at each one on a pluggable [`mc_core::Engine`],
//! and persists a results row plus a final-state checkpoint per condition so
//! an interrupted drive resumes where it stopped.

/// Final-state checkpoint payloads.
pub mod checkpoint;
/// YAML/JSON settings schema and defaults.
pub mod config;
/// Pass, step and sample accounting.
pub mod counter;
/// Per-condition orchestration and the public `Driver` entry point.
pub mod driver;
/// Output directory layout.
pub mod layout;
/// Progress log sink.
pub mod log;
/// Results stores (CSV and JSON).
pub mod results;
/// Restart detection and store truncation.
pub mod resume;
/// Equilibration and measurement loops.
pub mod run_loop;
/// Drive modes and condition sequences.
pub mod sequence;

pub use checkpoint::CheckpointPayload;
pub use config::{
    ConditionsConfig, EquilibrationConfig, MonteSettings, OutputFormat, RunBounds, SampleMode,
    SamplingConfig, StorageConfig,
};
pub use counter::Counter;
pub use driver::{ConditionRun, DriveSummary, Driver};
pub use layout::OutputLayout;
pub use log::LogSink;
pub use results::{open_stores, CsvResults, JsonResults, ResultsStore};
pub use resume::{find_starting_conditions, ResumePlan};
pub use run_loop::{
    equilibrate, monte_carlo_step, run_measurement, RunReport, RunTiming, Termination,
};
pub use sequence::{ConditionSequence, DriveMode, MAX_CONDITIONS};
