use std::io::Write;

use mc_core::errors::ErrorInfo;
use mc_core::{Engine, McError, ResultsRecord};
use serde::Serialize;
use tracing::{info, warn};

use crate::checkpoint::CheckpointPayload;
use crate::config::MonteSettings;
use crate::layout::OutputLayout;
use crate::log::LogSink;
use crate::resume::{find_starting_conditions, ResumePlan};
use crate::results::open_stores;
use crate::run_loop::{equilibrate, run_measurement, RunReport};
use crate::sequence::ConditionSequence;

/// Outcome of one condition within a drive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionRun {
    /// Index in the condition sequence.
    pub index: usize,
    /// Steps spent in per-condition equilibration.
    pub equilibration_steps: u64,
    /// Measurement phase report.
    pub report: RunReport,
}

/// Outcome of [`Driver::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriveSummary {
    /// First condition computed by this invocation.
    pub start: usize,
    /// Conditions whose existing artefacts were overwritten.
    pub repeats: Vec<usize>,
    /// `true` if every condition was already on disk and nothing ran.
    pub already_complete: bool,
    /// Steps spent in first-run equilibration.
    pub first_run_equilibration_steps: u64,
    /// Per-condition outcomes in visiting order.
    pub runs: Vec<ConditionRun>,
}

impl DriveSummary {
    /// Every step taken by this invocation, equilibration included.
    pub fn total_steps(&self) -> u64 {
        self.first_run_equilibration_steps
            + self
                .runs
                .iter()
                .map(|run| run.equilibration_steps + run.report.steps)
                .sum::<u64>()
    }
}

/// Visits every condition of a sequence in order, carrying the final state
/// of each condition into the next and persisting results and checkpoints as
/// each one completes.
///
/// A drive interrupted at any point can be re-invoked with the same settings:
/// it resumes from the first condition that is not present in every enabled
/// results store with a matching checkpoint.
pub struct Driver<E: Engine, W: Write> {
    settings: MonteSettings<E::Condition>,
    sequence: ConditionSequence<E::Condition>,
    layout: OutputLayout,
    engine: E,
    sink: LogSink<W>,
}

impl<E: Engine, W: Write> Driver<E, W> {
    /// Builds the condition sequence and validates the settings.
    ///
    /// `engine` must already hold the initial state used by the first
    /// condition of a fresh drive.
    pub fn new(
        settings: MonteSettings<E::Condition>,
        engine: E,
        mut sink: LogSink<W>,
    ) -> Result<Self, McError> {
        let sequence =
            ConditionSequence::from_settings(&settings.drive_mode, &settings.conditions)?;
        settings.validate()?;
        if sequence.is_degenerate() {
            warn!("incremental drive mode degenerated to a single condition");
            sink.line("WARNING: incremental drive mode degenerated to a single condition.")?;
            sink.line("  Only the initial condition will be calculated; check the increment.")?;
        }
        let layout = OutputLayout::new(settings.storage.output_directory.clone());
        Ok(Self {
            settings,
            sequence,
            layout,
            engine,
            sink,
        })
    }

    /// Conditions visited by this driver.
    pub fn sequence(&self) -> &ConditionSequence<E::Condition> {
        &self.sequence
    }

    /// Output paths.
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// The engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The engine, mutably.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The progress log sink.
    pub fn sink(&self) -> &LogSink<W> {
        &self.sink
    }

    /// Consumes the driver, returning the engine and sink.
    pub fn into_parts(self) -> (E, LogSink<W>) {
        (self.engine, self.sink)
    }

    /// Runs every condition not already complete on disk.
    pub fn run(&mut self) -> Result<DriveSummary, McError> {
        if self.settings.debug {
            self.sink.line("Checking for existing calculations...")?;
        }
        if self.settings.storage.output_format.is_empty() {
            return Err(McError::Config(
                ErrorInfo::new("no-output-format", "no valid monte carlo output format")
                    .with_hint("storage.output_format must contain 'csv' or 'json'"),
            ));
        }

        let len = self.sequence.len();
        let mut stores = open_stores(&self.layout, &self.settings.storage);
        let plan = find_starting_conditions(&self.layout, &mut stores, len)?;
        let mut summary = DriveSummary {
            start: plan.start,
            repeats: plan.repeats.clone(),
            already_complete: false,
            first_run_equilibration_steps: 0,
            runs: Vec::new(),
        };

        if plan.is_complete(len) {
            info!(conditions = len, "calculations already complete");
            self.sink.line("Calculations already complete.")?;
            self.sink.flush()?;
            summary.already_complete = true;
            return Ok(summary);
        }
        self.report_resume(&plan)?;

        if plan.start == 0 {
            if let Some(passes) = self.settings.equilibration.first_run_passes {
                summary.first_run_equilibration_steps =
                    equilibrate(&mut self.engine, passes, &mut self.sink)?;
            }
        } else {
            let path = self.layout.final_state(plan.start - 1);
            let payload: CheckpointPayload<E::Condition, E::State> =
                CheckpointPayload::load(&path)?;
            info!(index = payload.index, path = %path.display(), "seeding from checkpoint");
            self.engine.reset(payload.state)?;
        }

        for index in plan.start..len {
            let conditions = self.sequence[index].clone();
            info!(index, ?conditions, "condition started");
            self.sink.line(format!("Condition {index} of {len}: {conditions:?}"))?;
            self.engine.set_conditions(&conditions)?;

            let equilibration_steps = match self.settings.equilibration.each_run_passes {
                Some(passes) => equilibrate(&mut self.engine, passes, &mut self.sink)?,
                None => 0,
            };
            let report = run_measurement(
                &mut self.engine,
                &self.settings.sampling,
                &mut self.sink,
                self.settings.debug,
            )?;

            self.sink.line("Writing output files...")?;
            let row = indexed_row(index, &self.engine.results());
            for store in stores.iter_mut() {
                store.append(&row)?;
            }
            CheckpointPayload {
                index,
                conditions: &conditions,
                state: self.engine.configuration_state(),
            }
            .store(&self.layout.final_state(index))?;
            self.sink.line("  DONE")?;
            self.sink.blank()?;
            self.sink.flush()?;
            info!(index, steps = report.steps, "condition complete");

            summary.runs.push(ConditionRun {
                index,
                equilibration_steps,
                report,
            });
        }
        Ok(summary)
    }

    fn report_resume(&mut self, plan: &ResumePlan) -> Result<(), McError> {
        if plan.start == 0 && plan.repeats.is_empty() {
            return Ok(());
        }
        info!(start = plan.start, repeats = ?plan.repeats, "resuming drive");
        self.sink.line(format!(
            "Found existing calculations. Will begin with condition {}.",
            plan.start
        ))?;
        self.sink.blank()?;
        if !plan.repeats.is_empty() {
            let listed = serde_json::to_string(&plan.repeats).map_err(|err| {
                McError::Serde(ErrorInfo::new("repeats-serialize", err.to_string()))
            })?;
            self.sink.line(format!(
                "Will overwrite existing results for condition(s): {listed}"
            ))?;
            self.sink.blank()?;
        }
        Ok(())
    }
}

fn indexed_row(index: usize, results: &ResultsRecord) -> ResultsRecord {
    let mut row = ResultsRecord::new().with("index", index as u64);
    for (name, value) in results.iter() {
        row.insert(name, value.clone());
    }
    row
}
