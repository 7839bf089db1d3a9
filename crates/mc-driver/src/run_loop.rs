use std::io::Write;
use std::time::Instant;

use mc_core::errors::ErrorInfo;
use mc_core::{Engine, McError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SamplingConfig;
use crate::counter::Counter;
use crate::log::{sink_error, LogSink};

/// Why a measurement phase stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// Minimums met and the engine reported convergence.
    Converged,
    /// Minimums met and a maximum was reached before convergence.
    BoundsExhausted,
    /// Fixed-length run reached its configured length.
    Complete,
}

/// Wall-clock diagnostics for one measurement phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunTiming {
    /// Elapsed seconds from phase start to termination.
    pub seconds: f64,
    /// Seconds per completed pass, if any pass completed.
    pub seconds_per_pass: Option<f64>,
    /// Seconds per step, if any step was taken.
    pub seconds_per_step: Option<f64>,
}

impl RunTiming {
    fn measure(started: Instant, counter: &Counter) -> Self {
        let seconds = started.elapsed().as_secs_f64();
        let per = |count: u64| (count > 0).then(|| seconds / count as f64);
        Self {
            seconds,
            seconds_per_pass: per(counter.pass()),
            seconds_per_step: per(counter.total_steps()),
        }
    }
}

/// Outcome of one measurement phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Completed passes.
    pub passes: u64,
    /// Total steps taken.
    pub steps: u64,
    /// Samples recorded.
    pub samples: u64,
    /// Stop reason.
    pub termination: Termination,
    /// Timing diagnostics; never used for control.
    pub timing: RunTiming,
}

/// Performs one step: propose, check, then accept or reject.
///
/// Returns whether the event was accepted.
pub fn monte_carlo_step<E: Engine>(engine: &mut E) -> bool {
    let event = engine.propose();
    let accepted = engine.check(&event);
    if accepted {
        engine.accept(&event);
    } else {
        engine.reject(&event);
    }
    accepted
}

/// Runs `passes` unmeasured passes. Returns the number of steps taken.
pub fn equilibrate<E: Engine, W: Write>(
    engine: &mut E,
    passes: u64,
    sink: &mut LogSink<W>,
) -> Result<u64, McError> {
    sink.line(format!("Begin {passes} equilibration passes..."))?;
    info!(passes, "equilibration started");

    let mut counter = Counter::new(&SamplingConfig::default(), engine.steps_per_pass())?;
    while counter.pass() != passes {
        monte_carlo_step(engine);
        counter.advance();
    }

    sink.line("  DONE")?;
    Ok(counter.total_steps())
}

/// Steps the engine until the termination policy fires, sampling on the
/// counter's cadence.
///
/// A converging engine stops once every minimum is met and either
/// convergence is reported or any maximum is reached. Outstanding minimums
/// with a maximum already reached cannot be reconciled and fail the run.
/// Otherwise the run stops when the configured fixed length is reached.
pub fn run_measurement<E: Engine, W: Write>(
    engine: &mut E,
    sampling: &SamplingConfig,
    sink: &mut LogSink<W>,
    debug_log: bool,
) -> Result<RunReport, McError> {
    let converging = engine.must_converge();
    if !converging && sampling.length.is_empty() {
        return Err(McError::Config(
            ErrorInfo::new(
                "missing-run-length",
                "engine does not converge and no fixed run length is configured",
            )
            .with_hint("set sampling.length.passes, steps or samples"),
        ));
    }

    let started = Instant::now();
    engine
        .print_run_start_info(sink.writer())
        .map_err(sink_error)?;
    let mut counter = Counter::new(sampling, engine.steps_per_pass())?;

    let termination = loop {
        if debug_log {
            sink.blank()?;
            sink.line("-----------------------------------------")?;
            sink.line(format!(
                "Pass: {}  Step: {}  Samples: {}",
                counter.pass(),
                counter.step(),
                counter.samples()
            ))?;
        }

        if converging {
            if !counter.minimums_met() {
                if counter.maximums_met() {
                    return Err(McError::Bounds(
                        ErrorInfo::new(
                            "conflicting-bounds",
                            "minimum number of passes, steps, or samples not met, \
                             but maximum number of passes, steps, or samples are met",
                        )
                        .with_context("pass", counter.pass().to_string())
                        .with_context("step", counter.step().to_string())
                        .with_context("samples", counter.samples().to_string()),
                    ));
                }
            } else if engine.check_convergence_time() && engine.is_converged() {
                break Termination::Converged;
            } else if counter.maximums_met() {
                break Termination::BoundsExhausted;
            }
        } else if counter.is_complete() {
            break Termination::Complete;
        }

        monte_carlo_step(engine);
        counter.advance();

        if counter.sample_time() {
            if debug_log {
                sink.line("** Sample data **")?;
            }
            debug!(pass = counter.pass(), step = counter.step(), "sample");
            engine.sample_data(counter.pass(), counter.step());
            counter.increment_samples();
        }
    };

    let timing = RunTiming::measure(started, &counter);
    sink.line(format!(
        "Run time: {:.6} (s),  {} (s/pass),  {} (s/step)",
        timing.seconds,
        format_rate(timing.seconds_per_pass),
        format_rate(timing.seconds_per_step)
    ))?;
    info!(
        passes = counter.pass(),
        steps = counter.total_steps(),
        samples = counter.samples(),
        seconds = timing.seconds,
        ?termination,
        "measurement finished"
    );

    Ok(RunReport {
        passes: counter.pass(),
        steps: counter.total_steps(),
        samples: counter.samples(),
        termination,
        timing,
    })
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |value| format!("{value:.3e}"))
}
