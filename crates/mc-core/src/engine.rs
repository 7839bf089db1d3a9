//! Capability contract every simulation ensemble exposes to the driver.

use std::io::{self, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::condition::Condition;
use crate::errors::McError;
use crate::record::ResultsRecord;

/// Pluggable Monte Carlo ensemble.
///
/// The driver never inspects the physical state. It seeds it through
/// [`Engine::reset`], extracts it through [`Engine::configuration_state`] for
/// checkpoints, and sequences `propose`/`check`/`accept`/`reject` exactly once
/// per step.
pub trait Engine {
    /// Operating point type the engine runs at.
    type Condition: Condition + Serialize + DeserializeOwned;
    /// Candidate event produced by [`Engine::propose`].
    type Event;
    /// Checkpointable physical state.
    type State: Clone + Serialize + DeserializeOwned;

    /// Current physical state.
    fn configuration_state(&self) -> &Self::State;

    /// Replaces the physical state, e.g. with a checkpoint from a previous condition.
    fn reset(&mut self, state: Self::State) -> Result<(), McError>;

    /// Switches to a new operating point and clears accumulated samples.
    fn set_conditions(&mut self, conditions: &Self::Condition) -> Result<(), McError>;

    /// Number of steps that make up one pass.
    fn steps_per_pass(&self) -> u64;

    /// Whether the measurement phase terminates on convergence rather than a fixed length.
    fn must_converge(&self) -> bool;

    /// Whether enough data accumulated since the last check to test convergence again.
    fn check_convergence_time(&self) -> bool;

    /// Tests convergence of the sampled observables.
    fn is_converged(&mut self) -> bool;

    /// Proposes a candidate event.
    fn propose(&mut self) -> Self::Event;

    /// Decides whether `event` should be accepted.
    fn check(&mut self, event: &Self::Event) -> bool;

    /// Applies an accepted event.
    fn accept(&mut self, event: &Self::Event);

    /// Records a rejected event.
    fn reject(&mut self, event: &Self::Event);

    /// Records one measurement sample at the given position.
    fn sample_data(&mut self, pass: u64, step: u64);

    /// Summary row for the current condition, persisted by the driver.
    fn results(&self) -> ResultsRecord;

    /// Writes engine specific details at the start of a measurement run.
    fn print_run_start_info(&self, _sink: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}
