#![allow(dead_code)]

use std::path::Path;

use mc_core::{Engine, McError, ResultsRecord};
use mc_driver::MonteSettings;
use serde::{Deserialize, Serialize};

/// Calls made on the mock engine, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Propose,
    Check,
    Accept,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockState {
    pub accepted: u64,
    pub rejected: u64,
    pub visited: Vec<f64>,
}

/// Deterministic engine: every other proposal is accepted, convergence is
/// reported once a configured number of samples has been taken.
#[derive(Debug, Clone)]
pub struct MockEngine {
    pub state: MockState,
    pub conditions: f64,
    pub steps_per_pass: u64,
    pub converge_after: Option<u64>,
    pub check_every: u64,
    pub steps: u64,
    pub samples: u64,
    pub last_check: u64,
    pub calls: Vec<Call>,
    pub record_calls: bool,
    pub sample_positions: Vec<(u64, u64)>,
    /// State held when each condition was set, serialized to JSON.
    pub seeded: Vec<(f64, String)>,
    /// Fail `set_conditions` for this condition value.
    pub fail_at: Option<f64>,
}

impl MockEngine {
    pub fn new(steps_per_pass: u64) -> Self {
        Self {
            state: MockState {
                accepted: 0,
                rejected: 0,
                visited: Vec::new(),
            },
            conditions: 0.0,
            steps_per_pass,
            converge_after: None,
            check_every: 1,
            steps: 0,
            samples: 0,
            last_check: 0,
            calls: Vec::new(),
            record_calls: false,
            sample_positions: Vec::new(),
            seeded: Vec::new(),
            fail_at: None,
        }
    }

    pub fn converging(steps_per_pass: u64, after_samples: u64) -> Self {
        Self {
            converge_after: Some(after_samples),
            ..Self::new(steps_per_pass)
        }
    }

    fn note(&mut self, call: Call) {
        if self.record_calls {
            self.calls.push(call);
        }
    }
}

impl Engine for MockEngine {
    type Condition = f64;
    type Event = u64;
    type State = MockState;

    fn configuration_state(&self) -> &MockState {
        &self.state
    }

    fn reset(&mut self, state: MockState) -> Result<(), McError> {
        self.state = state;
        Ok(())
    }

    fn set_conditions(&mut self, conditions: &f64) -> Result<(), McError> {
        if self.fail_at == Some(*conditions) {
            return Err(McError::Engine(mc_core::ErrorInfo::new(
                "mock-failure",
                "simulated crash",
            )));
        }
        let snapshot = serde_json::to_string(&self.state).unwrap();
        self.seeded.push((*conditions, snapshot));
        self.conditions = *conditions;
        self.state.visited.push(*conditions);
        self.samples = 0;
        self.last_check = 0;
        Ok(())
    }

    fn steps_per_pass(&self) -> u64 {
        self.steps_per_pass
    }

    fn must_converge(&self) -> bool {
        self.converge_after.is_some()
    }

    fn check_convergence_time(&self) -> bool {
        self.samples >= self.last_check + self.check_every
    }

    fn is_converged(&mut self) -> bool {
        self.last_check = self.samples;
        self.converge_after.map_or(false, |after| self.samples >= after)
    }

    fn propose(&mut self) -> u64 {
        self.note(Call::Propose);
        self.steps += 1;
        self.steps
    }

    fn check(&mut self, event: &u64) -> bool {
        self.note(Call::Check);
        event % 2 == 0
    }

    fn accept(&mut self, _event: &u64) {
        self.note(Call::Accept);
        self.state.accepted += 1;
    }

    fn reject(&mut self, _event: &u64) {
        self.note(Call::Reject);
        self.state.rejected += 1;
    }

    fn sample_data(&mut self, pass: u64, step: u64) {
        self.samples += 1;
        self.sample_positions.push((pass, step));
    }

    fn results(&self) -> ResultsRecord {
        ResultsRecord::new()
            .with("T", self.conditions)
            .with("accepted", self.state.accepted)
            .with("N_samples", self.samples)
    }
}

/// Incremental drive 0, 2, ..., 10 with a fixed 3-pass measurement.
pub fn incremental_settings(root: &Path) -> MonteSettings<f64> {
    let mut settings = MonteSettings::single(0.0);
    settings.drive_mode = "incremental".to_string();
    settings.conditions.final_conditions = Some(10.0);
    settings.conditions.increment = Some(2.0);
    settings.sampling.length.passes = Some(3);
    settings.storage.output_directory = root.join("out");
    settings
}
