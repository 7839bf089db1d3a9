use mc_core::errors::ErrorInfo;
use mc_core::McError;

use crate::config::{RunBounds, SampleMode, SamplingConfig};

/// Progress accounting for one run phase (equilibration or measurement).
///
/// A step is one proposal; `steps_per_pass` steps make a pass. The step
/// count is the position within the current pass and resets to zero when a
/// pass completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    pass: u64,
    step: u64,
    steps_per_pass: u64,
    samples: u64,
    sample_by: SampleMode,
    period: u64,
    minimums: RunBounds,
    maximums: RunBounds,
    length: RunBounds,
}

impl Counter {
    /// Creates a counter at pass zero.
    pub fn new(sampling: &SamplingConfig, steps_per_pass: u64) -> Result<Self, McError> {
        if steps_per_pass == 0 {
            return Err(McError::Config(ErrorInfo::new(
                "zero-steps-per-pass",
                "engine reported zero steps per pass",
            )));
        }
        if sampling.period == 0 {
            return Err(McError::Config(
                ErrorInfo::new("invalid-sample-period", "sampling period must be positive")
                    .with_context("period", "0"),
            ));
        }
        Ok(Self {
            pass: 0,
            step: 0,
            steps_per_pass,
            samples: 0,
            sample_by: sampling.sample_by,
            period: sampling.period,
            minimums: sampling.minimums,
            maximums: sampling.maximums,
            length: sampling.length,
        })
    }

    /// Completed passes.
    pub fn pass(&self) -> u64 {
        self.pass
    }

    /// Steps taken within the current pass.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Samples recorded so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Steps taken since the counter was created.
    pub fn total_steps(&self) -> u64 {
        self.pass * self.steps_per_pass + self.step
    }

    /// Advances by one step, rolling over into the next pass.
    pub fn advance(&mut self) {
        self.step += 1;
        if self.step == self.steps_per_pass {
            self.pass += 1;
            self.step = 0;
        }
    }

    /// Records that a sample was taken.
    pub fn increment_samples(&mut self) {
        self.samples += 1;
    }

    /// `true` iff every configured minimum is satisfied.
    pub fn minimums_met(&self) -> bool {
        let floor = |bound: Option<u64>, value: u64| bound.map_or(true, |min| value >= min);
        floor(self.minimums.passes, self.pass)
            && floor(self.minimums.steps, self.total_steps())
            && floor(self.minimums.samples, self.samples)
    }

    /// `true` iff any configured maximum has been reached.
    pub fn maximums_met(&self) -> bool {
        self.reached(&self.maximums)
    }

    /// `true` iff a fixed-length run has reached any configured length.
    pub fn is_complete(&self) -> bool {
        self.reached(&self.length)
    }

    /// `true` if the current position falls on the sampling cadence.
    ///
    /// Callers that act on it must follow up with [`Counter::increment_samples`].
    pub fn sample_time(&self) -> bool {
        match self.sample_by {
            SampleMode::Pass => self.step == 0 && self.pass > 0 && self.pass % self.period == 0,
            SampleMode::Step => {
                let total = self.total_steps();
                total > 0 && total % self.period == 0
            }
        }
    }

    fn reached(&self, bounds: &RunBounds) -> bool {
        let cap = |bound: Option<u64>, value: u64| bound.map_or(false, |max| value >= max);
        cap(bounds.passes, self.pass)
            || cap(bounds.steps, self.total_steps())
            || cap(bounds.samples, self.samples)
    }
}
