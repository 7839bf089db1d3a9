//! Thermodynamic condition values visited by a drive.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

const INCREMENT_TOLERANCE: f64 = 1e-9;

/// Value contract for a single operating point in a condition sequence.
///
/// Conditions are plain values: the sequence builder only ever subtracts two
/// of them, divides the difference by an increment and steps a copy forward.
pub trait Condition: Clone + PartialEq + Debug {
    /// Returns `self - other`.
    fn difference(&self, other: &Self) -> Self;

    /// Number of whole `increment`s that fit inside `self`.
    ///
    /// Returns zero when `increment` does not move towards `self`.
    fn whole_increments(&self, increment: &Self) -> usize;

    /// Advances `self` by `increment` in place.
    fn increment_by(&mut self, increment: &Self);
}

fn whole_steps(span: f64, step: f64) -> Option<usize> {
    if step == 0.0 {
        return None;
    }
    let ratio = span / step;
    if !ratio.is_finite() || ratio < 0.0 {
        return Some(0);
    }
    Some((ratio + INCREMENT_TOLERANCE).floor() as usize)
}

impl Condition for f64 {
    fn difference(&self, other: &Self) -> Self {
        self - other
    }

    fn whole_increments(&self, increment: &Self) -> usize {
        whole_steps(*self, *increment).unwrap_or(0)
    }

    fn increment_by(&mut self, increment: &Self) {
        *self += increment;
    }
}

/// Temperature and external field pair used by lattice ensembles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermoConditions {
    /// Temperature in units of the coupling constant.
    pub temperature: f64,
    /// External field (chemical potential analogue) conjugate to the order parameter.
    #[serde(default)]
    pub field: f64,
}

impl ThermoConditions {
    /// Creates a new condition pair.
    pub fn new(temperature: f64, field: f64) -> Self {
        Self { temperature, field }
    }
}

impl Condition for ThermoConditions {
    fn difference(&self, other: &Self) -> Self {
        Self {
            temperature: self.temperature - other.temperature,
            field: self.field - other.field,
        }
    }

    /// Components with a zero increment are ignored; the smallest count over
    /// the remaining components wins so no component overshoots its target.
    fn whole_increments(&self, increment: &Self) -> usize {
        [
            whole_steps(self.temperature, increment.temperature),
            whole_steps(self.field, increment.field),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(0)
    }

    fn increment_by(&mut self, increment: &Self) {
        self.temperature += increment.temperature;
        self.field += increment.field;
    }
}
