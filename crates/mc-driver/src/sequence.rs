use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use mc_core::errors::ErrorInfo;
use mc_core::{Condition, McError};

use crate::config::ConditionsConfig;

/// Upper bound on the length of an incremental sequence.
pub const MAX_CONDITIONS: usize = 1_000_000;

/// Strategy used to expand the configured conditions into a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Only the initial condition.
    Single,
    /// `initial`, `initial + increment`, ... up to `final`.
    Incremental,
    /// `initial` followed by an explicit list.
    Custom,
}

impl DriveMode {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DriveMode::Single => "single",
            DriveMode::Incremental => "incremental",
            DriveMode::Custom => "custom",
        }
    }
}

impl fmt::Display for DriveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriveMode {
    type Err = McError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(DriveMode::Single),
            "incremental" => Ok(DriveMode::Incremental),
            "custom" => Ok(DriveMode::Custom),
            _ => Err(McError::Config(
                ErrorInfo::new("invalid-drive-mode", "an invalid drive mode was given")
                    .with_context("drive_mode", value)
                    .with_hint("expected one of 'single', 'incremental' or 'custom'"),
            )),
        }
    }
}

/// Ordered, immutable list of conditions visited by a drive.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSequence<C> {
    mode: DriveMode,
    conditions: Vec<C>,
    degenerate: bool,
}

impl<C: Condition> ConditionSequence<C> {
    /// Expands `config` according to `mode`.
    pub fn build(mode: DriveMode, config: &ConditionsConfig<C>) -> Result<Self, McError> {
        let initial = config.initial.clone();
        let mut conditions = vec![initial.clone()];
        let mut degenerate = false;

        match mode {
            DriveMode::Single => {}
            DriveMode::Incremental => {
                let final_conditions = required(&config.final_conditions, "final")?;
                let increment = required(&config.increment, "increment")?;
                let count = final_conditions
                    .difference(&initial)
                    .whole_increments(increment);
                if count >= MAX_CONDITIONS {
                    return Err(McError::Config(
                        ErrorInfo::new(
                            "too-many-conditions",
                            "increment is too small for the requested range",
                        )
                        .with_context("increments", count.to_string())
                        .with_context("limit", MAX_CONDITIONS.to_string())
                        .with_hint("increase conditions.increment"),
                    ));
                }
                let mut current = initial;
                for _ in 0..count {
                    current.increment_by(increment);
                    conditions.push(current.clone());
                }
                degenerate = count == 0;
            }
            DriveMode::Custom => conditions.extend(config.custom.iter().cloned()),
        }

        Ok(Self {
            mode,
            conditions,
            degenerate,
        })
    }

    /// Parses `mode` and expands `config`.
    pub fn from_settings(mode: &str, config: &ConditionsConfig<C>) -> Result<Self, McError> {
        Self::build(mode.parse()?, config)
    }
}

fn required<'a, C>(value: &'a Option<C>, name: &str) -> Result<&'a C, McError> {
    value.as_ref().ok_or_else(|| {
        McError::Config(
            ErrorInfo::new(
                "missing-conditions",
                format!("incremental drive mode requires '{name}' conditions"),
            )
            .with_context("field", name),
        )
    })
}

impl<C> ConditionSequence<C> {
    /// Drive mode the sequence was built with.
    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    /// `true` when incremental mode produced only the initial condition.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Number of conditions. Never zero.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Always `false`.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// All conditions in visiting order.
    pub fn as_slice(&self) -> &[C] {
        &self.conditions
    }
}

impl<C> Index<usize> for ConditionSequence<C> {
    type Output = C;

    fn index(&self, index: usize) -> &Self::Output {
        &self.conditions[index]
    }
}
