use serde::{Deserialize, Serialize};

/// Lattice and sampling parameters for the Ising engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsingConfig {
    /// Linear size `L` of the periodic `L x L` lattice.
    #[serde(default = "default_size")]
    pub size: usize,
    /// Nearest-neighbour coupling `J`. Positive is ferromagnetic.
    #[serde(default = "default_coupling")]
    pub coupling: f64,
    /// Master seed; per-condition streams are derived from it.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Target standard error of the per-site energy. `None` runs fixed-length.
    #[serde(default)]
    pub precision: Option<f64>,
    /// Samples between convergence checks.
    #[serde(default = "default_check_period")]
    pub check_period: u64,
    /// Starting spin configuration.
    #[serde(default)]
    pub initial: InitialSpins,
}

fn default_size() -> usize {
    8
}

fn default_coupling() -> f64 {
    1.0
}

fn default_seed() -> u64 {
    0x1513_6C0F_FEE5_EED5
}

fn default_check_period() -> u64 {
    10
}

impl Default for IsingConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            coupling: default_coupling(),
            seed: default_seed(),
            precision: None,
            check_period: default_check_period(),
            initial: InitialSpins::default(),
        }
    }
}

/// Starting configuration of a fresh lattice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialSpins {
    /// Every spin `+1`.
    #[default]
    Up,
    /// Every spin `-1`.
    Down,
    /// Independent random spins drawn from the master seed.
    Random,
}
