use std::io::{self, Write};

use mc_core::errors::ErrorInfo;
use mc_core::{
    derive_substream_seed, Engine, McError, ResultsRecord, RngHandle, ThermoConditions,
};
use serde::{Deserialize, Serialize};

use crate::config::{InitialSpins, IsingConfig};
use crate::stats::RunningStats;

/// Spin configuration of a periodic square lattice, row major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsingState {
    /// Linear size `L`.
    pub size: usize,
    /// `L * L` spins, each `+1` or `-1`.
    pub spins: Vec<i8>,
}

/// Single spin flip proposal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinFlip {
    /// Lattice site.
    pub site: usize,
    /// Energy change if the flip is accepted.
    pub delta_energy: f64,
}

/// Metropolis single-spin-flip sampler for the 2D Ising model
/// `E = -J sum_<ij> s_i s_j - h sum_i s_i`.
#[derive(Debug, Clone)]
pub struct IsingEngine {
    config: IsingConfig,
    state: IsingState,
    conditions: ThermoConditions,
    rng: RngHandle,
    energy: f64,
    magnetization: i64,
    energy_stats: RunningStats,
    energy_sq_stats: RunningStats,
    magnetization_stats: RunningStats,
    abs_magnetization_stats: RunningStats,
    magnetization_sq_stats: RunningStats,
    proposed: u64,
    accepted: u64,
    samples_at_last_check: u64,
}

impl IsingEngine {
    /// Builds a lattice from `config` at the initial `conditions`.
    pub fn new(config: IsingConfig, conditions: ThermoConditions) -> Result<Self, McError> {
        if config.size < 2 {
            return Err(McError::Config(
                ErrorInfo::new("lattice-size", "lattice size must be at least 2")
                    .with_context("size", config.size.to_string()),
            ));
        }
        let sites = config.size * config.size;
        let mut rng = RngHandle::from_seed(config.seed);
        let spins = match config.initial {
            InitialSpins::Up => vec![1; sites],
            InitialSpins::Down => vec![-1; sites],
            InitialSpins::Random => (0..sites)
                .map(|_| if rng.uniform() < 0.5 { 1 } else { -1 })
                .collect(),
        };
        let state = IsingState {
            size: config.size,
            spins,
        };
        let mut engine = Self {
            rng: RngHandle::from_seed(condition_seed(config.seed, &conditions)),
            config,
            state,
            conditions,
            energy: 0.0,
            magnetization: 0,
            energy_stats: RunningStats::default(),
            energy_sq_stats: RunningStats::default(),
            magnetization_stats: RunningStats::default(),
            abs_magnetization_stats: RunningStats::default(),
            magnetization_sq_stats: RunningStats::default(),
            proposed: 0,
            accepted: 0,
            samples_at_last_check: 0,
        };
        engine.recompute();
        Ok(engine)
    }

    /// Current operating point.
    pub fn conditions(&self) -> &ThermoConditions {
        &self.conditions
    }

    /// Total energy of the current configuration.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Total magnetization of the current configuration.
    pub fn magnetization(&self) -> i64 {
        self.magnetization
    }

    /// Samples recorded at the current condition.
    pub fn samples(&self) -> u64 {
        self.energy_stats.count()
    }

    fn sites(&self) -> usize {
        self.state.size * self.state.size
    }

    fn neighbour_sum(&self, site: usize) -> i32 {
        let size = self.state.size;
        let (row, col) = (site / size, site % size);
        let up = ((row + size - 1) % size) * size + col;
        let down = ((row + 1) % size) * size + col;
        let left = row * size + (col + size - 1) % size;
        let right = row * size + (col + 1) % size;
        [up, down, left, right]
            .iter()
            .map(|&n| i32::from(self.state.spins[n]))
            .sum()
    }

    fn recompute(&mut self) {
        let size = self.state.size;
        let mut bonds = 0i64;
        for row in 0..size {
            for col in 0..size {
                let spin = i64::from(self.state.spins[row * size + col]);
                let right = i64::from(self.state.spins[row * size + (col + 1) % size]);
                let down = i64::from(self.state.spins[((row + 1) % size) * size + col]);
                bonds += spin * (right + down);
            }
        }
        self.magnetization = self.state.spins.iter().map(|&s| i64::from(s)).sum();
        self.energy = -self.config.coupling * bonds as f64
            - self.conditions.field * self.magnetization as f64;
    }

    fn clear_samples(&mut self) {
        self.energy_stats = RunningStats::default();
        self.energy_sq_stats = RunningStats::default();
        self.magnetization_stats = RunningStats::default();
        self.abs_magnetization_stats = RunningStats::default();
        self.magnetization_sq_stats = RunningStats::default();
        self.proposed = 0;
        self.accepted = 0;
        self.samples_at_last_check = 0;
    }
}

/// Per-condition stream seed, independent of how the drive got here.
fn condition_seed(master: u64, conditions: &ThermoConditions) -> u64 {
    derive_substream_seed(
        master,
        conditions.temperature.to_bits() ^ conditions.field.to_bits().rotate_left(32),
    )
}

impl Engine for IsingEngine {
    type Condition = ThermoConditions;
    type Event = SpinFlip;
    type State = IsingState;

    fn configuration_state(&self) -> &IsingState {
        &self.state
    }

    fn reset(&mut self, state: IsingState) -> Result<(), McError> {
        if state.size != self.config.size || state.spins.len() != state.size * state.size {
            return Err(McError::Engine(
                ErrorInfo::new("state-size", "state does not match the lattice size")
                    .with_context("expected", self.config.size.to_string())
                    .with_context("found", state.size.to_string()),
            ));
        }
        if let Some(site) = state.spins.iter().position(|&s| s != 1 && s != -1) {
            return Err(McError::Engine(
                ErrorInfo::new("state-spin", "spins must be +1 or -1")
                    .with_context("site", site.to_string()),
            ));
        }
        self.state = state;
        self.recompute();
        Ok(())
    }

    fn set_conditions(&mut self, conditions: &ThermoConditions) -> Result<(), McError> {
        self.conditions = *conditions;
        self.rng = RngHandle::from_seed(condition_seed(self.config.seed, conditions));
        self.recompute();
        self.clear_samples();
        Ok(())
    }

    fn steps_per_pass(&self) -> u64 {
        self.sites() as u64
    }

    fn must_converge(&self) -> bool {
        self.config.precision.is_some()
    }

    fn check_convergence_time(&self) -> bool {
        self.samples() >= self.samples_at_last_check + self.config.check_period.max(1)
    }

    fn is_converged(&mut self) -> bool {
        self.samples_at_last_check = self.samples();
        match (self.config.precision, self.energy_stats.standard_error()) {
            (Some(precision), Some(error)) => error <= precision,
            _ => false,
        }
    }

    fn propose(&mut self) -> SpinFlip {
        self.proposed += 1;
        let site = self.rng.index(self.sites());
        let spin = f64::from(self.state.spins[site]);
        let local =
            self.config.coupling * f64::from(self.neighbour_sum(site)) + self.conditions.field;
        SpinFlip {
            site,
            delta_energy: 2.0 * spin * local,
        }
    }

    fn check(&mut self, event: &SpinFlip) -> bool {
        if event.delta_energy <= 0.0 {
            return true;
        }
        let temperature = self.conditions.temperature;
        if temperature <= 0.0 {
            return false;
        }
        self.rng.uniform() < (-event.delta_energy / temperature).exp()
    }

    fn accept(&mut self, event: &SpinFlip) {
        self.accepted += 1;
        let spin = &mut self.state.spins[event.site];
        *spin = -*spin;
        self.magnetization += 2 * i64::from(*spin);
        self.energy += event.delta_energy;
    }

    fn reject(&mut self, _event: &SpinFlip) {}

    fn sample_data(&mut self, _pass: u64, _step: u64) {
        let sites = self.sites() as f64;
        let energy = self.energy / sites;
        let magnetization = self.magnetization as f64 / sites;
        self.energy_stats.push(energy);
        self.energy_sq_stats.push(energy * energy);
        self.magnetization_stats.push(magnetization);
        self.abs_magnetization_stats.push(magnetization.abs());
        self.magnetization_sq_stats.push(magnetization * magnetization);
    }

    fn results(&self) -> ResultsRecord {
        let sites = self.sites() as f64;
        let temperature = self.conditions.temperature;
        let energy = self.energy_stats.mean();
        let abs_magnetization = self.abs_magnetization_stats.mean();
        let heat_capacity = if temperature > 0.0 {
            sites * (self.energy_sq_stats.mean() - energy * energy) / (temperature * temperature)
        } else {
            0.0
        };
        let susceptibility = if temperature > 0.0 {
            sites * (self.magnetization_sq_stats.mean() - abs_magnetization * abs_magnetization)
                / temperature
        } else {
            0.0
        };
        let acceptance = if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        };
        ResultsRecord::new()
            .with("T", temperature)
            .with("h", self.conditions.field)
            .with("<E>", energy)
            .with("prec(<E>)", self.energy_stats.standard_error().unwrap_or(0.0))
            .with("<M>", self.magnetization_stats.mean())
            .with("<|M|>", abs_magnetization)
            .with("C", heat_capacity)
            .with("X", susceptibility)
            .with("acceptance", acceptance)
            .with("N_samples", self.samples())
    }

    fn print_run_start_info(&self, sink: &mut dyn Write) -> io::Result<()> {
        writeln!(
            sink,
            "Ising {size}x{size}: T = {t}, h = {h}, J = {j}",
            size = self.state.size,
            t = self.conditions.temperature,
            h = self.conditions.field,
            j = self.config.coupling
        )?;
        match self.config.precision {
            Some(precision) => writeln!(sink, "  converge <E> to +/- {precision}"),
            None => writeln!(sink, "  fixed-length run"),
        }
    }
}
