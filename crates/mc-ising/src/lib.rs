#![deny(missing_docs)]

//! Reference 2D Ising ensemble for the condition-sweep driver.

/// Lattice configuration schema.
pub mod config;
/// Metropolis engine implementation.
pub mod engine;
/// Streaming statistics used for convergence checks.
pub mod stats;

pub use config::{InitialSpins, IsingConfig};
pub use engine::{IsingEngine, IsingState, SpinFlip};
pub use stats::RunningStats;
