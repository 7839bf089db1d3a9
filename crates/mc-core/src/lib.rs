#![deny(missing_docs)]
#![doc = "Core traits and data types shared by the condition-sweep Monte Carlo driver and its engines."]

/// Condition value contract and stock implementations.
pub mod condition;
/// Simulation engine capability trait.
pub mod engine;
pub mod errors;
/// Ordered per-condition result rows.
pub mod record;
pub mod rng;

pub use condition::{Condition, ThermoConditions};
pub use engine::Engine;
pub use errors::{ErrorInfo, McError};
pub use record::ResultsRecord;
pub use rng::{derive_substream_seed, RngHandle};
