//! Configuration, grid factory, and step runner for the Lattice engine.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with defaults for every field
//! - [`factory`] -- Builds a [`lattice_grid::Grid`] from configuration
//! - [`runner`] -- Bounded step loop with per-step callbacks
//! - [`snapshot`] -- Serializable grid view for renderers

pub mod config;
pub mod factory;
pub mod runner;
pub mod snapshot;

pub use config::{ConfigError, GridConfig, LoggingConfig, RunConfig, SimulationConfig};
pub use factory::{DEFAULT_SIZE, FactoryError, make_grid};
pub use runner::{
    EndReason, NoOpCallback, RunResult, RunnerError, StepCallback, StepSummary, log_run_end,
    run_simulation,
};
pub use snapshot::GridSnapshot;
