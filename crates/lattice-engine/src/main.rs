//! Command-line runner for the Lattice cellular automaton engine.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `LATTICE_CONFIG` or `lattice-config.yaml`
//! 2. Initialize structured logging (tracing), `RUST_LOG` first, then the
//!    configured level
//! 3. Build the grid from configuration
//! 4. Run the step loop until a termination condition is met
//! 5. Log the result and print the final grid snapshot as JSON on stdout

mod error;
mod progress;

use std::io::Write;
use std::path::{Path, PathBuf};

use lattice_core::{GridSnapshot, SimulationConfig, make_grid, runner};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressCallback;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "LATTICE_CONFIG";

/// Configuration file read when [`CONFIG_ENV`] is not set.
const DEFAULT_CONFIG_PATH: &str = "lattice-config.yaml";

/// Steps between info-level progress reports.
const PROGRESS_INTERVAL: u64 = 10;

fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config);
    info!("lattice-engine starting");
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        run = config.run.name,
        seed = config.run.seed,
        max_steps = config.run.max_steps,
        cell_type = config.grid.cell_type,
        topology = ?config.grid.topology,
        "Run configured"
    );

    // 3. Build the grid.
    let built = make_grid(&config)?;
    for cell in &built.rejected {
        warn!(%cell, "Initial state replaced by the default state");
    }
    let mut grid = built.grid;

    // 4. Run.
    let mut callback = ProgressCallback::new(PROGRESS_INTERVAL);
    let result = runner::run_simulation(&mut grid, &config.run, &mut callback)?;

    // 5. Report.
    runner::log_run_end(&result);
    let snapshot = GridSnapshot::capture(&grid);
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &snapshot)?;
    writeln!(out)?;

    Ok(())
}

fn init_tracing(config: &SimulationConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load configuration from the file named by [`CONFIG_ENV`], falling back
/// to [`DEFAULT_CONFIG_PATH`].
///
/// A missing file yields the defaults; the returned path is `None` then.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let path = std::env::var_os(CONFIG_ENV)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    load_config_from(&path)
}

fn load_config_from(path: &Path) -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    if path.exists() {
        let config = SimulationConfig::from_file(path)?;
        Ok((config, Some(path.to_path_buf())))
    } else {
        Ok((SimulationConfig::default(), None))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let (config, source) = load_config_from(Path::new("/nonexistent/lattice-config.yaml")).unwrap();
        assert!(source.is_none());
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn sample_config_parses_and_builds() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../lattice-config.yaml");
        let (config, source) = load_config_from(&path).unwrap();
        assert!(source.is_some());
        let built = make_grid(&config).unwrap();
        assert!(built.rejected.is_empty());
    }
}
