//! Configuration loading and typed config structures for the Lattice engine.
//!
//! The canonical configuration lives in `lattice-config.yaml`. Every field
//! has a default, so an empty file (or no file at all) describes a small
//! random Conway run.
//!
//! ```yaml
//! run:
//!   name: "fire demo"
//!   seed: 7
//!   max_steps: 50
//! grid:
//!   cell_type: fire
//!   topology: rect
//!   edge: { fixed: 0 }
//!   rows:
//!     - [1, 1, 1]
//!     - [1, 2, 1]
//! params:
//!   probCatch: 0.6
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use lattice_types::{EdgeMode, Topology};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Run identity and bounds.
    #[serde(default)]
    pub run: RunConfig,

    /// Grid shape, rule selection, and initial layout.
    #[serde(default)]
    pub grid: GridConfig,

    /// Named simulation parameters, matched case-insensitively.
    #[serde(default)]
    pub params: BTreeMap<String, f64>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Run identity and bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Human-readable run name.
    #[serde(default = "default_run_name")]
    pub name: String,

    /// Seed for every random draw in the run.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Maximum number of steps to run.
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// End the run early once a step changes no cell and does not resize.
    #[serde(default)]
    pub stop_when_static: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: default_run_name(),
            seed: default_seed(),
            max_steps: default_max_steps(),
            stop_when_static: false,
        }
    }
}

/// Grid shape, rule selection, and initial layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridConfig {
    /// Rule family name, e.g. `conway`, `wator`, `byl_loop`.
    #[serde(default = "default_cell_type")]
    pub cell_type: String,

    /// Lattice shape.
    #[serde(default)]
    pub topology: Topology,

    /// Edge mode override. The rule's default applies when absent.
    #[serde(default)]
    pub edge: Option<EdgeMode>,

    /// Neighbor mask override as 0/1 flags in neighbor order.
    #[serde(default)]
    pub mask: Option<Vec<u8>>,

    /// Declared valid states. The rule's default applies when absent.
    #[serde(default)]
    pub states: Option<Vec<i32>>,

    /// Width of a generated layout, and the minimum width of an explicit
    /// one. Generated layouts default to 20.
    #[serde(default)]
    pub width: Option<usize>,

    /// Height of a generated layout, and the minimum height of an explicit
    /// one. Generated layouts default to 20.
    #[serde(default)]
    pub height: Option<usize>,

    /// Explicit initial layout, one list of states per row.
    #[serde(default)]
    pub rows: Option<Vec<Vec<i32>>>,

    /// Relative weight of each state in a generated layout, indexed by
    /// state. Used when `rows` is absent.
    #[serde(default)]
    pub state_chances: Option<Vec<f64>>,

    /// Transition table for the `rule_table` cell type.
    #[serde(default)]
    pub rule_table: Option<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_type: default_cell_type(),
            topology: Topology::default(),
            edge: None,
            mask: None,
            states: None,
            width: None,
            height: None,
            rows: None,
            state_chances: None,
            rule_table: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit log lines as JSON objects instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_run_name() -> String {
    "lattice".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_steps() -> u64 {
    100
}

fn default_cell_type() -> String {
    "conway".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.run.seed, 42);
        assert_eq!(config.run.max_steps, 100);
        assert_eq!(config.grid.cell_type, "conway");
        assert_eq!(config.grid.topology, Topology::Rect);
        assert_eq!((config.grid.width, config.grid.height), (None, None));
        assert!(config.grid.rows.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        assert_eq!(SimulationConfig::parse("").unwrap(), SimulationConfig::default());
        assert_eq!(
            SimulationConfig::parse("run:\n  seed: 42\n").unwrap(),
            SimulationConfig::default()
        );
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
run:
  name: "ocean"
  seed: 9
  max_steps: 250
  stop_when_static: true

grid:
  cell_type: WaTor
  topology: hex
  edge: toroidal
  mask: [1, 1, 1, 1, 1, 1]
  states: [0, 1, 2]
  width: 30
  height: 12
  state_chances: [0.7, 0.25, 0.05]

params:
  fishBreedTime: 3
  sharkBreedTime: 8
  fishFeedEnergy: 2
  sharkStartEnergy: 4

logging:
  level: "debug"
  json: true
"#;
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.run.name, "ocean");
        assert!(config.run.stop_when_static);
        assert_eq!(config.grid.cell_type, "WaTor");
        assert_eq!(config.grid.topology, Topology::Hex);
        assert_eq!(config.grid.edge, Some(EdgeMode::Toroidal));
        assert_eq!(config.grid.mask.as_deref(), Some(&[1, 1, 1, 1, 1, 1][..]));
        assert_eq!((config.grid.width, config.grid.height), (Some(30), Some(12)));
        assert_eq!(config.grid.state_chances.unwrap().len(), 3);
        assert_eq!(config.params.get("fishBreedTime"), Some(&3.0));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn parse_fixed_edge_and_rows() {
        let yaml = r"
grid:
  cell_type: percolation
  edge:
    fixed: 3
  rows:
    - [1, 0, 1]
    - [1, 1]
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.grid.edge, Some(EdgeMode::Fixed(3)));
        assert_eq!(config.grid.rows.unwrap(), vec![vec![1, 0, 1], vec![1, 1]]);
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        let err = SimulationConfig::parse("grid: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SimulationConfig::from_file(Path::new("/nonexistent/lattice-config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
