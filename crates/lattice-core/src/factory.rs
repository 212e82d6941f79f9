//! Grid construction from configuration.
//!
//! [`make_grid`] resolves the configured cell type through the rule
//! registry, lays out the initial states (explicit rows, or a random layout
//! drawn from per-state weights) and hands everything to
//! [`GridBuilder`].

use lattice_grid::{BuiltGrid, CellRule, GridBuilder, GridError, NeighborMask};
use lattice_rules::{RuleTableError, rule_for};
use lattice_types::{CellKind, ParamMap, UnknownName};
use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use tracing::{debug, info};

use crate::config::SimulationConfig;

/// Side length of a generated layout when none is configured.
pub const DEFAULT_SIZE: usize = 20;

/// Errors that can occur while building a grid from configuration.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// The configured cell type is not registered.
    #[error("{source}")]
    UnknownCellType {
        /// The failed name lookup.
        #[from]
        source: UnknownName,
    },

    /// The rule table could not be built.
    #[error("rule table error: {source}")]
    RuleTable {
        /// The underlying rule table error.
        #[from]
        source: RuleTableError,
    },

    /// The grid rejected the layout or settings.
    #[error("grid error: {source}")]
    Grid {
        /// The underlying grid error.
        #[from]
        source: GridError,
    },

    /// The random layout weights cannot be sampled from.
    #[error("invalid state chances: {reason}")]
    StateChances {
        /// Description of the problem.
        reason: String,
    },

    /// A random layout was requested with a zero width or height.
    #[error("random layout needs a non-zero size, got {width}x{height}")]
    EmptyLayout {
        /// Configured width.
        width: usize,
        /// Configured height.
        height: usize,
    },
}

/// Build the grid described by `config`.
///
/// Explicit `rows` are padded to at least `width` x `height` when those are
/// set: short rows and missing rows are filled with the grid's default
/// state. Without `rows`, a `width` x `height` layout (default
/// [`DEFAULT_SIZE`] on each side) is drawn at random, using
/// `state_chances` as relative weights indexed by state value, or a uniform
/// choice over the valid states when no weights are given.
///
/// # Errors
///
/// Returns [`FactoryError`] if the cell type is unknown, a rule table is
/// missing or malformed, the random layout weights are unusable, or the
/// grid rejects the layout.
pub fn make_grid(config: &SimulationConfig) -> Result<BuiltGrid, FactoryError> {
    let grid = &config.grid;
    let kind: CellKind = grid.cell_type.parse()?;
    let rule = rule_for(kind, grid.rule_table.as_deref())?;

    let params: ParamMap = config.params.iter().map(|(name, value)| (name, *value)).collect();
    let states = grid
        .states
        .clone()
        .unwrap_or_else(|| rule.default_states(&with_defaults(rule.as_ref(), &params)));
    let fill = fill_state(&states);

    let rows = match &grid.rows {
        Some(rows) => pad_rows(rows, grid.width.unwrap_or(0), grid.height.unwrap_or(0), fill),
        None => random_rows(
            grid.width.unwrap_or(DEFAULT_SIZE),
            grid.height.unwrap_or(DEFAULT_SIZE),
            &states,
            grid.state_chances.as_deref(),
            config.run.seed,
        )?,
    };
    debug!(
        %kind,
        width = rows.first().map_or(0, Vec::len),
        height = rows.len(),
        explicit = grid.rows.is_some(),
        "Initial layout ready"
    );

    let mut builder = GridBuilder::new(rule)
        .topology(grid.topology)
        .params(params)
        .seed(config.run.seed);
    if let Some(edge) = grid.edge {
        builder = builder.edge(edge);
    }
    if let Some(flags) = &grid.mask {
        builder = builder.mask(NeighborMask::from_flags(flags));
    }
    if let Some(states) = &grid.states {
        builder = builder.states(states.clone());
    }

    let built = builder.build(&rows)?;
    info!(
        run = %config.run.name,
        %kind,
        width = built.grid.width(),
        height = built.grid.height(),
        "Grid created from configuration"
    );
    Ok(built)
}

fn with_defaults(rule: &dyn CellRule, params: &ParamMap) -> ParamMap {
    let mut params = params.clone();
    for (name, value) in rule.default_params() {
        params.set_default(name, *value);
    }
    params
}

/// The state used for padding: 0 when valid, otherwise the smallest state.
fn fill_state(states: &[i32]) -> i32 {
    if states.contains(&0) {
        0
    } else {
        states.iter().copied().min().unwrap_or(0)
    }
}

fn pad_rows(rows: &[Vec<i32>], width: usize, height: usize, fill: i32) -> Vec<Vec<i32>> {
    let width = rows.iter().map(Vec::len).fold(width, usize::max);
    let height = height.max(rows.len());
    (0..height)
        .map(|r| {
            let mut row = rows.get(r).cloned().unwrap_or_default();
            row.resize(width, fill);
            row
        })
        .collect()
}

fn random_rows(
    width: usize,
    height: usize,
    states: &[i32],
    chances: Option<&[f64]>,
    seed: u64,
) -> Result<Vec<Vec<i32>>, FactoryError> {
    if width == 0 || height == 0 {
        return Err(FactoryError::EmptyLayout { width, height });
    }
    let mut rng = SmallRng::seed_from_u64(seed);

    let Some(chances) = chances else {
        let rows = (0..height)
            .map(|_| {
                (0..width)
                    .map(|_| states.choose(&mut rng).copied().unwrap_or(0))
                    .collect()
            })
            .collect();
        return Ok(rows);
    };

    let weights = WeightedIndex::<f64>::new(chances).map_err(|e| FactoryError::StateChances {
        reason: e.to_string(),
    })?;
    let rows = (0..height)
        .map(|_| {
            (0..width)
                .map(|_| i32::try_from(weights.sample(&mut rng)).unwrap_or(i32::MAX))
                .collect()
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lattice_types::{EdgeMode, Topology};

    use super::*;

    fn config(yaml: &str) -> SimulationConfig {
        SimulationConfig::parse(yaml).unwrap()
    }

    #[test]
    fn default_config_builds_random_conway() {
        let built = make_grid(&SimulationConfig::default()).unwrap();
        assert_eq!(built.grid.kind(), CellKind::Conway);
        assert_eq!((built.grid.width(), built.grid.height()), (20, 20));
        assert_eq!(built.grid.edge(), EdgeMode::Infinite);
        assert!(built.rejected.is_empty());
    }

    #[test]
    fn explicit_rows_are_padded() {
        let cfg = config(
            "grid:\n  cell_type: percolation\n  width: 3\n  height: 3\n  rows:\n    - [1, 1]\n    - [1, 0, 1]\n",
        );
        let built = make_grid(&cfg).unwrap();
        assert_eq!(
            built.grid.state_rows(),
            vec![vec![1, 1, 0], vec![1, 0, 1], vec![0, 0, 0]]
        );
        assert_eq!(built.grid.edge(), EdgeMode::Fixed(3));
    }

    #[test]
    fn rows_wider_than_configured_keep_their_width() {
        let cfg = config("grid:\n  width: 1\n  height: 1\n  rows:\n    - [1, 0, 1, 1]\n");
        let built = make_grid(&cfg).unwrap();
        assert_eq!((built.grid.width(), built.grid.height()), (4, 1));
    }

    #[test]
    fn random_layout_respects_weights() {
        let cfg = config(
            "grid:\n  cell_type: fire\n  width: 8\n  height: 5\n  state_chances: [0.0, 1.0, 0.0]\n",
        );
        let built = make_grid(&cfg).unwrap();
        assert_eq!(built.grid.populations(), vec![0, 40, 0]);
    }

    #[test]
    fn same_seed_same_layout() {
        let cfg = config("run:\n  seed: 5\ngrid:\n  cell_type: wator\nparams:\n  fishBreedTime: 3\n  sharkBreedTime: 5\n  fishFeedEnergy: 2\n  sharkStartEnergy: 3\n");
        let first = make_grid(&cfg).unwrap().grid.state_rows();
        let second = make_grid(&cfg).unwrap().grid.state_rows();
        assert_eq!(first, second);
    }

    #[test]
    fn unusable_weights_are_rejected() {
        let cfg = config("grid:\n  state_chances: [0.0, 0.0]\n");
        assert!(matches!(make_grid(&cfg).unwrap_err(), FactoryError::StateChances { .. }));
        let cfg = config("grid:\n  state_chances: [1.0, -1.0]\n");
        assert!(matches!(make_grid(&cfg).unwrap_err(), FactoryError::StateChances { .. }));
    }

    #[test]
    fn unknown_cell_type_is_reported() {
        let err = make_grid(&config("grid:\n  cell_type: langton\n")).unwrap_err();
        assert!(matches!(err, FactoryError::UnknownCellType { .. }));
        assert!(err.to_string().contains("langton"));
    }

    #[test]
    fn rule_table_without_text_fails() {
        let err = make_grid(&config("grid:\n  cell_type: rule_table\n")).unwrap_err();
        assert!(matches!(
            err,
            FactoryError::RuleTable {
                source: RuleTableError::MissingTable
            }
        ));
    }

    #[test]
    fn overrides_reach_the_grid() {
        let cfg = config(
            "grid:\n  cell_type: conway\n  topology: hex\n  edge: toroidal\n  mask: [1, 1, 0, 1, 1, 0]\n  rows:\n    - [0, 1]\n    - [1, 0]\n",
        );
        let built = make_grid(&cfg).unwrap();
        assert_eq!(built.grid.topology(), Topology::Hex);
        assert_eq!(built.grid.edge(), EdgeMode::Toroidal);
        assert_eq!(built.grid.mask().map(NeighborMask::active_count), Some(4));
    }

    #[test]
    fn wrong_mask_length_is_a_grid_error() {
        let cfg = config("grid:\n  mask: [1, 0, 1]\n  rows:\n    - [0]\n");
        assert!(matches!(
            make_grid(&cfg).unwrap_err(),
            FactoryError::Grid {
                source: GridError::MaskLength { expected: 8, actual: 3 }
            }
        ));
    }

    #[test]
    fn out_of_range_rows_are_reported_not_fatal() {
        let cfg = config("grid:\n  cell_type: conway\n  rows:\n    - [0, 7]\n");
        let built = make_grid(&cfg).unwrap();
        assert_eq!(built.rejected.len(), 1);
        assert_eq!(built.grid.state(0, 1), Some(0));
    }
}
