//! Grid builders shared by the rule tests.

#![allow(clippy::unwrap_used)]

use lattice_grid::{CellRule, Grid, GridBuilder};
use lattice_types::{EdgeMode, ParamMap, Topology};

/// A grid under the rule's default edge, seeded for repeatable tests.
pub fn build(rule: impl CellRule + 'static, topology: Topology, params: ParamMap, rows: &[Vec<i32>]) -> Grid {
    GridBuilder::new(Box::new(rule))
        .topology(topology)
        .params(params)
        .seed(42)
        .build(rows)
        .unwrap()
        .grid
}

/// A rectangular grid with an explicit edge mode.
pub fn grid_with_edge(rule: impl CellRule + 'static, edge: EdgeMode, rows: &[Vec<i32>]) -> Grid {
    GridBuilder::new(Box::new(rule))
        .edge(edge)
        .seed(42)
        .build(rows)
        .unwrap()
        .grid
}

/// A parameter map from literal pairs.
pub fn params(pairs: &[(&str, f64)]) -> ParamMap {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}
