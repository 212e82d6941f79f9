//! Serializable view of a grid for renderers.

use lattice_grid::Grid;
use lattice_types::{CellKind, Topology};
use serde::{Deserialize, Serialize};

/// The states of every cell at one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Rule family driving the grid.
    pub kind: CellKind,
    /// Lattice shape, which tells a renderer how to draw the cells.
    pub topology: Topology,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Steps completed when the snapshot was taken.
    pub generation: u64,
    /// Cell states, one list per row.
    pub states: Vec<Vec<i32>>,
}

impl GridSnapshot {
    /// Capture the current state of `grid`.
    pub fn capture(grid: &Grid) -> Self {
        Self {
            kind: grid.kind(),
            topology: grid.topology(),
            width: grid.width(),
            height: grid.height(),
            generation: grid.generation(),
            states: grid.state_rows(),
        }
    }
}

impl From<&Grid> for GridSnapshot {
    fn from(grid: &Grid) -> Self {
        Self::capture(grid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lattice_grid::GridBuilder;
    use lattice_rules::Conway;

    use super::*;

    #[test]
    fn snapshot_tracks_generation_and_growth() {
        let mut grid = GridBuilder::new(Box::new(Conway))
            .build(&[vec![0, 0, 0], vec![1, 1, 1], vec![0, 0, 0]])
            .unwrap()
            .grid;
        let before = GridSnapshot::capture(&grid);
        assert_eq!(before.generation, 0);
        assert_eq!(before.states.len(), before.height);

        grid.step().unwrap();
        let after = GridSnapshot::from(&grid);
        assert_eq!(after.generation, 1);
        assert_eq!(after.width, grid.width());
        assert_eq!(after.states, grid.state_rows());
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let grid = GridBuilder::new(Box::new(Conway)).build(&[vec![1, 0]]).unwrap().grid;
        let json = serde_json::to_value(GridSnapshot::capture(&grid)).unwrap();
        assert_eq!(json["kind"], "conway");
        assert_eq!(json["topology"], "rect");
        assert_eq!(json["states"], serde_json::json!([[1, 0]]));

        let back: GridSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.width, 2);
    }
}
