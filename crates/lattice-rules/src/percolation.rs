//! Percolation from a sentinel edge.
//!
//! The default edge is a fixed phantom carrying [`EDGE`]. A cell whose
//! first (north) neighbor slot carries the sentinel treats that slot as
//! percolated, which bootstraps flow into the top row from outside the
//! grid. Open cells next to a percolated cell percolate; blocked and
//! percolated cells never change.

use lattice_grid::{CellRule, PlanContext, RuleError};
use lattice_types::{CellKind, EdgeMode, ParamMap};

/// Impassable cell.
pub const BLOCKED: i32 = 0;
/// Open, dry cell.
pub const OPEN: i32 = 1;
/// Open cell the flow has reached.
pub const PERCOLATED: i32 = 2;
/// Phantom edge state that seeds the flow.
pub const EDGE: i32 = 3;

/// Flow through open cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct Percolation;

impl CellRule for Percolation {
    fn kind(&self) -> CellKind {
        CellKind::Percolation
    }

    fn plan(&self, ctx: &mut PlanContext<'_>) -> Result<(), RuleError> {
        let neighbors = ctx.neighbors();
        let source = neighbors.get(0).ok_or(RuleError::InvalidNeighborhood {
            slot: 0,
            available: neighbors.len(),
        })?;
        let next = match ctx.state() {
            OPEN => {
                let reached = source.state == EDGE
                    || neighbors.states().any(|s| s == PERCOLATED);
                if reached { PERCOLATED } else { OPEN }
            }
            other => other,
        };
        ctx.set_next(next);
        Ok(())
    }

    fn default_edge(&self) -> EdgeMode {
        EdgeMode::Fixed(EDGE)
    }

    fn default_states(&self, _params: &ParamMap) -> Vec<i32> {
        vec![BLOCKED, OPEN, PERCOLATED]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lattice_types::Topology;

    use super::*;
    use crate::test_support::build;

    #[test]
    fn top_row_percolates_from_edge() {
        let mut grid = build(Percolation, Topology::Rect, ParamMap::new(), &[vec![1, 0, 1], vec![1, 1, 0]]);
        grid.step().unwrap();
        assert_eq!(grid.state_rows(), vec![vec![2, 0, 2], vec![1, 1, 0]]);
        grid.step().unwrap();
        assert_eq!(grid.state_rows(), vec![vec![2, 0, 2], vec![2, 2, 0]]);
    }

    #[test]
    fn side_edges_do_not_seed_flow() {
        // Only the north slot carries the sentinel into the grid.
        let mut grid = build(Percolation, Topology::Rect, ParamMap::new(), &[vec![0, 0], vec![1, 0]]);
        grid.step().unwrap();
        assert_eq!(grid.state(1, 0), Some(OPEN));
    }

    #[test]
    fn blocked_cells_never_change() {
        let mut grid = build(Percolation, Topology::Rect, ParamMap::new(), &[vec![0, 2], vec![2, 0]]);
        for _ in 0..3 {
            grid.step().unwrap();
        }
        assert_eq!(grid.state_rows(), vec![vec![0, 2], vec![2, 0]]);
    }
}
