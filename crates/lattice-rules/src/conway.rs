//! Conway's Game of Life.
//!
//! A dead cell with exactly three live neighbors is born; a live cell with
//! two or three live neighbors survives; every other cell dies. Neighbor
//! states are summed, so the rule works unchanged on every topology.

use lattice_grid::{CellRule, PlanContext, RuleError};
use lattice_types::{CellKind, EdgeMode, ParamMap};

/// Dead cell.
pub const DEAD: i32 = 0;
/// Live cell.
pub const ALIVE: i32 = 1;

/// B3/S23 life.
#[derive(Debug, Clone, Copy, Default)]
pub struct Conway;

impl CellRule for Conway {
    fn kind(&self) -> CellKind {
        CellKind::Conway
    }

    fn plan(&self, ctx: &mut PlanContext<'_>) -> Result<(), RuleError> {
        let sum = ctx.neighbors().states().fold(0_i32, i32::saturating_add);
        let next = match (ctx.state(), sum) {
            (DEAD, 3) | (ALIVE, 2 | 3) => ALIVE,
            _ => DEAD,
        };
        ctx.set_next(next);
        Ok(())
    }

    fn default_edge(&self) -> EdgeMode {
        EdgeMode::Infinite
    }

    fn default_states(&self, _params: &ParamMap) -> Vec<i32> {
        vec![DEAD, ALIVE]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::grid_with_edge;

    #[test]
    fn blinker_oscillates() {
        let mut grid = grid_with_edge(
            Conway,
            EdgeMode::Fixed(DEAD),
            &[
                vec![0, 0, 0, 0, 0],
                vec![0, 0, 1, 0, 0],
                vec![0, 0, 1, 0, 0],
                vec![0, 0, 1, 0, 0],
                vec![0, 0, 0, 0, 0],
            ],
        );
        grid.step().unwrap();
        assert_eq!(
            grid.state_rows(),
            vec![
                vec![0, 0, 0, 0, 0],
                vec![0, 0, 0, 0, 0],
                vec![0, 1, 1, 1, 0],
                vec![0, 0, 0, 0, 0],
                vec![0, 0, 0, 0, 0],
            ]
        );
        grid.step().unwrap();
        assert_eq!(grid.state(1, 2), Some(ALIVE));
        assert_eq!(grid.state(2, 1), Some(DEAD));
    }

    #[test]
    fn block_is_still_life() {
        let rows = vec![
            vec![0, 0, 0, 0],
            vec![0, 1, 1, 0],
            vec![0, 1, 1, 0],
            vec![0, 0, 0, 0],
        ];
        let mut grid = grid_with_edge(Conway, EdgeMode::Infinite, &rows);
        let outcome = grid.step_detailed().unwrap();
        assert!(!outcome.resized);
        assert_eq!(outcome.changed, 0);
        assert_eq!(grid.state_rows(), rows);
    }

    #[test]
    fn lonely_cell_dies() {
        let mut grid = grid_with_edge(Conway, EdgeMode::Fixed(DEAD), &[vec![0, 0, 0], vec![0, 1, 0], vec![0, 0, 0]]);
        grid.step().unwrap();
        assert_eq!(grid.populations(), vec![9, 0]);
    }
}
