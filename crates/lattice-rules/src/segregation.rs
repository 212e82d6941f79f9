//! Schelling segregation.
//!
//! A resident is happy when the share of same-group residents among its
//! non-empty neighbors exceeds `happinessThresh`, or when it has no
//! non-empty neighbors at all. An unhappy resident claims a random free
//! cell, plans to move there, and releases its own cell into the queue so a
//! later mover may take it in the same step. With no free cell left it
//! stays put.

use lattice_grid::{CellRule, PlanContext, RuleError};
use lattice_types::{CellKind, EdgeMode, ParamMap};

/// Vacant lot.
pub const EMPTY: i32 = 0;
/// First group.
pub const GROUP_A: i32 = 1;
/// Second group.
pub const GROUP_B: i32 = 2;

/// Minimum same-group share a resident needs to stay.
pub const HAPPINESS_THRESH: &str = "happinessThresh";

/// Residential segregation with migration to free cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segregation;

impl Segregation {
    /// Whether a resident in `state` is content among `neighbors`.
    pub fn is_happy(state: i32, neighbors: impl Iterator<Item = i32>, threshold: f64) -> bool {
        let (occupied, same) = neighbors.fold((0_u32, 0_u32), |(occupied, same), s| {
            (
                occupied.saturating_add(u32::from(s > EMPTY)),
                same.saturating_add(u32::from(s == state)),
            )
        });
        occupied == 0 || f64::from(same) / f64::from(occupied) > threshold
    }
}

impl CellRule for Segregation {
    fn kind(&self) -> CellKind {
        CellKind::Segregation
    }

    fn plan(&self, ctx: &mut PlanContext<'_>) -> Result<(), RuleError> {
        let state = ctx.state();
        if state == EMPTY {
            // A mover may already have claimed this cell.
            if ctx.next().is_none() {
                ctx.set_next(EMPTY);
            }
            return Ok(());
        }

        let threshold = ctx.param(HAPPINESS_THRESH)?;
        if Self::is_happy(state, ctx.neighbors().states(), threshold) {
            ctx.set_next(state);
            return Ok(());
        }

        match ctx.claim_random() {
            Some(target) => {
                ctx.set_next_of(target, state);
                ctx.set_next(EMPTY);
                let own = ctx.index();
                ctx.release(own);
            }
            None => ctx.set_next(state),
        }
        Ok(())
    }

    fn default_edge(&self) -> EdgeMode {
        EdgeMode::Fixed(EMPTY)
    }

    fn default_states(&self, _params: &ParamMap) -> Vec<i32> {
        vec![EMPTY, GROUP_A, GROUP_B]
    }

    fn param_names(&self) -> &'static [&'static str] {
        &[HAPPINESS_THRESH]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lattice_types::Topology;

    use super::*;
    use crate::test_support::{build, params};

    #[test]
    fn happiness_counts_only_occupied_neighbors() {
        assert!(Segregation::is_happy(1, [0, 0, 0].into_iter(), 0.9));
        assert!(Segregation::is_happy(1, [1, 1, 2, 0].into_iter(), 0.5));
        assert!(!Segregation::is_happy(1, [1, 2, 0].into_iter(), 0.5));
        assert!(!Segregation::is_happy(2, [1, 1, 1].into_iter(), 0.0));
    }

    #[test]
    fn unhappy_resident_moves_to_free_cell() {
        let mut grid = build(
            Segregation,
            Topology::Rect,
            params(&[(HAPPINESS_THRESH, 0.5)]),
            &[vec![1, 2, 0, 0, 0]],
        );
        let before = grid.populations();
        grid.step().unwrap();
        assert_eq!(grid.populations(), before);
        // Both residents were unhappy next to each other and both moved. The
        // second mover may have taken the cell the first one released.
        assert_ne!(grid.state(0, 0), Some(GROUP_A));
        assert_eq!(grid.state(0, 1), Some(EMPTY));
    }

    #[test]
    fn no_free_cell_means_no_move() {
        let rows = vec![vec![1, 2], vec![2, 1]];
        let mut grid = build(Segregation, Topology::Rect, params(&[(HAPPINESS_THRESH, 0.9)]), &rows);
        grid.step().unwrap();
        assert_eq!(grid.state_rows(), rows);
    }

    #[test]
    fn content_residents_stay() {
        let rows = vec![vec![1, 1, 0], vec![1, 1, 0]];
        let mut grid = build(Segregation, Topology::Rect, params(&[(HAPPINESS_THRESH, 0.3)]), &rows);
        let outcome = grid.step_detailed().unwrap();
        assert_eq!(outcome.changed, 0);
        assert_eq!(outcome.healed, 0);
        assert_eq!(grid.state_rows(), rows);
    }
}
