//! Forest fire spread.
//!
//! Burning cells burn out, and trees next to a burning cell catch fire with
//! probability `probCatch`. On 8-neighbor lattices the default mask keeps
//! only the four edge-sharing neighbors, so fire spreads 4-connected.
//! Triangles pointing up have their neighbor ring rotated by half a turn
//! before masking, so one mask describes both orientations.

use lattice_grid::{CellRule, NeighborMask, PlanContext, RuleError};
use lattice_types::{CellKind, EdgeMode, ParamMap};
use rand::Rng;

/// No fuel.
pub const EMPTY: i32 = 0;
/// Unburnt tree.
pub const TREE: i32 = 1;
/// Burning tree.
pub const BURNING: i32 = 2;

/// Probability that a tree next to a fire catches in one step.
pub const PROB_CATCH: &str = "probCatch";

/// Keeps north, east, south and west of the 8-slot ring.
const FOUR_CONNECTED: [u8; 8] = [1, 0, 1, 0, 1, 0, 1, 0];

/// Probabilistic fire spread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fire;

impl CellRule for Fire {
    fn kind(&self) -> CellKind {
        CellKind::Fire
    }

    fn plan(&self, ctx: &mut PlanContext<'_>) -> Result<(), RuleError> {
        let next = match ctx.state() {
            TREE => {
                let exposed = ctx.neighbors().states().any(|s| s == BURNING);
                if exposed && ctx.rng().random::<f64>() < ctx.param(PROB_CATCH)? {
                    BURNING
                } else {
                    TREE
                }
            }
            BURNING => EMPTY,
            other => other,
        };
        ctx.set_next(next);
        Ok(())
    }

    fn default_edge(&self) -> EdgeMode {
        EdgeMode::Fixed(EMPTY)
    }

    fn default_states(&self, _params: &ParamMap) -> Vec<i32> {
        vec![EMPTY, TREE, BURNING]
    }

    fn default_mask(&self, neighbor_count: usize) -> Option<NeighborMask> {
        (neighbor_count == FOUR_CONNECTED.len()).then(|| NeighborMask::from_flags(&FOUR_CONNECTED))
    }

    fn param_names(&self) -> &'static [&'static str] {
        &[PROB_CATCH]
    }

    fn rotates_when_pointing_up(&self) -> bool {
        true
    }
}
