//! Wa-Tor predator/prey.
//!
//! Every cell starts the step in the free-cell queue. A cell acts only if it
//! can still remove itself from the queue, so a cell that a mover has
//! already claimed (moved into, or eaten) does not act a second time.
//!
//! Each acting cell counts down its reproduction timer. Fish move to a
//! random open neighbor; sharks prefer a random fish neighbor, fall back to
//! an open one, and lose one unit of energy per step, dying at zero. A
//! mover swaps its per-cell parameters with its destination, so energy and
//! timers travel with the animal. When the carried timer has run out the
//! mover also leaves a newborn of its kind behind and both timers reset.
//!
//! Destinations are filtered on what other movers have already planned: an
//! open cell is one nobody has planned to fill, and a fish is one that has
//! not already moved away or been eaten.

use lattice_grid::{CellRule, CellState, PlanContext, RuleError};
use lattice_types::{CellKind, EdgeMode, ParamError, ParamMap};
use rand::seq::IndexedRandom;

/// Open water.
pub const WATER: i32 = 0;
/// Fish.
pub const FISH: i32 = 1;
/// Shark.
pub const SHARK: i32 = 2;
/// State carried by masked-out neighbor slots, never a valid destination.
pub const PHANTOM: i32 = -1;

/// Steps a fish must survive before breeding.
pub const FISH_BREED_TIME: &str = "fishBreedTime";
/// Steps a shark must survive before breeding.
pub const SHARK_BREED_TIME: &str = "sharkBreedTime";
/// Energy a shark gains from eating a fish.
pub const FISH_FEED_ENERGY: &str = "fishFeedEnergy";
/// Energy a newborn shark starts with.
pub const SHARK_START_ENERGY: &str = "sharkStartEnergy";
/// Per-cell countdown to breeding.
pub const REPRODUCTION_TIMER: &str = "reproductionTimer";
/// Per-cell shark energy.
pub const ENERGY: &str = "energy";

/// Predator/prey on a toroidal ocean.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaTor;

impl WaTor {
    /// Distinct real neighbor cells in `state` that nobody has planned away
    /// from it.
    ///
    /// On small tori several slots can wrap to the same cell; each cell is
    /// listed once so the random pick stays uniform over cells.
    fn candidates(ctx: &PlanContext<'_>, state: i32) -> Vec<usize> {
        let mut found: Vec<usize> = ctx
            .neighbors()
            .iter()
            .filter(|n| n.state == state)
            .filter_map(|n| n.index)
            .filter(|i| *i != ctx.index())
            .filter(|i| ctx.next_of(*i).is_none_or(|next| next == state))
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Take `target` out of the queue so it does not act this step.
    ///
    /// A lost claim means the target already acted. It can only have
    /// planned to stay as it is (anything else fails the `candidates`
    /// filter), so the move goes ahead either way.
    fn occupy(ctx: &mut PlanContext<'_>, target: usize) {
        ctx.claim(target);
    }

    fn plan_fish(ctx: &mut PlanContext<'_>) -> Result<(), RuleError> {
        let open = Self::candidates(ctx, WATER);
        let Some(target) = open.choose(ctx.rng()).copied() else {
            ctx.set_next(FISH);
            return Ok(());
        };

        Self::occupy(ctx, target);
        ctx.swap_params_with(target);
        ctx.set_next_of(target, FISH);
        ctx.set_next(WATER);

        if ctx.cell_param_of(target, REPRODUCTION_TIMER)? <= 0.0 {
            let breed_time = ctx.param(FISH_BREED_TIME)?;
            ctx.set_next(FISH);
            ctx.set_cell_param(REPRODUCTION_TIMER, breed_time);
            ctx.set_cell_param_of(target, REPRODUCTION_TIMER, breed_time);
        }
        Ok(())
    }

    fn plan_shark(ctx: &mut PlanContext<'_>) -> Result<(), RuleError> {
        let energy = ctx.cell_param(ENERGY)? - 1.0;
        ctx.set_cell_param(ENERGY, energy);
        if energy <= 0.0 {
            ctx.set_next(WATER);
            return Ok(());
        }

        let prey = Self::candidates(ctx, FISH);
        let (target, eats) = if let Some(fish) = prey.choose(ctx.rng()).copied() {
            (fish, true)
        } else {
            let open = Self::candidates(ctx, WATER);
            let Some(water) = open.choose(ctx.rng()).copied() else {
                ctx.set_next(SHARK);
                return Ok(());
            };
            (water, false)
        };

        if eats {
            ctx.set_cell_param(ENERGY, energy + ctx.param(FISH_FEED_ENERGY)?);
        }
        Self::occupy(ctx, target);
        ctx.swap_params_with(target);
        ctx.set_next_of(target, SHARK);
        ctx.set_next(WATER);

        if ctx.cell_param_of(target, REPRODUCTION_TIMER)? <= 0.0 {
            let breed_time = ctx.param(SHARK_BREED_TIME)?;
            ctx.set_next(SHARK);
            ctx.set_cell_param(ENERGY, ctx.param(SHARK_START_ENERGY)?);
            ctx.set_cell_param(REPRODUCTION_TIMER, breed_time);
            ctx.set_cell_param_of(target, REPRODUCTION_TIMER, breed_time);
        }
        Ok(())
    }
}

impl CellRule for WaTor {
    fn kind(&self) -> CellKind {
        CellKind::WaTor
    }

    fn plan(&self, ctx: &mut PlanContext<'_>) -> Result<(), RuleError> {
        let own = ctx.index();
        if !ctx.claim(own) {
            return Ok(());
        }

        let timer = ctx.cell_param(REPRODUCTION_TIMER)?;
        ctx.set_cell_param(REPRODUCTION_TIMER, timer - 1.0);

        match ctx.state() {
            FISH => Self::plan_fish(ctx),
            SHARK => Self::plan_shark(ctx),
            state => {
                if ctx.next().is_none() {
                    ctx.set_next(state);
                }
                Ok(())
            }
        }
    }

    fn default_edge(&self) -> EdgeMode {
        EdgeMode::Toroidal
    }

    fn default_states(&self, _params: &ParamMap) -> Vec<i32> {
        vec![WATER, FISH, SHARK]
    }

    fn phantom_state(&self) -> i32 {
        PHANTOM
    }

    fn param_names(&self) -> &'static [&'static str] {
        &[FISH_BREED_TIME, SHARK_BREED_TIME, FISH_FEED_ENERGY, SHARK_START_ENERGY]
    }

    fn joins_free_queue(&self, _state: i32) -> bool {
        true
    }

    fn init_cell(&self, cell: &mut CellState, params: &ParamMap) -> Result<(), ParamError> {
        let (timer, energy) = match cell.state {
            FISH => (params.get(FISH_BREED_TIME)?, 0.0),
            SHARK => (params.get(SHARK_BREED_TIME)?, params.get(SHARK_START_ENERGY)?),
            _ => (0.0, 0.0),
        };
        cell.params.set(REPRODUCTION_TIMER, timer);
        cell.params.set(ENERGY, energy);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use lattice_grid::GridError;
    use lattice_types::Topology;

    use super::*;
    use crate::test_support::{build, params};

    fn ocean() -> ParamMap {
        params(&[
            (FISH_BREED_TIME, 3.0),
            (SHARK_BREED_TIME, 5.0),
            (FISH_FEED_ENERGY, 2.0),
            (SHARK_START_ENERGY, 3.0),
        ])
    }

    #[test]
    fn init_sets_agent_parameters() {
        let grid = build(WaTor, Topology::Rect, ocean(), &[vec![0, 1, 2]]);
        let fish = grid.cell(0, 1).unwrap();
        assert_eq!(fish.params.get(REPRODUCTION_TIMER).unwrap(), 3.0);
        assert_eq!(fish.params.get(ENERGY).unwrap(), 0.0);
        let shark = grid.cell(0, 2).unwrap();
        assert_eq!(shark.params.get(REPRODUCTION_TIMER).unwrap(), 5.0);
        assert_eq!(shark.params.get(ENERGY).unwrap(), 3.0);
    }

    #[test]
    fn missing_breed_time_is_a_construction_error() {
        let err = lattice_grid::GridBuilder::new(Box::new(WaTor))
            .build(&[vec![1]])
            .unwrap_err();
        assert!(matches!(err, GridError::Param(ParamError::Unset { .. })));
    }

    #[test]
    fn lone_fish_moves_and_keeps_its_timer() {
        let mut grid = build(WaTor, Topology::Rect, ocean(), &[vec![0, 0, 0], vec![0, 1, 0], vec![0, 0, 0]]);
        grid.step().unwrap();
        assert_eq!(grid.populations(), vec![8, 1, 0]);
        assert_eq!(grid.state(1, 1), Some(WATER));
        let moved = (0..3)
            .flat_map(|r| (0..3).map(move |c| (r, c)))
            .find(|(r, c)| grid.state(*r, *c) == Some(FISH))
            .unwrap();
        let fish = grid.cell(moved.0, moved.1).unwrap();
        assert_eq!(fish.params.get(REPRODUCTION_TIMER).unwrap(), 2.0);
    }

    #[test]
    fn fish_breeds_when_timer_runs_out() {
        let mut grid = build(
            WaTor,
            Topology::Rect,
            params(&[
                (FISH_BREED_TIME, 1.0),
                (SHARK_BREED_TIME, 5.0),
                (FISH_FEED_ENERGY, 2.0),
                (SHARK_START_ENERGY, 3.0),
            ]),
            &[vec![1, 0, 0, 0]],
        );
        grid.step().unwrap();
        assert_eq!(grid.populations(), vec![2, 2, 0]);
        assert_eq!(grid.state(0, 0), Some(FISH));
        assert_eq!(grid.cell(0, 0).unwrap().params.get(REPRODUCTION_TIMER).unwrap(), 1.0);
    }

    #[test]
    fn starving_shark_dies_on_next_commit() {
        let mut grid = build(
            WaTor,
            Topology::Rect,
            params(&[
                (FISH_BREED_TIME, 3.0),
                (SHARK_BREED_TIME, 5.0),
                (FISH_FEED_ENERGY, 2.0),
                (SHARK_START_ENERGY, 1.0),
            ]),
            &[vec![0, 2, 0]],
        );
        grid.step().unwrap();
        assert_eq!(grid.populations(), vec![3, 0, 0]);
    }

    #[test]
    fn shark_eats_adjacent_fish() {
        let mut grid = build(WaTor, Topology::Rect, ocean(), &[vec![2, 1]]);
        grid.step().unwrap();
        // On a 1x2 torus every neighbor slot is one of the two cells.
        assert_eq!(grid.state_rows(), vec![vec![0, 2]]);
        let shark = grid.cell(0, 1).unwrap();
        assert_eq!(shark.params.get(ENERGY).unwrap(), 4.0);
        assert_eq!(shark.params.get(REPRODUCTION_TIMER).unwrap(), 4.0);
    }

    #[test]
    fn failed_step_leaves_agents_untouched() {
        let rows = vec![vec![1, 0, 0, 0], vec![0, 0, 0, 0], vec![0, 0, 2, 1]];
        let mut grid = build(
            WaTor,
            Topology::Rect,
            params(&[(FISH_BREED_TIME, 3.0), (SHARK_BREED_TIME, 5.0), (SHARK_START_ENERGY, 3.0)]),
            &rows,
        );
        let agents = |grid: &lattice_grid::Grid| -> Vec<ParamMap> {
            (0..3)
                .flat_map(|r| (0..4).map(move |c| (r, c)))
                .map(|(r, c)| grid.cell(r, c).unwrap().params.clone())
                .collect()
        };
        let before = agents(&grid);

        // The shark at (2, 2) finds the fish at (2, 3) and needs the feed
        // energy, after the fish at (0, 0) has already moved.
        assert!(matches!(
            grid.step(),
            Err(GridError::Rule { row: 2, col: 2, .. })
        ));
        assert_eq!(grid.state_rows(), rows);
        assert_eq!(agents(&grid), before);

        grid.set_param(FISH_FEED_ENERGY, 2.0);
        grid.step().unwrap();
        assert_eq!(grid.populations(), vec![10, 1, 1]);
        let (r, c) = (0..3)
            .flat_map(|r| (0..4).map(move |c| (r, c)))
            .find(|(r, c)| grid.state(*r, *c) == Some(SHARK))
            .unwrap();
        let shark = grid.cell(r, c).unwrap();
        assert_eq!(shark.params.get(ENERGY).unwrap(), 4.0);
        assert_eq!(shark.params.get(REPRODUCTION_TIMER).unwrap(), 4.0);
    }

    #[test]
    fn open_neighbors_are_picked_uniformly_on_a_narrow_torus() {
        // On a 2x3 torus the fish at (0, 0) has five distinct open
        // neighbors, but the three in row 1 fill six of the eight slots.
        let trials: u32 = 2000;
        let mut into_row_one: u32 = 0;
        for seed in 0..u64::from(trials) {
            let mut grid = lattice_grid::GridBuilder::new(Box::new(WaTor))
                .params(ocean())
                .seed(seed)
                .build(&[vec![1, 0, 0], vec![0, 0, 0]])
                .unwrap()
                .grid;
            grid.step().unwrap();
            if grid.state_rows().get(1).unwrap().contains(&FISH) {
                into_row_one = into_row_one.saturating_add(1);
            }
        }
        let share = f64::from(into_row_one) / f64::from(trials);
        assert!((0.55..0.65).contains(&share), "row 1 share {share}");
    }

    #[test]
    fn boxed_in_animals_stay() {
        let rows = vec![vec![2, 2], vec![2, 2]];
        let mut grid = build(WaTor, Topology::Rect, ocean(), &rows);
        grid.step().unwrap();
        assert_eq!(grid.state_rows(), rows);
    }
}
