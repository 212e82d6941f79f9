//! Per-cell state and the two-phase rule contract.
//!
//! A step is split into a planning pass and a commit pass. During planning
//! every cell computes its `next_state` from the previous generation only;
//! the commit pass then moves `next_state` into `state` for every cell at
//! once. Rules implement [`CellRule::plan`] and never see a half-updated
//! generation, because committed states only change in [`CellState::commit`].
//!
//! Mobility rules (Segregation, Wa-Tor) are allowed one narrow exception:
//! while planning they may write another cell's `next_state` and swap
//! per-cell parameters with it. They do this through [`PlanContext`], which
//! addresses cells by flat index and arbitrates destinations through the
//! shared [`FreeCellQueue`].

use std::fmt;

use lattice_types::{CellKind, EdgeMode, ParamError, ParamMap};
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::mask::{Neighborhood, NeighborMask};
use crate::queue::FreeCellQueue;

// ---------------------------------------------------------------------------
// CellState
// ---------------------------------------------------------------------------

/// A cell's committed state, its pending next state, and its own parameters.
///
/// Per-cell parameters hold agent data that travels with a mover (Wa-Tor
/// energy and reproduction timer). Simulation-wide parameters live on the
/// grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellState {
    /// The committed state visible to neighbors this generation.
    pub state: i32,
    /// The state planned for the next generation, `None` until planned.
    pub next_state: Option<i32>,
    /// Agent parameters owned by this cell.
    pub params: ParamMap,
}

/// What [`CellState::commit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The planned state equals the previous one.
    Unchanged,
    /// The planned state differs from the previous one.
    Changed,
    /// Nothing was planned; the previous state was kept.
    Healed,
}

impl CellState {
    /// A cell in `state` with no parameters and nothing planned.
    pub const fn new(state: i32) -> Self {
        Self {
            state,
            next_state: None,
            params: ParamMap::new(),
        }
    }

    /// Move the planned state into `state` and clear the plan.
    ///
    /// A cell that was never planned keeps its previous state.
    pub const fn commit(&mut self) -> CommitOutcome {
        match self.next_state.take() {
            Some(next) if next == self.state => CommitOutcome::Unchanged,
            Some(next) => {
                self.state = next;
                CommitOutcome::Changed
            }
            None => CommitOutcome::Healed,
        }
    }

    /// Cycle the state through `0..=max`, wrapping to 0 past `max`.
    ///
    /// Used for interactive toggling only; it does not touch the plan.
    pub fn increment_state(&mut self, max: i32) {
        let modulus = max.saturating_add(1);
        self.state = self
            .state
            .saturating_add(1)
            .checked_rem_euclid(modulus)
            .unwrap_or(0);
    }
}

// ---------------------------------------------------------------------------
// Rule contract
// ---------------------------------------------------------------------------

/// Transition rule shared by every cell of a grid.
///
/// The grid owns exactly one rule object; per-cell data lives in
/// [`CellState`]. Everything besides [`CellRule::plan`] describes the rule
/// to the grid at construction time.
pub trait CellRule: fmt::Debug + Send + Sync {
    /// The rule family.
    fn kind(&self) -> CellKind;

    /// Plan the next state of the cell described by `ctx`.
    ///
    /// Must set the cell's next state on every path it intends to change;
    /// an unplanned cell is healed to its previous state at commit.
    fn plan(&self, ctx: &mut PlanContext<'_>) -> Result<(), RuleError>;

    /// Edge mode used when the configuration does not override it.
    fn default_edge(&self) -> EdgeMode;

    /// Valid states declared when the configuration does not list them.
    fn default_states(&self, params: &ParamMap) -> Vec<i32>;

    /// Mask used when the configuration does not supply one.
    ///
    /// Ignored by the grid if its length does not match the topology.
    fn default_mask(&self, _neighbor_count: usize) -> Option<NeighborMask> {
        None
    }

    /// State carried by masked-out neighbor slots.
    fn phantom_state(&self) -> i32 {
        0
    }

    /// Names of the tunable simulation parameters, in display order.
    fn param_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Parameters filled in when the configuration leaves them unset.
    fn default_params(&self) -> &'static [(&'static str, f64)] {
        &[]
    }

    /// Whether a cell in `state` is queued as a free cell at the start of a
    /// step.
    fn joins_free_queue(&self, state: i32) -> bool {
        state == 0
    }

    /// Set up per-cell parameters for a cell that has just been given its
    /// state outside of a step (construction, padding, increment).
    fn init_cell(&self, _cell: &mut CellState, _params: &ParamMap) -> Result<(), ParamError> {
        Ok(())
    }

    /// Whether triangles pointing up see their neighbor ring rotated by
    /// half a turn before masking.
    fn rotates_when_pointing_up(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Planning context
// ---------------------------------------------------------------------------

/// Everything a rule may read or write while planning one cell.
///
/// Borrows disjoint parts of the grid for the duration of one `plan` call.
/// Other cells are addressed by flat index; indices outside the grid are
/// ignored by the setters and read as `None`.
#[derive(Debug)]
pub struct PlanContext<'a> {
    index: usize,
    points_up: bool,
    cells: &'a mut [CellState],
    neighbors: &'a Neighborhood,
    params: &'a ParamMap,
    queue: &'a mut FreeCellQueue,
    rng: &'a mut SmallRng,
}

impl<'a> PlanContext<'a> {
    /// Build a context for the cell at flat index `index`.
    pub const fn new(
        index: usize,
        points_up: bool,
        cells: &'a mut [CellState],
        neighbors: &'a Neighborhood,
        params: &'a ParamMap,
        queue: &'a mut FreeCellQueue,
        rng: &'a mut SmallRng,
    ) -> Self {
        Self {
            index,
            points_up,
            cells,
            neighbors,
            params,
            queue,
            rng,
        }
    }

    /// Flat index of the planning cell.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Committed state of the planning cell.
    pub fn state(&self) -> i32 {
        self.state_of(self.index).unwrap_or(0)
    }

    /// The planning cell's neighbors, masked.
    pub const fn neighbors(&self) -> &Neighborhood {
        self.neighbors
    }

    /// Whether the planning cell is a triangle pointing up.
    pub const fn points_up(&self) -> bool {
        self.points_up
    }

    /// A simulation-wide parameter.
    pub fn param(&self, name: &str) -> Result<f64, ParamError> {
        self.params.get(name)
    }

    /// The shared random number generator.
    pub const fn rng(&mut self) -> &mut SmallRng {
        self.rng
    }

    // -------------------------------------------------------------------
    // Own cell
    // -------------------------------------------------------------------

    /// The planning cell's next state, if already planned (possibly by a
    /// mover that targeted it earlier in this pass).
    pub fn next(&self) -> Option<i32> {
        self.next_of(self.index)
    }

    /// Plan the planning cell's next state.
    pub fn set_next(&mut self, state: i32) {
        self.set_next_of(self.index, state);
    }

    /// One of the planning cell's own parameters.
    pub fn cell_param(&self, name: &str) -> Result<f64, ParamError> {
        self.cell_param_of(self.index, name)
    }

    /// Set one of the planning cell's own parameters.
    pub fn set_cell_param(&mut self, name: &str, value: f64) {
        self.set_cell_param_of(self.index, name, value);
    }

    // -------------------------------------------------------------------
    // Other cells
    // -------------------------------------------------------------------

    /// Committed state of another cell.
    pub fn state_of(&self, index: usize) -> Option<i32> {
        self.cells.get(index).map(|c| c.state)
    }

    /// Planned next state of another cell.
    pub fn next_of(&self, index: usize) -> Option<i32> {
        self.cells.get(index).and_then(|c| c.next_state)
    }

    /// Plan another cell's next state.
    pub fn set_next_of(&mut self, index: usize, state: i32) {
        if let Some(cell) = self.cells.get_mut(index) {
            cell.next_state = Some(state);
        }
    }

    /// One of another cell's parameters.
    pub fn cell_param_of(&self, index: usize, name: &str) -> Result<f64, ParamError> {
        self.cells
            .get(index)
            .map_or_else(|| Err(ParamError::Unset { name: name.to_owned() }), |c| c.params.get(name))
    }

    /// Set one of another cell's parameters.
    pub fn set_cell_param_of(&mut self, index: usize, name: &str, value: f64) {
        if let Some(cell) = self.cells.get_mut(index) {
            cell.params.set(name, value);
        }
    }

    /// Exchange the planning cell's parameters with those of `other`.
    ///
    /// This is how an agent carries its energy and timers when it moves.
    pub fn swap_params_with(&mut self, other: usize) {
        if other == self.index {
            return;
        }
        let Some(mut carried) = self.cells.get_mut(self.index).map(|c| std::mem::take(&mut c.params))
        else {
            return;
        };
        if let Some(target) = self.cells.get_mut(other) {
            target.params.swap(&mut carried);
        }
        if let Some(own) = self.cells.get_mut(self.index) {
            own.params = carried;
        }
    }

    // -------------------------------------------------------------------
    // Free-cell queue
    // -------------------------------------------------------------------

    /// Whether `index` is still unclaimed in the free-cell queue.
    pub fn is_free(&self, index: usize) -> bool {
        self.queue.contains(index)
    }

    /// Claim `index` from the free-cell queue. Returns `false` if another
    /// cell claimed it first this step.
    pub fn claim(&mut self, index: usize) -> bool {
        self.queue.remove(index)
    }

    /// Put `index` into the free-cell queue for later movers this step.
    pub fn release(&mut self, index: usize) -> bool {
        self.queue.push(index)
    }

    /// Claim a uniformly random free cell.
    pub fn claim_random(&mut self) -> Option<usize> {
        self.queue.take_random(self.rng)
    }

    /// Number of unclaimed free cells.
    pub fn free_count(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::mask::Neighbor;

    #[test]
    fn commit_reports_what_happened() {
        let mut cell = CellState::new(1);
        cell.next_state = Some(1);
        assert_eq!(cell.commit(), CommitOutcome::Unchanged);
        cell.next_state = Some(2);
        assert_eq!(cell.commit(), CommitOutcome::Changed);
        assert_eq!(cell.state, 2);
        assert_eq!(cell.next_state, None);
        assert_eq!(cell.commit(), CommitOutcome::Healed);
        assert_eq!(cell.state, 2);
    }

    #[test]
    fn increment_wraps_past_max() {
        let mut cell = CellState::new(0);
        cell.increment_state(2);
        assert_eq!(cell.state, 1);
        cell.increment_state(2);
        assert_eq!(cell.state, 2);
        cell.increment_state(2);
        assert_eq!(cell.state, 0);
    }

    #[test]
    fn context_writes_other_cells_and_swaps_params() {
        let mut cells = vec![CellState::new(2), CellState::new(0), CellState::new(1)];
        cells.get_mut(0).unwrap().params.set("energy", 5.0);
        cells.get_mut(1).unwrap().params.set("energy", 0.0);
        let neighbors = Neighborhood::from_slots(vec![Neighbor::cell(1, 0), Neighbor::phantom(-1)]);
        let params = ParamMap::new();
        let mut queue = FreeCellQueue::new();
        queue.rebuild(3, [1]);
        let mut rng = SmallRng::seed_from_u64(1);

        let mut ctx = PlanContext::new(0, false, &mut cells, &neighbors, &params, &mut queue, &mut rng);
        assert_eq!(ctx.state(), 2);
        assert!(ctx.is_free(1));
        assert!(ctx.claim(1));
        assert!(!ctx.claim(1));
        ctx.swap_params_with(1);
        ctx.set_next_of(1, 2);
        ctx.set_next(0);
        ctx.set_next_of(9, 2);
        assert!(ctx.param("probCatch").is_err());
        assert_eq!(ctx.free_count(), 0);

        assert_eq!(cells.first().unwrap().params.get("energy").unwrap(), 0.0);
        assert_eq!(cells.get(1).unwrap().params.get("energy").unwrap(), 5.0);
        assert_eq!(cells.get(1).unwrap().next_state, Some(2));
        assert_eq!(cells.first().unwrap().next_state, Some(0));
    }
}
