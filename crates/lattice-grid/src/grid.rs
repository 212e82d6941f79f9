//! The grid container and its two-phase step.
//!
//! Each call to [`Grid::step`] runs four phases:
//!
//! 1. **Pad** -- under an infinite edge, insert one ring of empty cells on
//!    every side whose border row or column holds a non-empty cell.
//! 2. **Queue** -- rebuild and shuffle the free-cell queue from every cell
//!    the rule declares eligible.
//! 3. **Plan** -- visit every cell in row-major order, fill its
//!    neighborhood from the previous generation, apply the point-up
//!    rotation and mask, and let the rule plan its next state.
//! 4. **Commit** -- move every planned state into place. Cells nobody
//!    planned keep their previous state and are reported as healed.
//!
//! Cells are stored in one flat row-major `Vec`, so movers and their
//! targets are plain indices and never alias.

use std::collections::BTreeSet;
use std::fmt;

use lattice_types::{CellKind, EdgeMode, ParamError, ParamMap, Topology};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cell::{CellRule, CellState, CommitOutcome, PlanContext};
use crate::error::GridError;
use crate::mask::{Neighbor, NeighborMask, Neighborhood};
use crate::queue::FreeCellQueue;
use crate::topology::{NeighborTable, Offsets, Parity, table_for};

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// An initial state that was not in the declared valid-state set.
///
/// The cell was created in the grid's default state instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedCell {
    /// Row of the rejected cell.
    pub row: usize,
    /// Column of the rejected cell.
    pub col: usize,
    /// The state that was asked for.
    pub state: i32,
}

impl fmt::Display for RejectedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state {} at ({}, {}) is not a valid state",
            self.state, self.row, self.col
        )
    }
}

/// A freshly built grid plus any initial states it had to reject.
#[derive(Debug)]
pub struct BuiltGrid {
    /// The constructed grid.
    pub grid: Grid,
    /// Cells whose initial state was replaced by the default state.
    pub rejected: Vec<RejectedCell>,
}

/// Builder for a [`Grid`].
///
/// Everything except the rule and the initial layout is optional and falls
/// back to the rule's defaults.
#[derive(Debug)]
pub struct GridBuilder {
    rule: Box<dyn CellRule>,
    topology: Topology,
    edge: Option<EdgeMode>,
    mask: Option<NeighborMask>,
    states: Option<Vec<i32>>,
    params: ParamMap,
    seed: u64,
}

impl GridBuilder {
    /// Start a builder for a grid following `rule`.
    pub fn new(rule: Box<dyn CellRule>) -> Self {
        Self {
            rule,
            topology: Topology::default(),
            edge: None,
            mask: None,
            states: None,
            params: ParamMap::new(),
            seed: 0,
        }
    }

    /// Lattice shape.
    #[must_use]
    pub const fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Override the rule's default edge mode.
    #[must_use]
    pub const fn edge(mut self, edge: EdgeMode) -> Self {
        self.edge = Some(edge);
        self
    }

    /// Explicit neighbor mask. Must match the topology's neighbor count.
    #[must_use]
    pub fn mask(mut self, mask: NeighborMask) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Declared valid states.
    #[must_use]
    pub fn states(mut self, states: Vec<i32>) -> Self {
        self.states = Some(states);
        self
    }

    /// Simulation parameters. Unset parameters are filled from the rule's
    /// defaults.
    #[must_use]
    pub fn params(mut self, params: ParamMap) -> Self {
        self.params = params;
        self
    }

    /// Seed for the grid's random number generator.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the grid from a row-major initial layout.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EmptyGrid`] or [`GridError::RaggedRows`] for a
    /// malformed layout, [`GridError::MaskLength`] for an explicit mask that
    /// does not fit the topology, [`GridError::NoValidStates`] for an empty
    /// or negative state set, and [`GridError::Param`] if the rule needs a
    /// parameter to initialise its cells that is not set.
    pub fn build(self, rows: &[Vec<i32>]) -> Result<BuiltGrid, GridError> {
        let Self {
            rule,
            topology,
            edge,
            mask,
            states,
            mut params,
            seed,
        } = self;

        let width = rows.first().map_or(0, Vec::len);
        let height = rows.len();
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid);
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != width {
                return Err(GridError::RaggedRows {
                    row,
                    expected: width,
                    actual: cells.len(),
                });
            }
        }

        for (name, value) in rule.default_params() {
            params.set_default(name, *value);
        }

        let valid_states: BTreeSet<i32> = states
            .unwrap_or_else(|| rule.default_states(&params))
            .into_iter()
            .collect();
        if valid_states.is_empty() || valid_states.iter().any(|s| *s < 0) {
            return Err(GridError::NoValidStates);
        }

        let table = table_for(topology);
        let neighbor_count = table.neighbor_count();
        let mask = match mask {
            Some(explicit) if explicit.len() != neighbor_count => {
                return Err(GridError::MaskLength {
                    expected: neighbor_count,
                    actual: explicit.len(),
                });
            }
            Some(explicit) => Some(explicit),
            None => rule
                .default_mask(neighbor_count)
                .filter(|m| m.len() == neighbor_count),
        };

        let default_state = if valid_states.contains(&0) {
            0
        } else {
            valid_states.first().copied().unwrap_or(0)
        };

        let mut cells = Vec::with_capacity(width.saturating_mul(height));
        let mut rejected = Vec::new();
        for (row, states) in rows.iter().enumerate() {
            for (col, state) in states.iter().enumerate() {
                let state = if valid_states.contains(state) {
                    *state
                } else {
                    warn!(row, col, state, default_state, "Initial state rejected, using default");
                    rejected.push(RejectedCell {
                        row,
                        col,
                        state: *state,
                    });
                    default_state
                };
                let mut cell = CellState::new(state);
                rule.init_cell(&mut cell, &params)?;
                cells.push(cell);
            }
        }

        let edge = edge.unwrap_or_else(|| rule.default_edge());
        info!(
            kind = %rule.kind(),
            ?topology,
            ?edge,
            width,
            height,
            masked = mask.is_some(),
            rejected = rejected.len(),
            "Grid built"
        );

        let grid = Grid {
            rule,
            table,
            edge,
            mask,
            valid_states,
            default_state,
            width,
            height,
            origin_row: 0,
            origin_col: 0,
            cells,
            params,
            queue: FreeCellQueue::new(),
            neighborhood: Neighborhood::with_capacity(neighbor_count),
            rng: SmallRng::seed_from_u64(seed),
            generation: 0,
        };
        Ok(BuiltGrid { grid, rejected })
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// What one step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Whether padding grew the grid before planning.
    pub resized: bool,
    /// Number of cells whose state changed at commit.
    pub changed: usize,
    /// Number of cells that were never planned and kept their state.
    pub healed: usize,
}

/// A rectangular lattice of cells sharing one rule.
#[derive(Debug)]
pub struct Grid {
    rule: Box<dyn CellRule>,
    table: &'static dyn NeighborTable,
    edge: EdgeMode,
    mask: Option<NeighborMask>,
    valid_states: BTreeSet<i32>,
    default_state: i32,
    width: usize,
    height: usize,
    /// Rows inserted above the original top row by padding.
    origin_row: usize,
    /// Columns inserted left of the original left column by padding.
    origin_col: usize,
    cells: Vec<CellState>,
    params: ParamMap,
    queue: FreeCellQueue,
    /// Scratch buffer reused for every planning cell.
    neighborhood: Neighborhood,
    rng: SmallRng,
    generation: u64,
}

impl Grid {
    /// Advance one generation. Returns whether the grid was resized.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Rule`] if a rule fails while planning, or
    /// [`GridError::InconsistentDimensions`] if padding finds the storage
    /// out of step with the recorded size. On error the grid is restored to
    /// the previous generation: states, per-cell params and size.
    pub fn step(&mut self) -> Result<bool, GridError> {
        Ok(self.step_detailed()?.resized)
    }

    /// Advance one generation and report what changed.
    ///
    /// # Errors
    ///
    /// Same as [`Grid::step`].
    pub fn step_detailed(&mut self) -> Result<StepOutcome, GridError> {
        let checkpoint = self.checkpoint();
        let resized = match self.pad_and_plan() {
            Ok(resized) => resized,
            Err(err) => {
                self.restore(checkpoint);
                warn!(generation = self.generation, error = %err, "Step aborted, grid restored");
                return Err(err);
            }
        };

        let (changed, healed) = self.commit_all();
        self.generation = self.generation.saturating_add(1);

        debug!(
            generation = self.generation,
            width = self.width,
            height = self.height,
            resized,
            changed,
            healed,
            "Step complete"
        );
        Ok(StepOutcome {
            resized,
            changed,
            healed,
        })
    }

    /// Phases 1 to 3. Leaves planned next states in place for commit.
    fn pad_and_plan(&mut self) -> Result<bool, GridError> {
        let resized = if self.edge.grows() { self.pad()? } else { false };
        self.rebuild_queue();
        self.plan_all()?;
        Ok(resized)
    }

    /// Planning writes other cells' params as it goes (moves, timers,
    /// energy), so a failed step rolls back to a copy of the last
    /// committed generation.
    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            cells: self.cells.clone(),
            width: self.width,
            height: self.height,
            origin_row: self.origin_row,
            origin_col: self.origin_col,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        let Checkpoint {
            cells,
            width,
            height,
            origin_row,
            origin_col,
        } = checkpoint;
        self.cells = cells;
        self.width = width;
        self.height = height;
        self.origin_row = origin_row;
        self.origin_col = origin_col;
    }

    // -------------------------------------------------------------------
    // Phase 1: Pad
    // -------------------------------------------------------------------

    fn pad(&mut self) -> Result<bool, GridError> {
        self.check_dimensions()?;

        let top = self.row_live(0);
        let bottom = self.row_live(self.height.saturating_sub(1));
        let left = self.col_live(0);
        let right = self.col_live(self.width.saturating_sub(1));
        if !(top || bottom || left || right) {
            return Ok(false);
        }

        let new_width = self
            .width
            .saturating_add(usize::from(left))
            .saturating_add(usize::from(right));
        let new_height = self
            .height
            .saturating_add(usize::from(top))
            .saturating_add(usize::from(bottom));

        let blank = self.blank_cell()?;
        let mut old = std::mem::take(&mut self.cells).into_iter();
        let mut cells = Vec::with_capacity(new_width.saturating_mul(new_height));

        if top {
            cells.resize(new_width, blank.clone());
        }
        for _ in 0..self.height {
            if left {
                cells.push(blank.clone());
            }
            cells.extend(old.by_ref().take(self.width));
            if right {
                cells.push(blank.clone());
            }
        }
        if bottom {
            cells.resize(cells.len().saturating_add(new_width), blank);
        }

        if cells.len() != new_width.saturating_mul(new_height) {
            return Err(GridError::InconsistentDimensions {
                cells: cells.len(),
                width: new_width,
                height: new_height,
            });
        }

        self.cells = cells;
        self.width = new_width;
        self.height = new_height;
        self.origin_row = self.origin_row.saturating_add(usize::from(top));
        self.origin_col = self.origin_col.saturating_add(usize::from(left));

        info!(
            top,
            bottom,
            left,
            right,
            width = self.width,
            height = self.height,
            "Grid padded"
        );
        Ok(true)
    }

    fn check_dimensions(&self) -> Result<(), GridError> {
        let expected = self.width.checked_mul(self.height);
        if self.width == 0 || self.height == 0 || expected != Some(self.cells.len()) {
            return Err(GridError::InconsistentDimensions {
                cells: self.cells.len(),
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    fn row_live(&self, row: usize) -> bool {
        (0..self.width).any(|col| self.state(row, col).is_some_and(|s| s != 0))
    }

    fn col_live(&self, col: usize) -> bool {
        (0..self.height).any(|row| self.state(row, col).is_some_and(|s| s != 0))
    }

    /// An empty cell initialised by the rule.
    fn blank_cell(&self) -> Result<CellState, GridError> {
        let mut cell = CellState::new(0);
        self.rule.init_cell(&mut cell, &self.params)?;
        Ok(cell)
    }

    // -------------------------------------------------------------------
    // Phase 2: Queue
    // -------------------------------------------------------------------

    fn rebuild_queue(&mut self) {
        let rule = &self.rule;
        let free = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| rule.joins_free_queue(cell.state))
            .map(|(index, _)| index);
        self.queue.rebuild(self.cells.len(), free);
        self.queue.shuffle(&mut self.rng);
    }

    // -------------------------------------------------------------------
    // Phase 3: Plan
    // -------------------------------------------------------------------

    fn plan_all(&mut self) -> Result<(), GridError> {
        let Self {
            rule,
            table,
            edge,
            mask,
            width,
            height,
            origin_row,
            origin_col,
            cells,
            params,
            queue,
            neighborhood,
            rng,
            ..
        } = self;
        let (width, height) = (*width, *height);
        let phantom = rule.phantom_state();
        let rotates = rule.rotates_when_pointing_up();

        let lookup = Lookup {
            width,
            height,
            edge: *edge,
        };

        let coords = (0..height).flat_map(|row| (0..width).map(move |col| (row, col)));
        for (index, (row, col)) in coords.enumerate() {
            let parity = Parity::of(row, col, *origin_row, *origin_col);
            lookup.fill(neighborhood, cells, table.offsets(parity), row, col);

            let points_up = table.points_up(parity);
            if points_up && rotates {
                neighborhood.rotate_half();
            }
            if let Some(mask) = mask.as_ref() {
                mask.apply(neighborhood, phantom);
            }

            let result = {
                let mut ctx = PlanContext::new(index, points_up, cells, neighborhood, params, queue, rng);
                rule.plan(&mut ctx)
            };

            if let Some(mask) = mask.as_ref() {
                mask.remove(neighborhood);
            }
            result.map_err(|source| GridError::Rule { row, col, source })?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Phase 4: Commit
    // -------------------------------------------------------------------

    fn commit_all(&mut self) -> (usize, usize) {
        let mut changed: usize = 0;
        let mut healed: usize = 0;
        let width = self.width;
        for (index, cell) in self.cells.iter_mut().enumerate() {
            match cell.commit() {
                CommitOutcome::Unchanged => {}
                CommitOutcome::Changed => changed = changed.saturating_add(1),
                CommitOutcome::Healed => {
                    healed = healed.saturating_add(1);
                    warn!(
                        row = index.checked_div(width).unwrap_or(0),
                        col = index.checked_rem(width).unwrap_or(0),
                        state = cell.state,
                        "Cell had no planned next state, holding previous state"
                    );
                }
            }
        }
        (changed, healed)
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Current width in cells.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Current height in cells.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of completed steps.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Rows and columns padding has inserted above and to the left of the
    /// original layout.
    pub const fn origin(&self) -> (usize, usize) {
        (self.origin_row, self.origin_col)
    }

    /// The rule family.
    pub fn kind(&self) -> CellKind {
        self.rule.kind()
    }

    /// The lattice shape.
    pub fn topology(&self) -> Topology {
        self.table.topology()
    }

    /// The active edge mode.
    pub const fn edge(&self) -> EdgeMode {
        self.edge
    }

    /// The active neighbor mask, if any.
    pub const fn mask(&self) -> Option<&NeighborMask> {
        self.mask.as_ref()
    }

    /// The declared valid states, ascending.
    pub fn valid_states(&self) -> impl Iterator<Item = i32> + '_ {
        self.valid_states.iter().copied()
    }

    /// Highest declared valid state.
    pub fn max_state(&self) -> i32 {
        self.valid_states.last().copied().unwrap_or(0)
    }

    /// State used in place of rejected initial states.
    pub const fn default_state(&self) -> i32 {
        self.default_state
    }

    fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.height || col >= self.width {
            return None;
        }
        row.checked_mul(self.width)?.checked_add(col)
    }

    /// State of the cell at `(row, col)`.
    pub fn state(&self, row: usize, col: usize) -> Option<i32> {
        self.cell(row, col).map(|c| c.state)
    }

    /// The cell at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellState> {
        self.index_of(row, col).and_then(|i| self.cells.get(i))
    }

    /// Neighbors of `(row, col)` in the topology's clockwise slot order, as
    /// a rule would see them before rotation and masking.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] for a coordinate outside the grid.
    pub fn neighbors(&self, row: usize, col: usize) -> Result<Neighborhood, GridError> {
        if self.index_of(row, col).is_none() {
            return Err(GridError::OutOfBounds { row, col });
        }
        let lookup = Lookup {
            width: self.width,
            height: self.height,
            edge: self.edge,
        };
        let parity = Parity::of(row, col, self.origin_row, self.origin_col);
        let mut out = Neighborhood::with_capacity(self.table.neighbor_count());
        lookup.fill(&mut out, &self.cells, self.table.offsets(parity), row, col);
        Ok(out)
    }

    /// All states in row-major order.
    pub fn states(&self) -> impl Iterator<Item = i32> + '_ {
        self.cells.iter().map(|c| c.state)
    }

    /// All states as rows.
    pub fn state_rows(&self) -> Vec<Vec<i32>> {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|c| c.state).collect())
            .collect()
    }

    /// Count of cells in each state, indexed by state, sized to the highest
    /// declared valid state.
    ///
    /// States outside `0..=max_state` are not counted.
    pub fn populations(&self) -> Vec<usize> {
        let len = usize::try_from(self.max_state()).map_or(1, |m| m.saturating_add(1));
        let mut counts = vec![0_usize; len];
        for cell in &self.cells {
            if let Some(slot) = usize::try_from(cell.state).ok().and_then(|s| counts.get_mut(s)) {
                *slot = slot.saturating_add(1);
            }
        }
        counts
    }

    // -------------------------------------------------------------------
    // Mutation outside a step
    // -------------------------------------------------------------------

    /// Cycle the cell at `(row, col)` to its next declared state, wrapping
    /// past the highest one, and re-initialise its agent parameters.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] for a coordinate outside the grid
    /// or [`GridError::Param`] if the rule cannot initialise the cell.
    pub fn increment_cell_state(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        let max = self.max_state();
        let index = self
            .index_of(row, col)
            .ok_or(GridError::OutOfBounds { row, col })?;
        let Self {
            cells, rule, params, ..
        } = self;
        let cell = cells
            .get_mut(index)
            .ok_or(GridError::OutOfBounds { row, col })?;
        cell.increment_state(max);
        rule.init_cell(cell, params)?;
        Ok(())
    }

    /// Put the cell at `(row, col)` into `state` and re-initialise its agent
    /// parameters.
    ///
    /// # Errors
    ///
    /// Same as [`Grid::increment_cell_state`].
    pub fn set_state(&mut self, row: usize, col: usize, state: i32) -> Result<(), GridError> {
        let mut cell = CellState::new(state);
        self.rule.init_cell(&mut cell, &self.params)?;
        *self.cell_mut(row, col)? = cell;
        Ok(())
    }

    fn cell_mut(&mut self, row: usize, col: usize) -> Result<&mut CellState, GridError> {
        self.index_of(row, col)
            .and_then(|i| self.cells.get_mut(i))
            .ok_or(GridError::OutOfBounds { row, col })
    }

    // -------------------------------------------------------------------
    // Parameters
    // -------------------------------------------------------------------

    /// Names of the rule's tunable parameters.
    pub fn param_names(&self) -> &'static [&'static str] {
        self.rule.param_names()
    }

    /// A simulation parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Unset`] if the parameter was never set.
    pub fn param(&self, name: &str) -> Result<f64, ParamError> {
        self.params.get(name)
    }

    /// Set a simulation parameter. Takes effect from the next step.
    pub fn set_param(&mut self, name: &str, value: f64) {
        self.params.set(name, value);
    }

    /// All simulation parameters.
    pub const fn params(&self) -> &ParamMap {
        &self.params
    }
}

/// The last committed generation, kept while a step is in flight.
#[derive(Debug)]
struct Checkpoint {
    cells: Vec<CellState>,
    width: usize,
    height: usize,
    origin_row: usize,
    origin_col: usize,
}

// ---------------------------------------------------------------------------
// Neighbor lookup
// ---------------------------------------------------------------------------

/// Resolves offsets to neighbor slots under one edge mode.
#[derive(Debug, Clone, Copy)]
struct Lookup {
    width: usize,
    height: usize,
    edge: EdgeMode,
}

impl Lookup {
    /// Refill `out` with the neighbors of `(row, col)` in offset order.
    fn fill(
        self,
        out: &mut Neighborhood,
        cells: &[CellState],
        offsets: &Offsets,
        row: usize,
        col: usize,
    ) {
        out.clear();
        for (dr, dc) in offsets {
            out.push(self.resolve(cells, row, col, *dr, *dc));
        }
    }

    fn resolve(self, cells: &[CellState], row: usize, col: usize, dr: isize, dc: isize) -> Neighbor {
        let wraps = matches!(self.edge, EdgeMode::Toroidal);
        let target = shift(row, dr, self.height, wraps)
            .zip(shift(col, dc, self.width, wraps))
            .and_then(|(r, c)| r.checked_mul(self.width)?.checked_add(c))
            .and_then(|index| cells.get(index).map(|cell| (index, cell.state)));
        match (target, self.edge) {
            (Some((index, state)), _) => Neighbor::cell(index, state),
            (None, EdgeMode::Fixed(sentinel)) => Neighbor::phantom(sentinel),
            (None, EdgeMode::Toroidal | EdgeMode::Infinite) => Neighbor::phantom(0),
        }
    }
}

/// Move `coord` by `delta` along an axis of length `len`, wrapping if asked.
fn shift(coord: usize, delta: isize, len: usize, wraps: bool) -> Option<usize> {
    if wraps {
        let len_signed = isize::try_from(len).ok()?;
        let forward = usize::try_from(delta.checked_rem_euclid(len_signed)?).ok()?;
        coord.checked_add(forward)?.checked_rem(len)
    } else {
        coord.checked_add_signed(delta).filter(|c| *c < len)
    }
}
