//! Grid container, topologies, and two-phase stepping for the Lattice engine.
//!
//! A [`Grid`] holds a flat array of [`CellState`] values governed by one
//! [`CellRule`]. Each [`Grid::step`] pads the grid under an infinite edge,
//! rebuilds the [`FreeCellQueue`], plans every cell against the previous
//! generation through a [`PlanContext`], then commits all planned states at
//! once.
//!
//! Neighbor enumeration is supplied by the [`RectGrid`], [`HexGrid`] and
//! [`TriGrid`] offset tables; a [`NeighborMask`] can hide part of the
//! enumerated ring behind phantom states.

pub mod cell;
pub mod error;
pub mod grid;
pub mod mask;
pub mod queue;
pub mod topology;

pub use cell::{CellRule, CellState, CommitOutcome, PlanContext};
pub use error::{GridError, RuleError};
pub use grid::{BuiltGrid, Grid, GridBuilder, RejectedCell, StepOutcome};
pub use mask::{Neighbor, NeighborMask, Neighborhood};
pub use queue::FreeCellQueue;
pub use topology::{HexGrid, NeighborTable, Parity, RectGrid, TriGrid, table_for};
