//! Error types for the `lattice-grid` crate.
//!
//! Grid construction and stepping return [`GridError`]; rule planning
//! returns [`RuleError`], which the grid wraps when it aborts a step.

use lattice_types::ParamError;

/// Errors raised by a rule while planning a cell's next state.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The rule asked for a parameter the configuration never set.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// The rule needs a neighbor slot the topology does not supply.
    #[error("rule needs neighbor slot {slot}, topology supplies {available}")]
    InvalidNeighborhood {
        /// The slot index the rule tried to read.
        slot: usize,
        /// Number of neighbor slots actually supplied.
        available: usize,
    },
}

/// Errors that can occur during grid construction and stepping.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The initial layout has no rows or no columns.
    #[error("grid must have at least one row and one column")]
    EmptyGrid,

    /// A row of the initial layout differs in length from the first row.
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRows {
        /// Index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },

    /// An explicitly configured mask does not match the topology.
    #[error("neighbor mask has {actual} slots, topology supplies {expected}")]
    MaskLength {
        /// Neighbor count of the topology.
        expected: usize,
        /// Length of the configured mask.
        actual: usize,
    },

    /// The declared valid-state set is empty or contains negative states.
    #[error("declared valid states must be non-empty and non-negative")]
    NoValidStates,

    /// A coordinate lies outside the grid.
    #[error("cell ({row}, {col}) is outside the grid")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// The cell storage no longer matches the recorded dimensions.
    ///
    /// Raised by padding; the grid cannot be grown safely and the run must
    /// stop.
    #[error("grid holds {cells} cells but is recorded as {width}x{height}")]
    InconsistentDimensions {
        /// Number of stored cells.
        cells: usize,
        /// Recorded width.
        width: usize,
        /// Recorded height.
        height: usize,
    },

    /// A cell parameter required at construction was missing.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// A rule failed while planning a cell.
    #[error("rule error at ({row}, {col}): {source}")]
    Rule {
        /// Row of the planning cell.
        row: usize,
        /// Column of the planning cell.
        col: usize,
        /// The underlying rule error.
        source: RuleError,
    },
}
