//! Neighbor-offset tables for the three lattice shapes.
//!
//! Every table lists `(row delta, column delta)` pairs starting from the
//! cell's northmost neighbor and proceeding clockwise. Rules rely on this
//! order for mask alignment, rotation-invariant matching, and the fixed
//! slots Percolation and Fire read, so the tables must never be reordered.
//!
//! Hex and triangle tables depend on the parity of the cell's absolute
//! coordinates (its position counted from the grid's original top-left
//! corner), not its current storage index. The grid tracks how many rows
//! and columns growth has inserted above and to the left and passes the
//! corrected [`Parity`] in, so a cell keeps its orientation when the grid
//! is padded.

use std::fmt;

use lattice_types::Topology;

/// Offset table type: `(row delta, column delta)` per neighbor slot.
pub type Offsets = [(isize, isize)];

/// Parity of a cell's absolute coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Parity {
    /// Whether the absolute row is odd.
    pub row_odd: bool,
    /// Whether the absolute column is odd.
    pub col_odd: bool,
}

impl Parity {
    /// Parity of the cell stored at `(row, col)` in a grid that has had
    /// `origin_row` rows and `origin_col` columns inserted before it.
    pub const fn of(row: usize, col: usize, origin_row: usize, origin_col: usize) -> Self {
        Self {
            row_odd: (row % 2 == 1) != (origin_row % 2 == 1),
            col_odd: (col % 2 == 1) != (origin_col % 2 == 1),
        }
    }
}

/// A lattice shape's neighbor enumeration.
pub trait NeighborTable: fmt::Debug + Send + Sync {
    /// The topology this table implements.
    fn topology(&self) -> Topology;

    /// Offsets for a cell of the given parity, in clockwise order from north.
    fn offsets(&self, parity: Parity) -> &'static Offsets;

    /// Number of slots every offset list has.
    fn neighbor_count(&self) -> usize {
        self.topology().neighbor_count()
    }

    /// Whether a cell of the given parity is a triangle pointing up.
    ///
    /// Always `false` outside the triangular lattice.
    fn points_up(&self, _parity: Parity) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Rectangular
// ---------------------------------------------------------------------------

const RECT: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Square lattice: the 8 surrounding cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectGrid;

impl NeighborTable for RectGrid {
    fn topology(&self) -> Topology {
        Topology::Rect
    }

    fn offsets(&self, _parity: Parity) -> &'static Offsets {
        &RECT
    }
}

// ---------------------------------------------------------------------------
// Hexagonal
// ---------------------------------------------------------------------------

/// Even columns sit half a cell lower than odd columns.
const HEX_EVEN_COL: [(isize, isize); 6] = [(-1, 0), (0, 1), (1, 1), (1, 0), (1, -1), (0, -1)];
const HEX_ODD_COL: [(isize, isize); 6] = [(-1, 0), (-1, 1), (0, 1), (1, 0), (0, -1), (-1, -1)];

/// Hex lattice in even-q storage: 6 neighbors, table chosen by column parity.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexGrid;

impl NeighborTable for HexGrid {
    fn topology(&self) -> Topology {
        Topology::Hex
    }

    fn offsets(&self, parity: Parity) -> &'static Offsets {
        if parity.col_odd {
            &HEX_ODD_COL
        } else {
            &HEX_EVEN_COL
        }
    }
}

// ---------------------------------------------------------------------------
// Triangular
// ---------------------------------------------------------------------------

const TRI_UP: [(isize, isize); 12] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (0, 2),
    (1, 2),
    (1, 1),
    (1, 0),
    (1, -1),
    (1, -2),
    (0, -2),
    (0, -1),
    (-1, -1),
];

const TRI_DOWN: [(isize, isize); 12] = [
    (-1, 0),
    (-1, 1),
    (-1, 2),
    (0, 2),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (0, -2),
    (-1, -2),
    (-1, -1),
];

/// Triangular lattice: a 12-slot superset of every cell sharing a vertex.
///
/// The top-left cell points up; a cell points up when its absolute
/// `row + col` is even. Rules that want only the edge-sharing neighbors
/// select them with a mask.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriGrid;

impl NeighborTable for TriGrid {
    fn topology(&self) -> Topology {
        Topology::Tri
    }

    fn offsets(&self, parity: Parity) -> &'static Offsets {
        if self.points_up(parity) {
            &TRI_UP
        } else {
            &TRI_DOWN
        }
    }

    fn points_up(&self, parity: Parity) -> bool {
        parity.row_odd == parity.col_odd
    }
}

/// The neighbor table for `topology`.
pub fn table_for(topology: Topology) -> &'static dyn NeighborTable {
    match topology {
        Topology::Rect => &RectGrid,
        Topology::Hex => &HexGrid,
        Topology::Tri => &TriGrid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_matches_its_neighbor_count() {
        for topology in [Topology::Rect, Topology::Hex, Topology::Tri] {
            let table = table_for(topology);
            for (row_odd, col_odd) in [(false, false), (false, true), (true, false), (true, true)] {
                let parity = Parity { row_odd, col_odd };
                assert_eq!(table.offsets(parity).len(), topology.neighbor_count());
            }
        }
    }

    #[test]
    fn tables_start_north_and_never_include_self() {
        for topology in [Topology::Rect, Topology::Hex, Topology::Tri] {
            let table = table_for(topology);
            for col_odd in [false, true] {
                let offsets = table.offsets(Parity {
                    row_odd: false,
                    col_odd,
                });
                assert_eq!(offsets.first(), Some(&(-1, 0)));
                assert!(!offsets.contains(&(0, 0)));
            }
        }
    }

    #[test]
    fn hex_columns_alternate() {
        let even = HexGrid.offsets(Parity::of(4, 2, 0, 0));
        let odd = HexGrid.offsets(Parity::of(4, 3, 0, 0));
        assert!(even.contains(&(1, 1)));
        assert!(odd.contains(&(-1, 1)));
    }

    #[test]
    fn padding_origin_preserves_orientation() {
        // A cell at (0, 0) that had one row inserted above it now sits at (1, 0).
        let before = Parity::of(0, 0, 0, 0);
        let after = Parity::of(1, 0, 1, 0);
        assert_eq!(before, after);
        assert!(TriGrid.points_up(before));
        assert!(!TriGrid.points_up(Parity::of(0, 1, 0, 0)));
        assert!(!RectGrid.points_up(before));
    }
}
