//! Enumeration types for the Lattice engine.
//!
//! The set of rule families is closed: configuration names resolve to a
//! [`CellKind`] once at startup and every later dispatch is a `match` on
//! the variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cell kinds
// ---------------------------------------------------------------------------

/// The rule family every cell of a grid follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Conway's Game of Life (B3/S23).
    Conway,
    /// Forest fire spread with a catch probability.
    Fire,
    /// Flow through open cells from a sentinel edge.
    Percolation,
    /// Schelling residential segregation with migration to free cells.
    Segregation,
    /// Wa-Tor predator/prey on a toroidal ocean.
    #[serde(rename = "wator")]
    WaTor,
    /// Generalized rock-paper-scissors domination.
    Rps,
    /// Generic rotation-invariant automaton driven by a textual rule table.
    RuleTable,
    /// Byl's self-reproducing loop, a built-in rule table.
    BylLoop,
}

impl CellKind {
    /// Every registered kind, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Conway,
        Self::Fire,
        Self::Percolation,
        Self::Segregation,
        Self::WaTor,
        Self::Rps,
        Self::RuleTable,
        Self::BylLoop,
    ];

    /// Canonical configuration name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Conway => "conway",
            Self::Fire => "fire",
            Self::Percolation => "percolation",
            Self::Segregation => "segregation",
            Self::WaTor => "wator",
            Self::Rps => "rps",
            Self::RuleTable => "rule_table",
            Self::BylLoop => "byl_loop",
        }
    }

    /// Resolve a configuration name to a kind.
    ///
    /// Matching ignores ASCII case, `-`/`_` separators, and an optional
    /// trailing `cell` suffix, so `"WaTorCell"`, `"wa-tor"` and `"wator"`
    /// all resolve to [`CellKind::WaTor`].
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let stem = normalized.strip_suffix("cell").unwrap_or(&normalized);
        Self::ALL.into_iter().find(|kind| kind.name().replace('_', "") == stem)
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A name that does not match any registered value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: {name}")]
pub struct UnknownName {
    /// What kind of name was being resolved.
    pub what: &'static str,
    /// The name as given.
    pub name: String,
}

impl FromStr for CellKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownName {
            what: "cell type",
            name: s.to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// Lattice shape, which fixes the neighbor-offset table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Square cells, 8 neighbors clockwise from north.
    #[default]
    Rect,
    /// Hexagonal cells in even-q storage, 6 neighbors.
    Hex,
    /// Triangular cells, a 12-slot neighbor superset.
    Tri,
}

impl Topology {
    /// Number of neighbor slots a cell of this topology receives.
    pub const fn neighbor_count(self) -> usize {
        match self {
            Self::Rect => 8,
            Self::Hex => 6,
            Self::Tri => 12,
        }
    }
}

impl FromStr for Topology {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rect" | "rectangle" | "square" => Ok(Self::Rect),
            "hex" | "hexagon" => Ok(Self::Hex),
            "tri" | "triangle" => Ok(Self::Tri),
            _ => Err(UnknownName {
                what: "topology",
                name: s.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Edge handling
// ---------------------------------------------------------------------------

/// How neighbor lookups behave past the grid border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Lookups wrap modulo the grid width and height.
    Toroidal,
    /// Out-of-bounds neighbors are phantom cells carrying this state.
    Fixed(i32),
    /// The grid grows a ring of empty cells whenever a border cell is live.
    Infinite,
}

impl EdgeMode {
    /// Whether the grid may change size during a step.
    pub const fn grows(self) -> bool {
        matches!(self, Self::Infinite)
    }
}
