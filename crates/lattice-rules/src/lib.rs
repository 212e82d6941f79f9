//! Transition rules for the Lattice engine.
//!
//! Each rule family implements [`lattice_grid::CellRule`]:
//!
//! - [`conway`] -- Conway's Game of Life ([`Conway`])
//! - [`fire`] -- probabilistic forest fire spread ([`Fire`])
//! - [`percolation`] -- flow from a sentinel edge ([`Percolation`])
//! - [`segregation`] -- Schelling migration through the free-cell queue ([`Segregation`])
//! - [`wator`] -- Wa-Tor predator/prey with moving agents ([`WaTor`])
//! - [`rps`] -- generalized rock-paper-scissors ([`Rps`], [`rps::rps`])
//! - [`rule_table`] -- rotation-invariant table automata and the Byl loop ([`RuleTableRule`])
//!
//! [`rule_for`] maps a [`lattice_types::CellKind`] to a boxed rule.

pub mod conway;
pub mod error;
pub mod fire;
pub mod percolation;
pub mod registry;
pub mod rps;
pub mod rule_table;
pub mod segregation;
pub mod wator;

#[cfg(test)]
mod test_support;

pub use conway::Conway;
pub use error::RuleTableError;
pub use fire::Fire;
pub use percolation::Percolation;
pub use registry::rule_for;
pub use rps::Rps;
pub use rule_table::{BYL_LOOP_TABLE, RuleTable, RuleTableRule};
pub use segregation::Segregation;
pub use wator::WaTor;

/// Round a numeric parameter to the nearest whole number, saturating at the
/// `i32` range.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn whole(value: f64) -> i32 {
    // `as` saturates and maps NaN to 0.
    value.round() as i32
}
