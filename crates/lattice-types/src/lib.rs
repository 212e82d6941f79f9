//! Shared type definitions for the Lattice cellular automaton engine.
//!
//! This crate is the single source of truth for the vocabulary shared by
//! the grid container, the rule families, and the configuration layer.
//!
//! # Modules
//!
//! - [`enums`] -- Cell kinds, lattice topologies, and border handling modes
//! - [`ids`] -- Type-safe UUID wrapper identifying a simulation run
//! - [`params`] -- Case-insensitive named numeric parameters

pub mod enums;
pub mod ids;
pub mod params;

// Re-export all public types at crate root for convenience.
pub use enums::{CellKind, EdgeMode, Topology, UnknownName};
pub use ids::RunId;
pub use params::{ParamError, ParamMap};
