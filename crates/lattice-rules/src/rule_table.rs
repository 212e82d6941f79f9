//! Rotation-invariant rule-table automata.
//!
//! A table is a whitespace-separated list of rules. Each rule is a string
//! of decimal digits: the current state, a neighborhood pattern, and the
//! next state, so `"012345"` reads "a cell in state 0 whose pattern is
//! 1 2 3 4 becomes 5".
//!
//! Patterns are matched against every other neighbor slot, starting at
//! north, which on the square lattice is the von Neumann ring N, E, S, W.
//! Tables store one canonical orientation per rule; loading expands each
//! pattern into all of its cyclic rotations so a structure matches the same
//! way whichever direction it faces. A cell whose state and pattern match no
//! rule keeps its state.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use lattice_grid::{CellRule, Neighborhood, PlanContext, RuleError};
use lattice_types::{CellKind, EdgeMode, ParamMap};
use tracing::debug;

use crate::error::RuleTableError;

/// Byl's self-reproducing loop (six states, von Neumann neighborhood).
pub const BYL_LOOP_TABLE: &str = "\
    000000 000010 000031 000420 000110 000120 000311 000330 000320 000200 000242 000233 \
    004330 005120 001400 001120 001305 001310 001320 003020 003400 003420 003120 002040 \
    002050 002010 002020 002420 002500 002520 002200 002250 002220 040000 050000 050500 \
    010052 010022 010400 010100 020055 400233 405235 401233 442024 452020 415233 411233 \
    412024 412533 432024 421433 422313 501302 502230 540022 542002 512024 530025 520025 \
    520442 523242 522020 100000 100010 100033 100330 101233 103401 103244 111244 113244 \
    112404 133244 121351 123444 123543 122414 122434 300100 300300 300211 300233 304233 \
    301100 301211 303211 303233 302233 344233 343233 351202 353215 314233 311233 313251 \
    313211 312211 335223 333211 320533 324433 325415 321433 321511 321321 323411 200000 \
    200042 200032 200022 200442 200515 200112 200122 200342 200332 200242 200212 201502 \
    203202 202302 244022 245022 242042 242022 254202 255042 252025 210042 214022 215022 \
    212055 212022 230052 234022 235002 235022 232042 232022 220042 220020 220533 221552";

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// A parsed transition table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    /// `state -> pattern -> next state`, every rotation stored.
    transitions: BTreeMap<i32, BTreeMap<Vec<i32>, i32>>,
    /// Every state the table mentions.
    states: BTreeSet<i32>,
    /// Number of rules in the source text.
    rule_count: usize,
}

impl RuleTable {
    /// Parse a table from whitespace-separated rules.
    ///
    /// When two rules map the same state and rotated pattern, the later one
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTableError::Malformed`] naming the first rule that is
    /// shorter than three digits or contains a non-digit.
    pub fn parse(text: &str) -> Result<Self, RuleTableError> {
        let mut table = Self::default();
        for rule in text.split_whitespace() {
            let digits = parse_digits(rule)?;
            let [state, pattern @ .., next] = digits.as_slice() else {
                return Err(malformed(rule, "needs a state, a pattern and a next state"));
            };
            if pattern.is_empty() {
                return Err(malformed(rule, "needs a state, a pattern and a next state"));
            }

            table.states.extend(digits.iter().copied());
            let by_pattern = table.transitions.entry(*state).or_default();
            let mut rotation = pattern.to_vec();
            for _ in 0..pattern.len() {
                by_pattern.insert(rotation.clone(), *next);
                rotation.rotate_left(1);
            }
            table.rule_count = table.rule_count.saturating_add(1);
        }
        debug!(
            rules = table.rule_count,
            entries = table.len(),
            "Rule table loaded"
        );
        Ok(table)
    }

    /// The next state for a cell in `state` whose sampled neighbors are
    /// `signature`, if any rule matches.
    pub fn lookup(&self, state: i32, signature: &[i32]) -> Option<i32> {
        self.transitions.get(&state)?.get(signature).copied()
    }

    /// Number of stored `(state, pattern)` entries, rotations included.
    pub fn len(&self) -> usize {
        self.transitions.values().map(BTreeMap::len).sum()
    }

    /// Whether the table holds no rules.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Number of rules in the source text.
    pub const fn rule_count(&self) -> usize {
        self.rule_count
    }

    /// Every state mentioned by the table, ascending.
    pub fn states(&self) -> impl Iterator<Item = i32> + '_ {
        self.states.iter().copied()
    }
}

impl FromStr for RuleTable {
    type Err = RuleTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn malformed(rule: &str, reason: &'static str) -> RuleTableError {
    RuleTableError::Malformed {
        rule: rule.to_owned(),
        reason,
    }
}

fn parse_digits(rule: &str) -> Result<Vec<i32>, RuleTableError> {
    rule.chars()
        .map(|c| {
            c.to_digit(10)
                .and_then(|d| i32::try_from(d).ok())
                .ok_or_else(|| malformed(rule, "contains a non-digit"))
        })
        .collect()
}

/// The pattern a cell presents: every other neighbor slot, from slot 0.
pub fn signature(neighbors: &Neighborhood) -> Vec<i32> {
    neighbors.states().step_by(2).collect()
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A cell rule driven by a [`RuleTable`].
#[derive(Debug, Clone)]
pub struct RuleTableRule {
    kind: CellKind,
    table: RuleTable,
}

impl RuleTableRule {
    /// A generic rule-table automaton.
    pub const fn new(table: RuleTable) -> Self {
        Self {
            kind: CellKind::RuleTable,
            table,
        }
    }

    /// Byl's self-reproducing loop.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTableError`] if the built-in table fails to parse.
    pub fn byl_loop() -> Result<Self, RuleTableError> {
        Ok(Self {
            kind: CellKind::BylLoop,
            table: RuleTable::parse(BYL_LOOP_TABLE)?,
        })
    }

    /// The loaded table.
    pub const fn table(&self) -> &RuleTable {
        &self.table
    }
}

impl CellRule for RuleTableRule {
    fn kind(&self) -> CellKind {
        self.kind
    }

    fn plan(&self, ctx: &mut PlanContext<'_>) -> Result<(), RuleError> {
        let state = ctx.state();
        let next = self
            .table
            .lookup(state, &signature(ctx.neighbors()))
            .unwrap_or(state);
        ctx.set_next(next);
        Ok(())
    }

    fn default_edge(&self) -> EdgeMode {
        EdgeMode::Infinite
    }

    fn default_states(&self, _params: &ParamMap) -> Vec<i32> {
        let mut states: BTreeSet<i32> = self.table.states().collect();
        states.insert(0);
        states.into_iter().collect()
    }
}
