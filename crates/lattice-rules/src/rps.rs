//! Generalized rock-paper-scissors.
//!
//! States `1..=numStates` are species arranged on a ring; state 0 is empty
//! and loses to everyone. A cell looks for the species that beats it and is
//! most common among its neighbors, and adopts it once that count reaches
//! `rpsThreshold`, jittered uniformly by up to `randomThreshold` either way.
//! Empty cells adopt the best candidate regardless of the threshold.

use lattice_grid::{CellRule, PlanContext, RuleError};
use lattice_types::{CellKind, EdgeMode, ParamMap};
use rand::Rng;

use crate::whole;

/// Empty cell.
pub const EMPTY: i32 = 0;

/// Number of dominating neighbors needed to convert.
pub const RPS_THRESHOLD: &str = "rpsThreshold";
/// Maximum random shift applied to the threshold each step.
pub const RANDOM_THRESHOLD: &str = "randomThreshold";
/// Number of species on the ring.
pub const NUM_STATES: &str = "numStates";

/// Whether state `i` beats state `st` on a ring of `n` species.
///
/// Every species beats an empty cell and an empty cell beats nothing.
/// Otherwise the species are compared by ring position: within half the
/// ring the higher position wins, farther apart the lower one does.
pub fn rps(i: i32, st: i32, n: i32) -> bool {
    if st == EMPTY {
        return true;
    }
    if i == EMPTY {
        return false;
    }
    let own = st.saturating_sub(1);
    let other = i.saturating_sub(1);
    let half = u32::try_from(n / 2).unwrap_or(0);
    if own.abs_diff(other) <= half {
        other > own
    } else {
        other < own
    }
}

/// Rock-paper-scissors domination.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rps;

impl CellRule for Rps {
    fn kind(&self) -> CellKind {
        CellKind::Rps
    }

    fn plan(&self, ctx: &mut PlanContext<'_>) -> Result<(), RuleError> {
        let state = ctx.state();
        let species = whole(ctx.param(NUM_STATES)?);

        let highest = ctx.neighbors().states().fold(state, i32::max);
        let mut counts = vec![0_u32; usize::try_from(highest).map_or(0, |h| h.saturating_add(1))];
        for s in ctx.neighbors().states() {
            if let Some(count) = usize::try_from(s).ok().and_then(|s| counts.get_mut(s)) {
                *count = count.saturating_add(1);
            }
        }

        let mut best: Option<(i32, u32)> = None;
        for (candidate, count) in (0_i32..).zip(counts) {
            if candidate == EMPTY || count == 0 || !rps(candidate, state, species) {
                continue;
            }
            best = match best {
                Some((_, top)) if count > top => Some((candidate, count)),
                Some((_, top)) if count == top && ctx.rng().random_bool(0.5) => Some((candidate, count)),
                None => Some((candidate, count)),
                kept => kept,
            };
        }

        let jitter = (ctx.rng().random::<f64>() - 0.5) * 2.0 * ctx.param(RANDOM_THRESHOLD)?;
        let threshold = ctx.param(RPS_THRESHOLD)? + jitter;
        let next = match best {
            Some((winner, count)) if state == EMPTY || f64::from(count) >= threshold => winner,
            _ => state,
        };
        ctx.set_next(next);
        Ok(())
    }

    fn default_edge(&self) -> EdgeMode {
        EdgeMode::Fixed(EMPTY)
    }

    fn default_states(&self, params: &ParamMap) -> Vec<i32> {
        let species = params.get_opt(NUM_STATES).map_or(3, whole).max(0);
        (EMPTY..=species).collect()
    }

    fn param_names(&self) -> &'static [&'static str] {
        &[RPS_THRESHOLD, RANDOM_THRESHOLD]
    }

    fn default_params(&self) -> &'static [(&'static str, f64)] {
        &[(RPS_THRESHOLD, 3.0), (RANDOM_THRESHOLD, 0.0), (NUM_STATES, 3.0)]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lattice_types::Topology;

    use super::*;
    use crate::test_support::{build, params};

    #[test]
    fn three_species_cycle() {
        // 1 beats 3, 2 beats 1, 3 beats 2.
        assert!(rps(2, 1, 3));
        assert!(rps(3, 2, 3));
        assert!(rps(1, 3, 3));
        assert!(!rps(1, 2, 3));
        assert!(!rps(2, 3, 3));
        assert!(!rps(3, 1, 3));
    }

    #[test]
    fn dominance_is_antisymmetric() {
        for n in 2..8 {
            for i in 0..=n {
                for st in 0..=n {
                    if i != st {
                        assert_ne!(rps(i, st, n), rps(st, i, n), "i={i} st={st} n={n}");
                    }
                }
            }
        }
    }

    #[test]
    fn empty_always_loses() {
        for n in 1..6 {
            for s in 1..=n {
                assert!(rps(s, EMPTY, n));
                assert!(!rps(EMPTY, s, n));
            }
        }
    }

    #[test]
    fn converts_once_threshold_is_met() {
        let mut grid = build(
            Rps,
            Topology::Rect,
            ParamMap::new(),
            &[vec![2, 2, 2], vec![0, 1, 0], vec![0, 0, 0]],
        );
        assert_eq!(grid.populations().len(), 4);
        grid.step().unwrap();
        // Three 2s beat the 1 in the middle; empty cells next to any
        // species are taken over immediately.
        assert_eq!(grid.state(1, 1), Some(2));
        assert_eq!(grid.state(1, 0), Some(2));
        assert_eq!(grid.state(2, 1), Some(1));
    }

    #[test]
    fn below_threshold_holds() {
        let mut grid = build(
            Rps,
            Topology::Rect,
            params(&[(RPS_THRESHOLD, 4.0)]),
            &[vec![2, 2, 2], vec![1, 1, 1]],
        );
        grid.step().unwrap();
        assert_eq!(grid.state_rows(), vec![vec![2, 2, 2], vec![1, 1, 1]]);
    }
}
