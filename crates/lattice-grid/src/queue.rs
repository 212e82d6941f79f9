//! The free-cell queue shared by mobility rules during one planning pass.
//!
//! The grid rebuilds the queue once per step, before planning, from every
//! cell the rule declares eligible (empty cells for Segregation, every cell
//! for Wa-Tor). Cells then consume it destructively while planning, in the
//! grid's fixed enumeration order: whoever removes a cell first owns it for
//! this step, so two movers can never target the same destination.
//!
//! Membership is backed by a dense vector plus a position index, so
//! `contains`, `remove` and `take_random` are all O(1).

use rand::Rng;
use rand::seq::SliceRandom;

/// Set of cell indices available for relocation within a single step.
#[derive(Debug, Clone, Default)]
pub struct FreeCellQueue {
    /// Queued cell indices in arbitrary order.
    members: Vec<usize>,
    /// `positions[cell]` is the position of `cell` in `members`, if queued.
    positions: Vec<Option<usize>>,
}

impl FreeCellQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            members: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Replace the contents with `free`, for a grid of `cell_count` cells.
    ///
    /// Indices at or beyond `cell_count` are ignored.
    pub fn rebuild(&mut self, cell_count: usize, free: impl IntoIterator<Item = usize>) {
        self.members.clear();
        self.positions.clear();
        self.positions.resize(cell_count, None);
        for index in free {
            self.push(index);
        }
    }

    /// Whether `index` is still queued.
    pub fn contains(&self, index: usize) -> bool {
        matches!(self.positions.get(index), Some(Some(_)))
    }

    /// Queue `index`. Returns `false` if it was already queued or lies
    /// outside the grid.
    pub fn push(&mut self, index: usize) -> bool {
        let Some(slot) = self.positions.get_mut(index) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(self.members.len());
        self.members.push(index);
        true
    }

    /// Remove `index`, claiming it for the caller. Returns `false` if it was
    /// not queued (someone else claimed it first).
    pub fn remove(&mut self, index: usize) -> bool {
        let Some(position) = self.positions.get_mut(index).and_then(Option::take) else {
            return false;
        };
        self.members.swap_remove(position);
        if let Some(moved) = self.members.get(position).copied() {
            if let Some(slot) = self.positions.get_mut(moved) {
                *slot = Some(position);
            }
        }
        true
    }

    /// Remove and return a uniformly random queued cell.
    pub fn take_random(&mut self, rng: &mut impl Rng) -> Option<usize> {
        if self.members.is_empty() {
            return None;
        }
        let position = rng.random_range(0..self.members.len());
        let index = self.members.get(position).copied()?;
        self.remove(index);
        Some(index)
    }

    /// Shuffle the queue order.
    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.members.shuffle(rng);
        for (position, index) in self.members.iter().enumerate() {
            if let Some(slot) = self.positions.get_mut(*index) {
                *slot = Some(position);
            }
        }
    }

    /// Number of queued cells.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate over the queued cells in queue order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn rebuild_then_remove_claims_once() {
        let mut queue = FreeCellQueue::new();
        queue.rebuild(10, [1, 4, 7]);
        assert_eq!(queue.len(), 3);
        assert!(queue.remove(4));
        assert!(!queue.remove(4));
        assert!(!queue.contains(4));
        assert!(queue.contains(1));
        assert!(queue.contains(7));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn remove_keeps_positions_consistent() {
        let mut queue = FreeCellQueue::new();
        queue.rebuild(6, 0..6);
        assert!(queue.remove(0));
        assert!(queue.remove(5));
        assert!(queue.remove(2));
        let mut rest: Vec<usize> = queue.iter().collect();
        rest.sort_unstable();
        assert_eq!(rest, vec![1, 3, 4]);
        for index in [1, 3, 4] {
            assert!(queue.remove(index));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn push_rejects_duplicates_and_out_of_range() {
        let mut queue = FreeCellQueue::new();
        queue.rebuild(3, []);
        assert!(queue.push(2));
        assert!(!queue.push(2));
        assert!(!queue.push(3));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn take_random_drains_every_member_once() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut queue = FreeCellQueue::new();
        queue.rebuild(20, (0..20).step_by(2));
        queue.shuffle(&mut rng);
        let mut taken = Vec::new();
        while let Some(index) = queue.take_random(&mut rng) {
            taken.push(index);
        }
        taken.sort_unstable();
        assert_eq!(taken, (0..20).step_by(2).collect::<Vec<_>>());
        assert_eq!(queue.take_random(&mut rng), None);
    }
}
