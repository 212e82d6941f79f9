//! Neighbor views and neighbor masking.
//!
//! A planning cell never touches other cells' states directly. The grid
//! fills a [`Neighborhood`] with one [`Neighbor`] per topology slot, in the
//! topology's fixed clockwise order, and the cell reads that view.
//!
//! A [`NeighborMask`] lets a rule ask for a fixed-size neighbor array while
//! only treating part of it as real. Applying the mask replaces every
//! inactive slot with a phantom carrying the rule's phantom state and
//! remembers what it replaced; removing the mask puts the originals back.
//! Fire uses this to spread 4-connected on an 8-neighbor lattice, and the
//! triangular lattice uses it to pick 6 real neighbors out of 12 slots.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Neighbor
// ---------------------------------------------------------------------------

/// One neighbor slot as seen by a planning cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    /// Flat index of the real cell behind this slot, or `None` for a phantom.
    pub index: Option<usize>,
    /// The previous-generation state visible through this slot.
    pub state: i32,
}

impl Neighbor {
    /// A slot backed by the real cell at `index`.
    pub const fn cell(index: usize, state: i32) -> Self {
        Self {
            index: Some(index),
            state,
        }
    }

    /// A slot with no real cell behind it (fixed edge or masked out).
    pub const fn phantom(state: i32) -> Self {
        Self { index: None, state }
    }

    /// Whether a real cell backs this slot.
    pub const fn is_real(&self) -> bool {
        self.index.is_some()
    }
}

// ---------------------------------------------------------------------------
// Neighborhood
// ---------------------------------------------------------------------------

/// The ordered neighbor slots of one planning cell.
///
/// The buffer is reused across every cell of a step, so it is cleared and
/// refilled rather than reallocated.
#[derive(Debug, Clone, Default)]
pub struct Neighborhood {
    slots: Vec<Neighbor>,
    /// Slots replaced by the last mask application, with their originals.
    hidden: Vec<(usize, Neighbor)>,
}

impl Neighborhood {
    /// Create an empty neighborhood sized for `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            hidden: Vec::with_capacity(capacity),
        }
    }

    /// Build a neighborhood directly from slots.
    pub fn from_slots(slots: Vec<Neighbor>) -> Self {
        Self {
            slots,
            hidden: Vec::new(),
        }
    }

    /// Remove every slot and any pending mask record.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.hidden.clear();
    }

    /// Append the next slot in topology order.
    pub fn push(&mut self, neighbor: Neighbor) {
        self.slots.push(neighbor);
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slot at position `slot`, if any.
    pub fn get(&self, slot: usize) -> Option<Neighbor> {
        self.slots.get(slot).copied()
    }

    /// All slots in topology order.
    pub fn as_slice(&self) -> &[Neighbor] {
        &self.slots
    }

    /// Iterate over the slots in topology order.
    pub fn iter(&self) -> impl Iterator<Item = &Neighbor> {
        self.slots.iter()
    }

    /// Iterate over the visible states in topology order.
    pub fn states(&self) -> impl Iterator<Item = i32> + '_ {
        self.slots.iter().map(|n| n.state)
    }

    /// Rotate the slots by half a turn, so slot `i` becomes the former slot
    /// `i + len/2`.
    ///
    /// Used for triangles that point up, whose neighbor ring starts on the
    /// opposite side from triangles that point down.
    pub fn rotate_half(&mut self) {
        let half = self.slots.len() / 2;
        self.slots.rotate_left(half);
    }

    /// Number of slots currently replaced by a mask.
    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    fn hide(&mut self, slot: usize, phantom: i32) {
        if let Some(original) = self.slots.get_mut(slot) {
            self.hidden.push((slot, *original));
            *original = Neighbor::phantom(phantom);
        }
    }

    fn restore(&mut self) {
        for (slot, original) in self.hidden.drain(..) {
            if let Some(current) = self.slots.get_mut(slot) {
                *current = original;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// NeighborMask
// ---------------------------------------------------------------------------

/// Per-slot flags selecting which neighbor slots are real.
///
/// The flags are aligned with the topology's neighbor order. A mask whose
/// length differs from the neighborhood it is applied to is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborMask {
    active: Vec<bool>,
}

impl NeighborMask {
    /// Create a mask from per-slot active flags.
    pub const fn new(active: Vec<bool>) -> Self {
        Self { active }
    }

    /// Create a mask from numeric flags, where any non-zero value marks a
    /// real slot and zero marks a slot to replace.
    pub fn from_flags(flags: &[u8]) -> Self {
        Self {
            active: flags.iter().map(|f| *f != 0).collect(),
        }
    }

    /// Number of slots the mask covers.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether the mask covers no slots.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Whether slot `slot` is real under this mask.
    pub fn is_active(&self, slot: usize) -> bool {
        self.active.get(slot).copied().unwrap_or(false)
    }

    /// Number of real slots.
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }

    /// Replace every inactive slot of `neighbors` with a phantom carrying
    /// `phantom`, remembering the originals.
    ///
    /// Returns the number of slots replaced.
    pub fn apply(&self, neighbors: &mut Neighborhood, phantom: i32) -> usize {
        if self.active.len() != neighbors.len() {
            return 0;
        }
        for (slot, active) in self.active.iter().enumerate() {
            if !*active {
                neighbors.hide(slot, phantom);
            }
        }
        neighbors.hidden_count()
    }

    /// Put back every slot replaced by [`NeighborMask::apply`].
    pub fn remove(&self, neighbors: &mut Neighborhood) {
        neighbors.restore();
    }
}
