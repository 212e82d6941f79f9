//! Step callback that reports progress through `tracing`.

use lattice_core::{StepCallback, StepSummary};
use lattice_grid::Grid;
use tracing::{debug, info};

/// Logs every step at debug level and every `interval`-th step at info.
pub struct ProgressCallback {
    interval: u64,
}

impl ProgressCallback {
    /// Create a callback reporting at info level every `interval` steps.
    /// An interval of 0 disables info-level reports.
    pub const fn new(interval: u64) -> Self {
        Self { interval }
    }
}

impl StepCallback for ProgressCallback {
    fn on_step(&mut self, summary: &StepSummary, grid: &Grid) {
        debug!(
            generation = summary.generation,
            changed = summary.changed,
            resized = summary.resized,
            "Step committed"
        );
        if summary.healed > 0 {
            debug!(healed = summary.healed, "Cells held their state without a plan");
        }

        let due = summary
            .generation
            .checked_rem(self.interval)
            .is_some_and(|r| r == 0);
        if due {
            info!(
                generation = summary.generation,
                width = summary.width,
                height = summary.height,
                origin = ?grid.origin(),
                populations = ?summary.populations,
                "Progress"
            );
        }
    }
}
