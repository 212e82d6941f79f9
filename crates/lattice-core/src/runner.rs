//! Bounded step loop.
//!
//! [`run_simulation`] drives [`Grid::step_detailed`] until one of:
//!
//! - **Step limit**: `max_steps` steps have completed
//! - **Static grid**: with `stop_when_static`, a step neither changed a
//!   cell nor resized the grid
//!
//! After every step a [`StepCallback`] receives a [`StepSummary`] and the
//! grid, which is where renderers and recorders hook in.

use chrono::{DateTime, Utc};
use lattice_grid::{Grid, GridError};
use lattice_types::RunId;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RunConfig;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A step failed. The grid holds the last committed generation.
    #[error("step error: {source}")]
    Step {
        /// The underlying grid error.
        #[from]
        source: GridError,
    },
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Reached the configured `max_steps` limit.
    MaxStepsReached,
    /// A step changed nothing and `stop_when_static` is set.
    Static,
}

/// What one step did, as reported to callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSummary {
    /// Generation reached by this step.
    pub generation: u64,
    /// Whether the grid grew before planning.
    pub resized: bool,
    /// Columns after the step.
    pub width: usize,
    /// Rows after the step.
    pub height: usize,
    /// Count of cells in each state, indexed by state.
    pub populations: Vec<usize>,
    /// Cells whose state changed.
    pub changed: usize,
    /// Cells left without a planned next state that held their state.
    pub healed: usize,
}

impl StepSummary {
    /// Whether the step left the grid exactly as it was.
    pub const fn is_static(&self) -> bool {
        !self.resized && self.changed == 0
    }
}

/// Result of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Identifier shared by every log line of the run.
    pub run_id: RunId,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end.
    pub ended_at: DateTime<Utc>,
    /// The reason the run ended.
    pub end_reason: EndReason,
    /// Total number of steps executed.
    pub total_steps: u64,
    /// The last step summary, if any step completed.
    pub final_summary: Option<StepSummary>,
}

/// Callback invoked after each step completes.
pub trait StepCallback {
    /// Called after a step commits.
    fn on_step(&mut self, summary: &StepSummary, grid: &Grid);
}

/// A no-op step callback.
pub struct NoOpCallback;

impl StepCallback for NoOpCallback {
    fn on_step(&mut self, _summary: &StepSummary, _grid: &Grid) {}
}

/// Run `grid` until a termination condition in `bounds` is met.
///
/// # Errors
///
/// Returns [`RunnerError::Step`] if a step fails. Steps committed before
/// the failure stay applied.
pub fn run_simulation(
    grid: &mut Grid,
    bounds: &RunConfig,
    callback: &mut dyn StepCallback,
) -> Result<RunResult, RunnerError> {
    let run_id = RunId::new();
    let started_at = Utc::now();
    let mut final_summary: Option<StepSummary> = None;
    let mut total_steps: u64 = 0;

    info!(
        %run_id,
        name = %bounds.name,
        kind = %grid.kind(),
        max_steps = bounds.max_steps,
        stop_when_static = bounds.stop_when_static,
        "Simulation starting"
    );

    let end_reason = loop {
        if total_steps >= bounds.max_steps {
            info!(%run_id, total_steps, "Step limit reached");
            break EndReason::MaxStepsReached;
        }

        let outcome = grid.step_detailed()?;
        total_steps = total_steps.saturating_add(1);

        let summary = StepSummary {
            generation: grid.generation(),
            resized: outcome.resized,
            width: grid.width(),
            height: grid.height(),
            populations: grid.populations(),
            changed: outcome.changed,
            healed: outcome.healed,
        };
        callback.on_step(&summary, grid);

        let settled = bounds.stop_when_static && summary.is_static();
        final_summary = Some(summary);
        if settled {
            info!(%run_id, generation = grid.generation(), "Grid is static");
            break EndReason::Static;
        }
    };

    Ok(RunResult {
        run_id,
        started_at,
        ended_at: Utc::now(),
        end_reason,
        total_steps,
        final_summary,
    })
}

/// Log the end of a run.
pub fn log_run_end(result: &RunResult) {
    let elapsed_ms = result
        .ended_at
        .signed_duration_since(result.started_at)
        .num_milliseconds();
    info!(
        run_id = %result.run_id,
        reason = ?result.end_reason,
        total_steps = result.total_steps,
        elapsed_ms,
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            generation = summary.generation,
            width = summary.width,
            height = summary.height,
            populations = ?summary.populations,
            "Final step summary"
        );
    } else {
        warn!("Simulation ended with no steps executed");
    }
}
