//! Progress notification port
//!
//! Defines the interface for reporting progress while a combine request runs.

use combiner_domain::{CombineMode, Model, Phase};

/// Callback for progress updates during a combine run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console spinners, server logs, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called once the mode for the request is known
    fn on_run_start(&self, _mode: CombineMode, _targets: &[Model]) {}

    /// Called when a phase starts
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize);

    /// Called when one model call completes within a phase
    fn on_task_complete(&self, phase: &Phase, model: &Model, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: &Phase);

    /// Called when a layered run starts another refinement round
    fn on_layer_start(&self, _round: usize, _total_rounds: usize) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: &Phase, _total_tasks: usize) {}
    fn on_task_complete(&self, _phase: &Phase, _model: &Model, _success: bool) {}
    fn on_phase_complete(&self, _phase: &Phase) {}
}
