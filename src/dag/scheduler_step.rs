// src/dag/scheduler_step.rs

//! Result type for a single scheduler settlement.

use crate::engine::TaskName;

/// Structured result of handling one settlement.
///
/// Useful for tests that want to drive the scheduler by hand and assert on
/// what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// The settlement moved a running task to a terminal state. `false`
    /// for stray or duplicate settlements, which change nothing.
    pub accepted: bool,
    /// Tasks promoted from `Pending` to `Ready` by this settlement.
    pub newly_ready: Vec<TaskName>,
    /// Whether nothing is ready or running any more after this step.
    pub batch_finished: bool,
}
