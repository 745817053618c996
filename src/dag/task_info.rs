// src/dag/task_info.rs

//! Per-contract task state for the scheduler.

use crate::engine::TaskName;

/// Lifecycle of a task within one batch.
///
/// Transitions only move forward:
/// `Pending -> Ready -> Running -> SettledOk | SettledError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting on at least one prerequisite.
    Pending,
    /// All prerequisites settled ok; not yet started.
    Ready,
    /// Handed to a task runner.
    Running,
    SettledOk,
    SettledError,
}

impl TaskState {
    /// Whether the task still keeps the batch alive.
    pub fn is_active(self) -> bool {
        matches!(self, TaskState::Ready | TaskState::Running)
    }
}

/// Scheduler-side record of one contract.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    /// Direct prerequisites (deduplicated, all known to the graph).
    pub deps: Vec<TaskName>,
    /// Prerequisites that have not settled ok yet.
    pub pending_count: usize,
    pub state: TaskState,
}

impl TaskInfo {
    pub fn new(name: TaskName, deps: Vec<TaskName>) -> Self {
        let pending_count = deps.len();
        let state = if pending_count == 0 {
            TaskState::Ready
        } else {
            TaskState::Pending
        };

        Self {
            name,
            deps,
            pending_count,
            state,
        }
    }
}
