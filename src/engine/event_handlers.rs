// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use crate::dag::{ResultAggregator, Scheduler};
use crate::engine::{TaskName, TaskOutcome};

/// Command produced by the pure core, to be executed by the async shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start task runners for these contracts.
    DispatchTasks(Vec<TaskName>),
}

/// Decision returned by the core after handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the shell should keep waiting for settlements.
    pub keep_running: bool,
}

/// Start every task that is ready at the beginning of the batch.
pub fn start_batch(scheduler: &mut Scheduler) -> CoreStep {
    let mut commands = Vec::new();

    let ready = scheduler.take_ready();
    if !ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(ready));
    }

    CoreStep {
        commands,
        keep_running: !scheduler.is_finished(),
    }
}

/// Handle one task settlement: record it, release dependents, and start
/// whatever became ready.
pub fn handle_task_settled(
    scheduler: &mut Scheduler,
    aggregator: &mut ResultAggregator,
    task: &str,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    let step = scheduler.settle(task, &outcome);

    // Stray or duplicate settlements leave the aggregate untouched.
    if step.accepted {
        aggregator.record(task, outcome.error().cloned());
    }

    if !step.newly_ready.is_empty() {
        let ready = scheduler.take_ready();
        if !ready.is_empty() {
            commands.push(CoreCommand::DispatchTasks(ready));
        }
    }

    CoreStep {
        commands,
        keep_running: !scheduler.is_finished(),
    }
}
