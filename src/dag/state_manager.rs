// src/dag/state_manager.rs

//! State transitions for the task table.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dag::DagGraph;
use crate::dag::task_info::{TaskInfo, TaskState};
use crate::engine::TaskName;

/// Applies state transitions to the task table on behalf of the scheduler.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a DagGraph, tasks: &'a mut HashMap<TaskName, TaskInfo>) -> Self {
        Self { graph, tasks }
    }

    /// Decrement the pending count of every dependent of `settled` and
    /// promote the ones that reach zero to `Ready`.
    ///
    /// Must be called exactly once per successful settlement.
    pub fn release_dependents(&mut self, settled: &str) -> Vec<TaskName> {
        let mut promoted = Vec::new();

        for dependent in self.graph.dependents_of(settled) {
            let Some(info) = self.tasks.get_mut(dependent) else {
                warn!(contract = %dependent, "node in graph not present in task table");
                continue;
            };

            if info.state != TaskState::Pending {
                warn!(
                    contract = %info.name,
                    state = ?info.state,
                    "dependent is not pending while a prerequisite settled; ignoring"
                );
                continue;
            }

            info.pending_count = info.pending_count.saturating_sub(1);
            debug!(
                contract = %info.name,
                prerequisite = %settled,
                remaining = info.pending_count,
                "prerequisite settled ok"
            );

            if info.pending_count == 0 {
                info.state = TaskState::Ready;
                promoted.push(info.name.clone());
            }
        }

        promoted
    }

    /// Mark every `Ready` task as `Running` and return their names.
    pub fn take_ready(&mut self) -> Vec<TaskName> {
        let mut started: Vec<TaskName> = self
            .tasks
            .values_mut()
            .filter(|info| info.state == TaskState::Ready)
            .map(|info| {
                info.state = TaskState::Running;
                info.name.clone()
            })
            .collect();
        started.sort();
        started
    }

    /// No task is ready or running.
    pub fn is_finished(&self) -> bool {
        !self.tasks.values().any(|info| info.state.is_active())
    }
}

/// Read-only queries over the task table.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// Whether every prerequisite of `info` has settled ok.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep| {
            matches!(
                self.tasks.get(dep).map(|d| d.state),
                Some(TaskState::SettledOk)
            )
        })
    }

    /// Sorted names of tasks in the given state.
    pub fn names_in_state(&self, state: TaskState) -> Vec<TaskName> {
        let mut names: Vec<TaskName> = self
            .tasks
            .values()
            .filter(|info| info.state == state)
            .map(|info| info.name.clone())
            .collect();
        names.sort();
        names
    }
}
