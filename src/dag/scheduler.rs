use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{TaskInfo, TaskState};
use crate::engine::{TaskName, TaskOutcome};
use crate::errors::Result;
use crate::types::{Contract, DependencyMap, DependencyPolicy};

/// Scheduler holds the immutable dependency graph plus the task state table
/// of one batch.
///
/// It is responsible for:
/// - handing out tasks whose prerequisites all settled ok
/// - recording settlements
/// - releasing dependents after a successful settlement
/// - leaving dependents of a failed task pending (blocked) without touching
///   any other task
///
/// It performs no IO and has no notion of time; the engine drives it.
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
}

impl Scheduler {
    pub fn new(graph: DagGraph) -> Self {
        let tasks = graph
            .contracts()
            .map(|name| {
                let deps = graph.dependencies_of(name).to_vec();
                (name.to_string(), TaskInfo::new(name.to_string(), deps))
            })
            .collect();

        Self { graph, tasks }
    }

    /// Validate the inputs and build a scheduler in one go.
    pub fn from_contracts(
        contracts: &[Contract],
        dependencies: &DependencyMap,
        policy: DependencyPolicy,
    ) -> Result<Self> {
        let graph = DagGraph::build(contracts, dependencies, policy)?;
        Ok(Self::new(graph))
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.tasks.get(task).map(|info| info.state)
    }

    /// Whether every prerequisite of `task` has settled ok.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        let mgr = ReadOnlyStateManager::new(&self.tasks);
        Some(mgr.deps_satisfied_for_info(info))
    }

    /// Move every ready task to `Running` and return the names to start.
    pub fn take_ready(&mut self) -> Vec<TaskName> {
        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
        let started = manager.take_ready();
        for name in &started {
            info!(contract = %name, "prerequisites satisfied; starting task");
        }
        started
    }

    /// Record the settlement of a running task.
    ///
    /// Settlements for unknown tasks, or for tasks that are not running,
    /// are ignored so a task can never settle twice.
    pub fn settle(&mut self, task: &str, outcome: &TaskOutcome) -> SchedulerStep {
        let mut newly_ready = Vec::new();
        let mut accepted = false;

        match self.tasks.get_mut(task) {
            Some(info) if info.state == TaskState::Running => match outcome {
                TaskOutcome::Success => {
                    accepted = true;
                    info.state = TaskState::SettledOk;
                    debug!(contract = %info.name, "task settled ok");
                    let mut manager = StateManager::new(&self.graph, &mut self.tasks);
                    newly_ready = manager.release_dependents(task);
                }
                TaskOutcome::Failed(err) => {
                    accepted = true;
                    info.state = TaskState::SettledError;
                    let blocked = self.graph.dependents_of(task).len();
                    warn!(
                        contract = %info.name,
                        error = %err,
                        blocked_dependents = blocked,
                        "task settled with error; dependents stay pending"
                    );
                }
            },
            Some(info) => {
                warn!(
                    contract = %info.name,
                    state = ?info.state,
                    "settlement for task that is not running; ignoring"
                );
            }
            None => {
                warn!(contract = %task, "settlement for unknown task; ignoring");
            }
        }

        SchedulerStep {
            accepted,
            newly_ready,
            batch_finished: self.is_finished(),
        }
    }

    /// No task is ready or running; nothing else can happen in this batch.
    pub fn is_finished(&self) -> bool {
        !self.tasks.values().any(|info| info.state.is_active())
    }

    /// Tasks that can never run because a prerequisite failed (or is
    /// itself blocked). Only meaningful once [`Self::is_finished`] holds.
    pub fn blocked(&self) -> Vec<TaskName> {
        ReadOnlyStateManager::new(&self.tasks).names_in_state(TaskState::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TaskError;

    fn scheduler(names: &[&str], deps: &[(&str, &[&str])]) -> Scheduler {
        let contracts: Vec<Contract> = names.iter().map(|n| Contract::new(*n)).collect();
        let map: DependencyMap = deps
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect();
        Scheduler::from_contracts(&contracts, &map, DependencyPolicy::Lenient).unwrap()
    }

    fn failed(name: &str) -> TaskOutcome {
        TaskOutcome::Failed(TaskError::Deploy {
            contract: name.to_string(),
            message: "boom".to_string(),
        })
    }

    #[test]
    fn fan_out_after_root_succeeds() {
        let mut s = scheduler(&["A", "B", "C"], &[("B", &["A"]), ("C", &["A"])]);

        assert_eq!(s.take_ready(), vec!["A".to_string()]);
        assert_eq!(s.state_of("B"), Some(TaskState::Pending));

        let step = s.settle("A", &TaskOutcome::Success);
        let mut ready = step.newly_ready.clone();
        ready.sort();
        assert_eq!(ready, vec!["B".to_string(), "C".to_string()]);
        assert!(!step.batch_finished);

        assert_eq!(s.take_ready(), vec!["B".to_string(), "C".to_string()]);
        assert!(!s.settle("B", &TaskOutcome::Success).batch_finished);
        assert!(s.settle("C", &TaskOutcome::Success).batch_finished);
        assert!(s.blocked().is_empty());
    }

    #[test]
    fn failed_root_blocks_dependents() {
        let mut s = scheduler(&["A", "B", "C"], &[("B", &["A"]), ("C", &["A"])]);
        s.take_ready();

        let step = s.settle("A", &failed("A"));
        assert!(step.accepted);
        assert!(step.newly_ready.is_empty());
        assert!(step.batch_finished);
        assert_eq!(s.blocked(), vec!["B".to_string(), "C".to_string()]);
        assert_eq!(s.state_of("A"), Some(TaskState::SettledError));
    }

    #[test]
    fn failure_does_not_stop_independent_branch() {
        let mut s = scheduler(&["A", "B", "X", "Y"], &[("B", &["A"]), ("Y", &["X"])]);
        assert_eq!(s.take_ready(), vec!["A".to_string(), "X".to_string()]);

        s.settle("A", &failed("A"));
        let step = s.settle("X", &TaskOutcome::Success);
        assert_eq!(step.newly_ready, vec!["Y".to_string()]);
        assert!(!step.batch_finished);

        s.take_ready();
        assert!(s.settle("Y", &TaskOutcome::Success).batch_finished);
        assert_eq!(s.blocked(), vec!["B".to_string()]);
    }

    #[test]
    fn diamond_waits_for_all_prerequisites() {
        let mut s = scheduler(
            &["A", "B", "C", "D"],
            &[("B", &["A"]), ("C", &["A"]), ("D", &["B", "C"])],
        );
        s.take_ready();
        s.settle("A", &TaskOutcome::Success);
        s.take_ready();

        let step = s.settle("B", &TaskOutcome::Success);
        assert!(step.newly_ready.is_empty());
        assert_eq!(s.deps_satisfied("D"), Some(false));

        let step = s.settle("C", &TaskOutcome::Success);
        assert_eq!(step.newly_ready, vec!["D".to_string()]);
        assert_eq!(s.deps_satisfied("D"), Some(true));
    }

    #[test]
    fn duplicate_settlement_is_ignored() {
        let mut s = scheduler(&["A", "B"], &[("B", &["A"])]);
        s.take_ready();
        s.settle("A", &TaskOutcome::Success);

        let again = s.settle("A", &TaskOutcome::Success);
        assert!(!again.accepted);
        assert!(again.newly_ready.is_empty());
        assert_eq!(s.state_of("A"), Some(TaskState::SettledOk));
        assert_eq!(s.state_of("B"), Some(TaskState::Ready));
    }

    #[test]
    fn settlement_before_start_is_ignored() {
        let mut s = scheduler(&["A"], &[]);
        assert!(!s.settle("A", &TaskOutcome::Success).accepted);
        assert_eq!(s.state_of("A"), Some(TaskState::Ready));
    }

    #[test]
    fn empty_scheduler_is_finished() {
        let s = scheduler(&[], &[]);
        assert!(s.is_empty());
        assert!(s.is_finished());
    }
}
