// src/dag/mod.rs

//! Dependency graph and scheduling.
//!
//! - [`graph`] validates the contract list and dependency map.
//! - [`scheduler`] is the per-batch state machine that decides which
//!   contracts may start and which stay blocked.
//! - [`task_info`] holds the per-contract task state.
//! - [`scheduler_step`] is the result type of one settlement.
//! - [`state_manager`] applies state transitions to the task table.
//! - [`aggregator`] folds settlements into the batch outcome.

pub mod aggregator;
pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use aggregator::{AggregateOutcome, ResultAggregator};
pub use graph::DagGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{TaskInfo, TaskState};
