// src/engine/mod.rs

//! Orchestration engine for one deployment batch.
//!
//! The pure core state machine lives in [`core`]; the async shell that
//! spawns task runners and feeds their settlements back lives in
//! [`runtime`].

use crate::errors::TaskError;
use crate::exec::Settlement;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a single task for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(TaskError),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }

    pub fn error(&self) -> Option<&TaskError> {
        match self {
            TaskOutcome::Success => None,
            TaskOutcome::Failed(err) => Some(err),
        }
    }
}

/// Events flowing into the core from the task runners.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task runner settled.
    TaskSettled(Settlement),
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
