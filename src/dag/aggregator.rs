// src/dag/aggregator.rs

//! Accumulation of task settlements into one batch outcome.

use crate::engine::TaskName;
use crate::errors::{DeployError, Result, TaskError};

/// Collects per-task results without ever stopping the batch.
///
/// Errors are kept in settlement order. That order depends on timing, so it
/// carries no meaning beyond "which errors happened".
#[derive(Debug, Default)]
pub struct ResultAggregator {
    errors: Vec<TaskError>,
    succeeded: Vec<TaskName>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, task: &str, result: Option<TaskError>) {
        match result {
            Some(err) => self.errors.push(err),
            None => self.succeeded.push(task.to_string()),
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Produce the final outcome. `blocked` lists tasks that never ran.
    pub fn finalize(self, blocked: Vec<TaskName>) -> AggregateOutcome {
        AggregateOutcome {
            errors: self.errors,
            succeeded: self.succeeded,
            blocked,
            empty_batch: false,
        }
    }
}

/// Final report of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOutcome {
    /// Every task error, in settlement order.
    pub errors: Vec<TaskError>,
    /// Tasks that settled ok, in settlement order.
    pub succeeded: Vec<TaskName>,
    /// Tasks left pending because a prerequisite failed.
    pub blocked: Vec<TaskName>,
    /// The batch had no contracts at all.
    pub empty_batch: bool,
}

impl AggregateOutcome {
    pub fn empty() -> Self {
        Self {
            empty_batch: true,
            ..Self::default()
        }
    }

    pub fn batch_failed(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Turn a failed batch into [`DeployError::BatchFailed`].
    pub fn into_result(self) -> Result<Self> {
        if self.batch_failed() {
            Err(DeployError::BatchFailed {
                failed: self.errors.len(),
            })
        } else {
            Ok(self)
        }
    }
}
