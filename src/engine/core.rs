// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and produces an updated state plus a
//! list of commands for the async shell (`engine::runtime::Runtime`). It owns
//! the scheduler and the result aggregator, so every state transition of a
//! batch goes through this one value: exactly one writer, no locks.
//!
//! The core has no Tokio types and can be unit tested synchronously.

use crate::dag::{AggregateOutcome, ResultAggregator, Scheduler};
use crate::engine::RuntimeEvent;
use crate::engine::event_handlers::{CoreStep, handle_task_settled, start_batch};

#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    aggregator: ResultAggregator,
    started: bool,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            aggregator: ResultAggregator::new(),
            started: false,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Whether nothing is ready or running.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    /// Dispatch the initially ready tasks. Calling it again does nothing.
    pub fn start(&mut self) -> CoreStep {
        if self.started {
            return CoreStep {
                commands: Vec::new(),
                keep_running: !self.scheduler.is_finished(),
            };
        }
        self.started = true;
        start_batch(&mut self.scheduler)
    }

    /// Handle a single runtime event and return what the shell should do.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskSettled(settlement) => {
                let name = settlement.contract.name;
                handle_task_settled(
                    &mut self.scheduler,
                    &mut self.aggregator,
                    &name,
                    settlement.outcome,
                )
            }
        }
    }

    /// Produce the aggregate outcome of the batch.
    pub fn finish(self) -> AggregateOutcome {
        if self.scheduler.is_empty() {
            return AggregateOutcome::empty();
        }
        let blocked = self.scheduler.blocked();
        self.aggregator.finalize(blocked)
    }
}
