use std::sync::Mutex;

use anyhow::anyhow;
use deploydag::exec::{DeploymentHooks, HookFuture};
use deploydag::types::Contract;

/// Everything a `RecordingHooks` saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    BeforeAll,
    AfterAll { batch_failed: bool },
    Resolved { name: String, address: Option<String> },
    Deployed { name: String, address: Option<String> },
    ContractsDeployed,
    OutputError(String),
}

/// Hooks that record every call; `before_all` / `after_all` can be made to
/// fail.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
    fail_before_all: bool,
    fail_after_all: bool,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_before_all(mut self) -> Self {
        self.fail_before_all = true;
        self
    }

    pub fn failing_after_all(mut self) -> Self {
        self.fail_after_all = true;
        self
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: HookEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl DeploymentHooks for RecordingHooks {
    fn before_all(&self) -> HookFuture<'_> {
        Box::pin(async move {
            self.push(HookEvent::BeforeAll);
            if self.fail_before_all {
                return Err(anyhow!("before_all refused"));
            }
            Ok(())
        })
    }

    fn after_all(&self, batch_failed: bool) -> HookFuture<'_> {
        Box::pin(async move {
            self.push(HookEvent::AfterAll { batch_failed });
            if self.fail_after_all {
                return Err(anyhow!("after_all refused"));
            }
            Ok(())
        })
    }

    fn contract_resolved(&self, contract: &Contract) {
        self.push(HookEvent::Resolved {
            name: contract.name.clone(),
            address: contract.address.clone(),
        });
    }

    fn contract_deployed(&self, contract: &Contract) {
        self.push(HookEvent::Deployed {
            name: contract.name.clone(),
            address: contract.address.clone(),
        });
    }

    fn contracts_deployed(&self) {
        self.push(HookEvent::ContractsDeployed);
    }

    fn output_error(&self, message: &str) {
        self.push(HookEvent::OutputError(message.to_string()));
    }
}
