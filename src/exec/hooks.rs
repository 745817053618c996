// src/exec/hooks.rs

//! Batch lifecycle hooks and side-channel notifications.
//!
//! Every method has a no-op default, so implementors only override the
//! notifications they care about.

use std::future::Future;
use std::pin::Pin;

use anyhow::{Result, bail};
use tracing::{debug, error};

use crate::exec::command::run_shell;
use crate::types::Contract;

pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

pub trait DeploymentHooks: Send + Sync {
    /// Runs before any contract is scheduled. An error skips the batch.
    fn before_all(&self) -> HookFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    /// Runs after the batch, whether it failed or not.
    fn after_all(&self, _batch_failed: bool) -> HookFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    /// An already-deployed contract's address was resolved.
    fn contract_resolved(&self, _contract: &Contract) {}

    /// A contract was deployed.
    fn contract_deployed(&self, _contract: &Contract) {}

    /// The batch is over (emitted before `after_all`).
    fn contracts_deployed(&self) {}

    /// Batch-level error text meant for the user.
    fn output_error(&self, _message: &str) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl DeploymentHooks for NoopHooks {}

/// Shell commands run before and after the batch.
#[derive(Debug, Clone, Default)]
pub struct CommandHooks {
    pub before_all: Option<String>,
    pub after_all: Option<String>,
}

impl CommandHooks {
    pub fn new(before_all: Option<String>, after_all: Option<String>) -> Self {
        Self {
            before_all,
            after_all,
        }
    }
}

async fn run_hook(label: &str, cmd: &str, envs: &[(String, String)]) -> Result<()> {
    let output = run_shell(label, cmd, envs).await?;
    if !output.success {
        bail!("{label} hook failed: {}", output.failure_message());
    }
    Ok(())
}

impl DeploymentHooks for CommandHooks {
    fn before_all(&self) -> HookFuture<'_> {
        Box::pin(async move {
            match self.before_all.as_deref() {
                Some(cmd) => run_hook("before_all", cmd, &[]).await,
                None => Ok(()),
            }
        })
    }

    fn after_all(&self, batch_failed: bool) -> HookFuture<'_> {
        Box::pin(async move {
            match self.after_all.as_deref() {
                Some(cmd) => {
                    let envs = vec![(
                        "DEPLOYDAG_BATCH_FAILED".to_string(),
                        if batch_failed { "1" } else { "0" }.to_string(),
                    )];
                    run_hook("after_all", cmd, &envs).await
                }
                None => Ok(()),
            }
        })
    }

    fn contract_resolved(&self, contract: &Contract) {
        debug!(contract = %contract.name, address = ?contract.address, "contract resolved");
    }

    fn contract_deployed(&self, contract: &Contract) {
        debug!(contract = %contract.name, address = ?contract.address, "contract deployed");
    }

    fn output_error(&self, message: &str) {
        error!("{}", message);
    }
}
