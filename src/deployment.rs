// src/deployment.rs

//! Batch entry point.
//!
//! [`Deployment::deploy_contracts`] is the full lifecycle: input validation,
//! the before-all hook, scheduling of every contract, error output, the
//! "contracts deployed" notification and the after-all hook.
//! [`Deployment::deploy_all`] is the scheduling step on its own.

use std::sync::Arc;

use tracing::{error, info};

use crate::dag::{AggregateOutcome, Scheduler};
use crate::engine::{CoreRuntime, Runtime};
use crate::errors::{DeployError, Result};
use crate::exec::{DeploymentBackend, DeploymentHooks, NoopHooks};
use crate::types::{Contract, DependencyMap, DependencyPolicy};

/// Deploys batches of contracts through an injected transport and hooks.
#[derive(Clone)]
pub struct Deployment {
    backend: Arc<dyn DeploymentBackend>,
    hooks: Arc<dyn DeploymentHooks>,
    policy: DependencyPolicy,
}

impl std::fmt::Debug for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployment")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Deployment {
    pub fn new(backend: Arc<dyn DeploymentBackend>) -> Self {
        Self {
            backend,
            hooks: Arc::new(NoopHooks),
            policy: DependencyPolicy::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn DeploymentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_policy(mut self, policy: DependencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the whole batch lifecycle.
    ///
    /// Input errors (duplicate names, cycles, unknown prerequisites under
    /// the strict policy) are reported through `output_error` and returned
    /// before any hook or task runs. Otherwise returns the outcome; a failed
    /// task makes this return [`DeployError::BatchFailed`], after the
    /// after-all hook has run.
    pub async fn deploy_contracts(
        &self,
        contracts: &mut [Contract],
        dependencies: &DependencyMap,
    ) -> Result<AggregateOutcome> {
        let scheduler = match Scheduler::from_contracts(contracts, dependencies, self.policy) {
            Ok(scheduler) => scheduler,
            Err(err) => {
                let message = err.to_string();
                self.hooks.output_error(&message);
                error!("{}", message);
                return Err(err);
            }
        };

        info!("deploying contracts");

        let mut result = match self.hooks.before_all().await {
            Ok(()) => self.run_scheduled(scheduler, contracts).await.into_result(),
            Err(err) => Err(DeployError::Hook(format!("{err:#}"))),
        };

        if let Err(err) = &result {
            let message = err.to_string();
            self.hooks.output_error(&message);
            error!("{}", message);
        }

        self.hooks.contracts_deployed();

        if let Err(err) = self.hooks.after_all(result.is_err()).await {
            error!(error = %err, "after_all hook failed");
            if result.is_ok() {
                result = Err(DeployError::Hook(format!("{err:#}")));
            }
        }

        result
    }

    /// Schedule and run every contract, honouring `dependencies`.
    ///
    /// Input errors (duplicate names, cycles, unknown prerequisites under
    /// the strict policy) are returned before anything runs. Task failures
    /// do not produce an `Err`; they are in the returned outcome.
    pub async fn deploy_all(
        &self,
        contracts: &mut [Contract],
        dependencies: &DependencyMap,
    ) -> Result<AggregateOutcome> {
        let scheduler = Scheduler::from_contracts(contracts, dependencies, self.policy)?;
        Ok(self.run_scheduled(scheduler, contracts).await)
    }

    async fn run_scheduled(
        &self,
        scheduler: Scheduler,
        contracts: &mut [Contract],
    ) -> AggregateOutcome {
        if scheduler.is_empty() {
            info!("no contracts found");
            return AggregateOutcome::empty();
        }

        let runtime = Runtime::new(
            CoreRuntime::new(scheduler),
            contracts.to_vec(),
            Arc::clone(&self.backend),
            Arc::clone(&self.hooks),
        );
        let (outcome, settled) = runtime.run().await;

        for contract in contracts.iter_mut() {
            if let Some(after) = settled.get(&contract.name) {
                contract.absorb_settlement(after);
            }
        }

        if outcome.batch_failed() {
            error!(
                failed = outcome.errors.len(),
                blocked = ?outcome.blocked,
                "Error deploying contracts. Please fix errors to continue."
            );
        } else {
            info!(deployed = outcome.succeeded.len(), "finished deploying contracts");
        }

        outcome
    }
}
