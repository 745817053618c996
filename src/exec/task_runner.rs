// src/exec/task_runner.rs

//! Resolve-or-deploy logic for a single contract.

use tracing::{error, info};

use crate::engine::TaskOutcome;
use crate::errors::{GAS_ALLOWANCE_ERROR_MESSAGE, TaskError};
use crate::exec::backend::{DeployRequest, DeploymentBackend};
use crate::exec::hooks::DeploymentHooks;
use crate::types::Contract;

/// Terminal result of one task: the contract as the runner left it plus the
/// outcome for the scheduler.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub contract: Contract,
    pub outcome: TaskOutcome,
}

impl Settlement {
    pub fn name(&self) -> &str {
        &self.contract.name
    }

    /// Settlement used when the runner itself died before settling.
    pub fn panicked(mut contract: Contract) -> Self {
        let err = TaskError::Panicked {
            contract: contract.name.clone(),
        };
        contract.error = Some("task runner panicked".to_string());
        Self {
            contract,
            outcome: TaskOutcome::Failed(err),
        }
    }
}

/// Run one contract through the resolve path (address handler set) or the
/// deploy path (otherwise).
///
/// Transport failures never escape: the raw transport message is stored on
/// the contract and the classified error is returned in the settlement. The
/// function settles exactly once by returning.
pub async fn run_unit(
    request: DeployRequest,
    backend: &dyn DeploymentBackend,
    hooks: &dyn DeploymentHooks,
) -> Settlement {
    if request.contract.resolves_address() {
        resolve(request, backend, hooks).await
    } else {
        deploy(request, backend, hooks).await
    }
}

async fn resolve(
    request: DeployRequest,
    backend: &dyn DeploymentBackend,
    hooks: &dyn DeploymentHooks,
) -> Settlement {
    let result = backend.resolve_address(&request).await;
    let mut contract = request.contract;

    match result {
        Ok(address) => {
            contract.address = Some(address.clone());
            contract.deployed_address = Some(address.clone());
            info!(
                contract = %contract.name,
                address = %address,
                "{} already deployed at {}",
                contract.name,
                address
            );
            hooks.contract_resolved(&contract);
            Settlement {
                contract,
                outcome: TaskOutcome::Success,
            }
        }
        Err(err) => {
            let message = format!("{err:#}");
            let err = TaskError::Resolve {
                contract: contract.name.clone(),
                message: message.clone(),
            };
            error!(contract = %contract.name, "{}", err);
            contract.error = Some(message);
            Settlement {
                contract,
                outcome: TaskOutcome::Failed(err),
            }
        }
    }
}

async fn deploy(
    request: DeployRequest,
    backend: &dyn DeploymentBackend,
    hooks: &dyn DeploymentHooks,
) -> Settlement {
    let result = backend.deploy(&request).await;
    let mut contract = request.contract;

    match result {
        Ok(address) => {
            if let Some(address) = address {
                contract.address = Some(address.clone());
                contract.deployed_address = Some(address);
            }
            info!(
                contract = %contract.name,
                address = ?contract.address,
                "contract deployed"
            );
            hooks.contract_deployed(&contract);
            Settlement {
                contract,
                outcome: TaskOutcome::Success,
            }
        }
        Err(err) => {
            let message = format!("{err:#}");
            let err = TaskError::from_deploy_failure(&contract.name, message.clone());
            if err.is_gas_allowance() {
                error!(
                    contract = %contract.name,
                    "[{}]: {}",
                    contract.name,
                    GAS_ALLOWANCE_ERROR_MESSAGE
                );
            } else {
                error!(contract = %contract.name, "{}", err);
            }
            contract.error = Some(message);
            Settlement {
                contract,
                outcome: TaskOutcome::Failed(err),
            }
        }
    }
}
