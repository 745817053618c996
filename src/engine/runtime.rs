// src/engine/runtime.rs

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::dag::AggregateOutcome;
use crate::exec::{DeployRequest, DeploymentBackend, DeploymentHooks, Settlement, run_unit};
use crate::types::Contract;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent, TaskName};

/// Drives the core in response to task settlements and runs the task
/// runners on Tokio.
///
/// Every running task lives in a `JoinSet`; settlements are pulled out one
/// at a time and fed into the `CoreRuntime`, so scheduler bookkeeping never
/// runs concurrently with itself.
pub struct Runtime {
    core: CoreRuntime,
    contracts: HashMap<TaskName, Contract>,
    backend: Arc<dyn DeploymentBackend>,
    hooks: Arc<dyn DeploymentHooks>,
    in_flight: JoinSet<Settlement>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        core: CoreRuntime,
        contracts: Vec<Contract>,
        backend: Arc<dyn DeploymentBackend>,
        hooks: Arc<dyn DeploymentHooks>,
    ) -> Self {
        let contracts = contracts
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        Self {
            core,
            contracts,
            backend,
            hooks,
            in_flight: JoinSet::new(),
        }
    }

    /// Run the batch to completion.
    ///
    /// Returns the aggregate outcome and every contract as its task left it.
    pub async fn run(mut self) -> (AggregateOutcome, HashMap<TaskName, Contract>) {
        let step = self.core.start();
        for command in step.commands {
            self.execute_command(command);
        }

        while let Some(joined) = self.in_flight.join_next().await {
            let settlement = match joined {
                Ok(settlement) => settlement,
                Err(err) => {
                    // The wrapper task cannot panic; this only happens if the
                    // set is aborted from outside.
                    error!(error = %err, "task wrapper failed to join");
                    continue;
                }
            };

            debug!(contract = %settlement.name(), outcome = ?settlement.outcome, "task settled");

            if let Some(contract) = self.contracts.get_mut(&settlement.contract.name) {
                contract.absorb_settlement(&settlement.contract);
            }

            let step = self.core.step(RuntimeEvent::TaskSettled(settlement));
            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                break;
            }
        }

        if !self.core.is_finished() {
            error!("runtime ran out of settlements before the batch finished");
        }

        info!("deployment runtime exiting");
        (self.core.finish(), self.contracts)
    }

    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::DispatchTasks(names) => {
                debug!(?names, "dispatching ready tasks");
                for name in names {
                    self.spawn_task(&name);
                }
            }
        }
    }

    fn spawn_task(&mut self, name: &str) {
        let Some(contract) = self.contracts.get(name).cloned() else {
            error!(contract = %name, "scheduled task has no contract; skipping");
            return;
        };

        let request = DeployRequest {
            dependency_addresses: self.dependency_addresses(name),
            contract: contract.clone(),
        };
        let backend = Arc::clone(&self.backend);
        let hooks = Arc::clone(&self.hooks);

        self.in_flight.spawn(async move {
            let runner = tokio::spawn(async move {
                run_unit(request, backend.as_ref(), hooks.as_ref()).await
            });
            match runner.await {
                Ok(settlement) => settlement,
                Err(err) => {
                    error!(contract = %contract.name, error = %err, "task runner panicked");
                    Settlement::panicked(contract)
                }
            }
        });
    }

    fn dependency_addresses(&self, name: &str) -> BTreeMap<String, String> {
        self.core
            .scheduler()
            .graph()
            .dependencies_of(name)
            .iter()
            .filter_map(|dep| {
                let address = self.contracts.get(dep)?.address.clone()?;
                Some((dep.clone(), address))
            })
            .collect()
    }
}
