// src/exec/backend.rs

//! Pluggable deployment transport.
//!
//! The engine talks to a `DeploymentBackend` instead of any concrete chain
//! client. Production uses [`super::command::CommandBackend`]; tests can
//! provide their own implementation that scripts results without spawning
//! processes.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use crate::types::Contract;

/// Boxed future returned by backend requests.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Everything a transport needs to handle one contract.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub contract: Contract,
    /// Addresses of the contract's prerequisites that reported one,
    /// keyed by contract name.
    pub dependency_addresses: BTreeMap<String, String>,
}

impl DeployRequest {
    pub fn new(contract: Contract) -> Self {
        Self {
            contract,
            dependency_addresses: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.contract.name
    }
}

/// Request/response access to the chain for a single contract.
pub trait DeploymentBackend: Send + Sync {
    /// Look up the address of an already-deployed contract.
    fn resolve_address<'a>(&'a self, request: &'a DeployRequest) -> BackendFuture<'a, String>;

    /// Deploy the contract. The transport may report the new address.
    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> BackendFuture<'a, Option<String>>;
}
