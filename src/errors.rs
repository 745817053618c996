// src/errors.rs

//! Crate-wide error types.
//!
//! - [`DeployError`] covers input validation and batch-level failures.
//! - [`TaskError`] is the failure of a single contract; it only ever travels
//!   through a task settlement, never out of the task runner directly.

use thiserror::Error;

/// Error string reported by a node when a deployment runs out of gas or
/// always reverts.
pub const GAS_ALLOWANCE_ERROR: &str =
    "Returned error: gas required exceeds allowance or always failing transaction";

/// Remediation message logged instead of [`GAS_ALLOWANCE_ERROR`].
pub const GAS_ALLOWANCE_ERROR_MESSAGE: &str = "Failed to deploy because of a gas allowance error. \
The contract constructor may be reverting, or the configured gas limit is too low. \
Check the constructor arguments and the account balance before retrying.";

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Duplicate contract name: {0}")]
    DuplicateContract(String),

    #[error("contract '{contract}' depends on unknown contract '{dependency}'")]
    UnknownDependency { contract: String, dependency: String },

    #[error("Cycle detected in dependency graph: {0}")]
    DagCycle(String),

    #[error("Error deploying contracts. Please fix errors to continue. ({failed} failed)")]
    BatchFailed { failed: usize },

    #[error("Hook error: {0}")]
    Hook(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single contract's resolution or deployment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("[{contract}]: address resolution failed: {message}")]
    Resolve { contract: String, message: String },

    #[error("[{contract}]: {message}")]
    Deploy { contract: String, message: String },

    #[error("[{contract}]: {}", GAS_ALLOWANCE_ERROR_MESSAGE)]
    GasAllowance { contract: String },

    #[error("[{contract}]: task runner panicked")]
    Panicked { contract: String },
}

impl TaskError {
    /// Name of the contract this error belongs to.
    pub fn contract(&self) -> &str {
        match self {
            TaskError::Resolve { contract, .. }
            | TaskError::Deploy { contract, .. }
            | TaskError::GasAllowance { contract }
            | TaskError::Panicked { contract } => contract,
        }
    }

    /// Classify a raw transport failure from the deploy path.
    pub fn from_deploy_failure(contract: &str, message: String) -> Self {
        if message.contains(GAS_ALLOWANCE_ERROR) {
            TaskError::GasAllowance {
                contract: contract.to_string(),
            }
        } else {
            TaskError::Deploy {
                contract: contract.to_string(),
                message,
            }
        }
    }

    pub fn is_gas_allowance(&self) -> bool {
        matches!(self, TaskError::GasAllowance { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_allowance_marker_is_classified() {
        let raw = format!("node said: {GAS_ALLOWANCE_ERROR}");
        let err = TaskError::from_deploy_failure("Token", raw);
        assert!(err.is_gas_allowance());
        assert_eq!(err.contract(), "Token");
        assert!(err.to_string().contains("gas allowance"));
    }

    #[test]
    fn other_failures_keep_their_message() {
        let err = TaskError::from_deploy_failure("Token", "nonce too low".to_string());
        assert_eq!(
            err,
            TaskError::Deploy {
                contract: "Token".to_string(),
                message: "nonce too low".to_string(),
            }
        );
        assert_eq!(err.to_string(), "[Token]: nonce too low");
    }
}
