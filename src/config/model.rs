// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::exec::command::DEFAULT_ADDRESS_PATTERN;
use crate::types::{AddressSource, Contract, DependencyMap, DependencyPolicy};

/// Manifest exactly as read from TOML, before validation.
///
/// ```toml
/// [config]
/// strict_dependencies = false
///
/// [hooks]
/// before_all = "echo starting"
///
/// [contract.Token]
/// deploy = "./deploy.sh Token"
///
/// [contract.Exchange]
/// deploy = "./deploy.sh Exchange"
/// after = ["Token"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub hooks: HooksSection,

    /// Keys are the contract names.
    #[serde(default)]
    pub contract: BTreeMap<String, ContractConfig>,
}

/// Validated manifest. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub hooks: HooksSection,
    pub contract: BTreeMap<String, ContractConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        hooks: HooksSection,
        contract: BTreeMap<String, ContractConfig>,
    ) -> Self {
        Self {
            config,
            hooks,
            contract,
        }
    }

    pub fn dependency_policy(&self) -> DependencyPolicy {
        DependencyPolicy::from_strict_flag(self.config.strict_dependencies)
    }

    /// Contracts in manifest (name) order.
    pub fn contracts(&self) -> Vec<Contract> {
        self.contract
            .iter()
            .map(|(name, cfg)| {
                let mut contract = Contract::new(name.clone());
                contract.deploy_cmd = cfg.deploy.clone();
                contract.address_handler = cfg.address_source();
                contract
            })
            .collect()
    }

    /// `after` lists of every contract that has one.
    pub fn dependency_map(&self) -> DependencyMap {
        self.contract
            .iter()
            .filter(|(_, cfg)| !cfg.after.is_empty())
            .map(|(name, cfg)| (name.clone(), cfg.after.clone()))
            .collect()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Reject prerequisites that name no known contract instead of treating
    /// them as satisfied.
    #[serde(default)]
    pub strict_dependencies: bool,

    /// Regex matched against command stdout to find an address.
    #[serde(default = "default_address_pattern")]
    pub address_pattern: String,
}

fn default_address_pattern() -> String {
    DEFAULT_ADDRESS_PATTERN.to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            strict_dependencies: false,
            address_pattern: default_address_pattern(),
        }
    }
}

/// `[hooks]` section: shell commands run around the batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HooksSection {
    #[serde(default)]
    pub before_all: Option<String>,
    #[serde(default)]
    pub after_all: Option<String>,
}

/// `[contract.<name>]` section.
///
/// Exactly one of `deploy`, `address` and `resolve` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractConfig {
    /// Command that deploys the contract.
    #[serde(default)]
    pub deploy: Option<String>,

    /// Address of an already-deployed instance.
    #[serde(default)]
    pub address: Option<String>,

    /// Command that prints the address of an already-deployed instance.
    #[serde(default)]
    pub resolve: Option<String>,

    /// Contracts that must be deployed first.
    #[serde(default)]
    pub after: Vec<String>,
}

impl ContractConfig {
    pub fn address_source(&self) -> Option<AddressSource> {
        match (&self.address, &self.resolve) {
            (Some(address), _) => Some(AddressSource::Known(address.clone())),
            (None, Some(cmd)) => Some(AddressSource::Command(cmd.clone())),
            (None, None) => None,
        }
    }
}
