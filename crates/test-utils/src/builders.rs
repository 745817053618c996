#![allow(dead_code)]

use std::collections::BTreeMap;

use deploydag::config::{
    ConfigFile, ConfigSection, ContractConfig, HooksSection, RawConfigFile,
};
use deploydag::types::{AddressSource, Contract, DependencyMap};

/// Contract that takes the deploy path.
pub fn deployable(name: &str) -> Contract {
    Contract::new(name)
}

/// Contract that takes the resolve path with a fixed address.
pub fn resolvable(name: &str, address: &str) -> Contract {
    Contract::new(name).with_address_handler(AddressSource::Known(address.to_string()))
}

/// Build a `DependencyMap` from `(contract, prerequisites)` pairs.
pub fn dependency_map(pairs: &[(&str, &[&str])]) -> DependencyMap {
    pairs
        .iter()
        .map(|(name, deps)| {
            (
                name.to_string(),
                deps.iter().map(|d| d.to_string()).collect(),
            )
        })
        .collect()
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                hooks: HooksSection::default(),
                contract: BTreeMap::new(),
            },
        }
    }

    pub fn with_contract(mut self, name: &str, contract: ContractConfig) -> Self {
        self.config.contract.insert(name.to_string(), contract);
        self
    }

    pub fn strict_dependencies(mut self, val: bool) -> Self {
        self.config.config.strict_dependencies = val;
        self
    }

    pub fn before_all(mut self, cmd: &str) -> Self {
        self.config.hooks.before_all = Some(cmd.to_string());
        self
    }

    pub fn after_all(mut self, cmd: &str) -> Self {
        self.config.hooks.after_all = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ContractConfig`.
pub struct ContractConfigBuilder {
    contract: ContractConfig,
}

impl ContractConfigBuilder {
    pub fn deploy(cmd: &str) -> Self {
        Self {
            contract: ContractConfig {
                deploy: Some(cmd.to_string()),
                ..ContractConfig::default()
            },
        }
    }

    pub fn address(address: &str) -> Self {
        Self {
            contract: ContractConfig {
                address: Some(address.to_string()),
                ..ContractConfig::default()
            },
        }
    }

    pub fn resolve(cmd: &str) -> Self {
        Self {
            contract: ContractConfig {
                resolve: Some(cmd.to_string()),
                ..ContractConfig::default()
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.contract.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> ContractConfig {
        self.contract
    }
}
