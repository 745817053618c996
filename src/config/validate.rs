// src/config/validate.rs

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DeployError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DeployError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.hooks, raw.contract))
    }
}

// Dependency names are not checked here: unknown prerequisites and cycles
// are the graph builder's job, under the configured policy.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_contracts(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    Regex::new(&cfg.config.address_pattern).map_err(|e| {
        DeployError::ConfigError(format!(
            "[config].address_pattern is not a valid regex: {e}"
        ))
    })?;
    Ok(())
}

fn validate_contracts(cfg: &RawConfigFile) -> Result<()> {
    for (name, contract) in cfg.contract.iter() {
        if name.trim().is_empty() {
            return Err(DeployError::ConfigError(
                "contract names must not be empty".to_string(),
            ));
        }

        let sources = [
            contract.deploy.is_some(),
            contract.address.is_some(),
            contract.resolve.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();

        match sources {
            1 => {}
            0 => {
                return Err(DeployError::ConfigError(format!(
                    "contract '{name}' needs one of `deploy`, `address` or `resolve`"
                )));
            }
            _ => {
                return Err(DeployError::ConfigError(format!(
                    "contract '{name}' sets more than one of `deploy`, `address` and `resolve`"
                )));
            }
        }

        if contract.after.iter().any(|dep| dep.trim().is_empty()) {
            return Err(DeployError::ConfigError(format!(
                "contract '{name}' has an empty name in `after`"
            )));
        }
    }
    Ok(())
}
