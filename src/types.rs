use std::collections::BTreeMap;

/// Map from contract name to the names of the contracts it must wait for.
pub type DependencyMap = BTreeMap<String, Vec<String>>;

/// What to do with a prerequisite name that does not match any known contract.
///
/// - `Lenient`: treat the prerequisite as already satisfied and log a warning
///   (default, nothing to wait for means nothing to deploy first).
/// - `Strict`: reject the batch before anything runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyPolicy {
    Lenient,
    Strict,
}

impl Default for DependencyPolicy {
    fn default() -> Self {
        DependencyPolicy::Lenient
    }
}

impl DependencyPolicy {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            DependencyPolicy::Strict
        } else {
            DependencyPolicy::Lenient
        }
    }
}

/// Where the resolve path gets an already-deployed contract's address from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSource {
    /// Address is fixed in the manifest.
    Known(String),
    /// Address is printed by a shell command.
    Command(String),
}

/// A deployable contract tracked by the scheduler.
///
/// The caller owns it before and after a batch; the deployment engine
/// writes `address`, `deployed_address` and `error` when the contract's task
/// settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub name: String,
    /// When set, the contract is resolved rather than deployed.
    pub address_handler: Option<AddressSource>,
    /// Shell command used by [`crate::exec::CommandBackend`] to deploy.
    pub deploy_cmd: Option<String>,
    pub address: Option<String>,
    pub deployed_address: Option<String>,
    pub error: Option<String>,
}

impl Contract {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address_handler: None,
            deploy_cmd: None,
            address: None,
            deployed_address: None,
            error: None,
        }
    }

    pub fn with_deploy_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.deploy_cmd = Some(cmd.into());
        self
    }

    pub fn with_address_handler(mut self, source: AddressSource) -> Self {
        self.address_handler = Some(source);
        self
    }

    /// Whether this contract takes the resolve path.
    pub fn resolves_address(&self) -> bool {
        self.address_handler.is_some()
    }

    /// Copy the fields a settled task may have written back onto `self`.
    pub(crate) fn absorb_settlement(&mut self, settled: &Contract) {
        self.address = settled.address.clone();
        self.deployed_address = settled.deployed_address.clone();
        self.error = settled.error.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_flag_maps_to_policy() {
        assert_eq!(DependencyPolicy::from_strict_flag(true), DependencyPolicy::Strict);
        assert_eq!(DependencyPolicy::from_strict_flag(false), DependencyPolicy::Lenient);
        assert_eq!(DependencyPolicy::default(), DependencyPolicy::Lenient);
    }

    #[test]
    fn address_handler_selects_resolve_path() {
        let plain = Contract::new("Token").with_deploy_cmd("true");
        assert!(!plain.resolves_address());

        let known = Contract::new("Registry")
            .with_address_handler(AddressSource::Known("0xABC".to_string()));
        assert!(known.resolves_address());
    }
}
