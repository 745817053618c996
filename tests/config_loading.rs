// tests/config_loading.rs

use std::io::Write;

use deploydag::config::{load_and_validate, parse_str};
use deploydag::dag::DagGraph;
use deploydag::errors::DeployError;
use deploydag::types::{AddressSource, DependencyPolicy};
use deploydag_test_utils::builders::{ConfigFileBuilder, ContractConfigBuilder};
use tempfile::NamedTempFile;

#[test]
fn manifest_maps_to_contracts_and_dependencies() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[config]
strict_dependencies = true

[hooks]
before_all = "echo before"

[contract.Token]
deploy = "./deploy.sh Token"

[contract.Exchange]
deploy = "./deploy.sh Exchange"
after = ["Token", "Registry"]

[contract.Registry]
address = "0x00000000000000000000000000000000000000aa"

[contract.Oracle]
resolve = "cat oracle.addr"
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.dependency_policy(), DependencyPolicy::Strict);
    assert_eq!(cfg.hooks.before_all.as_deref(), Some("echo before"));
    assert!(cfg.hooks.after_all.is_none());

    let contracts = cfg.contracts();
    let names: Vec<&str> = contracts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Exchange", "Oracle", "Registry", "Token"]);

    let registry = contracts.iter().find(|c| c.name == "Registry").unwrap();
    assert_eq!(
        registry.address_handler,
        Some(AddressSource::Known(
            "0x00000000000000000000000000000000000000aa".to_string()
        ))
    );
    let oracle = contracts.iter().find(|c| c.name == "Oracle").unwrap();
    assert_eq!(
        oracle.address_handler,
        Some(AddressSource::Command("cat oracle.addr".to_string()))
    );
    let token = contracts.iter().find(|c| c.name == "Token").unwrap();
    assert!(!token.resolves_address());
    assert_eq!(token.deploy_cmd.as_deref(), Some("./deploy.sh Token"));

    let deps = cfg.dependency_map();
    assert_eq!(deps.len(), 1);
    assert_eq!(
        deps.get("Exchange"),
        Some(&vec!["Token".to_string(), "Registry".to_string()])
    );
}

#[test]
fn defaults_apply_for_missing_sections() {
    let raw = parse_str(
        r#"
[contract.A]
deploy = "true"
"#,
    )
    .unwrap();
    assert!(!raw.config.strict_dependencies);
    assert_eq!(raw.config.address_pattern, "0x[0-9a-fA-F]{40}");
    assert!(raw.hooks.before_all.is_none());
}

#[test]
fn address_and_resolve_entries_take_the_resolve_path() {
    let cfg = ConfigFileBuilder::new()
        .with_contract("Registry", ContractConfigBuilder::address("0xR").build())
        .with_contract("Oracle", ContractConfigBuilder::resolve("cat oracle.addr").build())
        .with_contract(
            "Token",
            ContractConfigBuilder::deploy("./deploy.sh").after("Registry").build(),
        )
        .build();

    let contracts = cfg.contracts();
    assert!(contracts[0].resolves_address()); // Oracle
    assert!(contracts[1].resolves_address()); // Registry
    assert!(!contracts[2].resolves_address()); // Token
    assert_eq!(
        contracts[1].address_handler,
        Some(AddressSource::Known("0xR".to_string()))
    );
    assert!(contracts[0].deploy_cmd.is_none());
}

#[test]
fn cyclic_manifest_is_rejected_by_graph_builder() {
    let cfg = ConfigFileBuilder::new()
        .with_contract("A", ContractConfigBuilder::deploy("true").after("B").build())
        .with_contract("B", ContractConfigBuilder::deploy("true").after("A").build())
        .build();

    let err = DagGraph::build(&cfg.contracts(), &cfg.dependency_map(), cfg.dependency_policy())
        .unwrap_err();
    match err {
        DeployError::DagCycle(msg) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        other => panic!("Expected DagCycle error, got: {other:?}"),
    }
}

#[test]
fn strict_manifest_rejects_unknown_dependency() {
    let cfg = ConfigFileBuilder::new()
        .strict_dependencies(true)
        .with_contract("A", ContractConfigBuilder::deploy("true").after("NonExistent").build())
        .build();

    let err = DagGraph::build(&cfg.contracts(), &cfg.dependency_map(), cfg.dependency_policy())
        .unwrap_err();
    match err {
        DeployError::UnknownDependency { contract, dependency } => {
            assert_eq!(contract, "A");
            assert_eq!(dependency, "NonExistent");
        }
        other => panic!("Expected UnknownDependency, got: {other:?}"),
    }
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let result = parse_str("[contract.A\ndeploy = ");
    assert!(matches!(result, Err(DeployError::TomlError(_))));
}

#[test]
fn unknown_policy_field_type_is_rejected() {
    let result = parse_str(
        r#"
[config]
strict_dependencies = "sometimes"
"#,
    );
    assert!(matches!(result, Err(DeployError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = load_and_validate("/definitely/not/here/Deploydag.toml");
    assert!(matches!(result, Err(DeployError::IoError(_))));
}
