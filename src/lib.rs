// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod deployment;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{AggregateOutcome, DagGraph};
use crate::exec::{CommandBackend, CommandHooks};
use crate::types::{Contract, DependencyPolicy};

pub use crate::deployment::Deployment;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading
/// - the shell-command transport and hooks
/// - the deployment batch
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading manifest '{}'", args.config.display()))?;

    // The CLI flag can only tighten the manifest's policy.
    let strict = args.strict_dependencies || cfg.config.strict_dependencies;
    let policy = DependencyPolicy::from_strict_flag(strict);

    if args.dry_run {
        print!("{}", render_dry_run(&cfg, policy)?);
        debug!("dry-run complete (nothing deployed)");
        return Ok(());
    }

    let pattern = Regex::new(&cfg.config.address_pattern)
        .context("compiling [config].address_pattern")?;
    let backend = CommandBackend::new(pattern);
    let hooks = CommandHooks::new(cfg.hooks.before_all.clone(), cfg.hooks.after_all.clone());

    let deployment = Deployment::new(Arc::new(backend))
        .with_hooks(Arc::new(hooks))
        .with_policy(policy);

    let mut contracts = cfg.contracts();
    let dependencies = cfg.dependency_map();

    let result = deployment.deploy_contracts(&mut contracts, &dependencies).await;
    print!("{}", render_summary(&contracts, result.as_ref().ok()));
    result?;
    Ok(())
}

/// One line per contract with its address or error.
fn render_summary(contracts: &[Contract], outcome: Option<&AggregateOutcome>) -> String {
    if outcome.is_some_and(|o| o.empty_batch) {
        return "no contracts found\n".to_string();
    }

    let mut out = String::new();
    for contract in contracts {
        let line = match (&contract.address, &contract.error) {
            (_, Some(err)) => format!("{:<24} FAILED  {err}", contract.name),
            (Some(address), None) => format!("{:<24} {address}", contract.name),
            (None, None) => format!("{:<24} -", contract.name),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Validate the graph and describe the deployment levels without running
/// anything.
fn render_dry_run(cfg: &ConfigFile, policy: DependencyPolicy) -> Result<String> {
    let contracts = cfg.contracts();
    let graph = DagGraph::build(&contracts, &cfg.dependency_map(), policy)?;

    let mut lines = vec![
        "deploydag dry-run".to_string(),
        format!(
            "  config.strict_dependencies = {}",
            policy == DependencyPolicy::Strict
        ),
        format!("  config.address_pattern = {}", cfg.config.address_pattern),
        String::new(),
        format!("contracts ({}):", contracts.len()),
    ];

    for contract in &contracts {
        lines.push(format!("  - {}", contract.name));
        match (&contract.deploy_cmd, &contract.address_handler) {
            (_, Some(source)) => lines.push(format!("      resolve: {source:?}")),
            (Some(cmd), None) => lines.push(format!("      deploy: {cmd}")),
            (None, None) => {}
        }
        let deps = graph.dependencies_of(&contract.name);
        if !deps.is_empty() {
            lines.push(format!("      after: {deps:?}"));
        }
    }
    lines.push(String::new());

    lines.push("order:".to_string());
    for (i, level) in graph.execution_levels().iter().enumerate() {
        lines.push(format!("  {}: {}", i + 1, level.join(", ")));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}
