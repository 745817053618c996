// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `deploydag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "deploydag",
    version,
    about = "Deploy interdependent contracts in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the deployment manifest (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEPLOYDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the deployment order, but don't deploy.
    #[arg(long)]
    pub dry_run: bool,

    /// Fail on prerequisites that name no known contract, overriding
    /// `[config].strict_dependencies`.
    #[arg(long)]
    pub strict_dependencies: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
