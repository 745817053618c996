// src/config/mod.rs

//! Deployment manifest loading and validation.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a manifest from disk.
//! - `validate.rs`: per-contract sanity checks.

pub mod loader;
pub mod model;
mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, ConfigSection, ContractConfig, HooksSection, RawConfigFile};
