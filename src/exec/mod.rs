// src/exec/mod.rs

//! Execution layer.
//!
//! - [`backend`] provides the `DeploymentBackend` trait the engine calls into.
//! - [`command`] is the shell-command backend used by the binary.
//! - [`hooks`] holds batch lifecycle hooks and notifications.
//! - [`task_runner`] runs one contract through the resolve or deploy path.

pub mod backend;
pub mod command;
pub mod hooks;
pub mod task_runner;

pub use backend::{BackendFuture, DeployRequest, DeploymentBackend};
pub use command::CommandBackend;
pub use hooks::{CommandHooks, DeploymentHooks, HookFuture, NoopHooks};
pub use task_runner::{Settlement, run_unit};
