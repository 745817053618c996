// src/exec/command.rs

//! Shell command transport and helpers.
//!
//! Each contract's `deploy` / `resolve` command runs through `sh -c` (or
//! `cmd /C` on Windows). The address is the last match of the configured
//! address pattern on stdout. Commands see:
//! - `DEPLOYDAG_CONTRACT`: the contract name
//! - `DEPLOYDAG_ADDRESS_<NAME>`: the address of each settled prerequisite

use std::process::Stdio;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::exec::backend::{BackendFuture, DeployRequest, DeploymentBackend};
use crate::types::AddressSource;

/// Default pattern for an EVM address.
pub const DEFAULT_ADDRESS_PATTERN: &str = "0x[0-9a-fA-F]{40}";

/// Captured result of one shell command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CommandOutput {
    /// Best one-line description of why the command failed.
    pub fn failure_message(&self) -> String {
        self.stderr
            .iter()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(|line| line.trim().to_string())
            .unwrap_or_else(|| format!("command exited with code {}", self.exit_code))
    }
}

/// Environment variable name carrying a prerequisite's address.
pub fn address_env_var(contract: &str) -> String {
    let suffix: String = contract
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("DEPLOYDAG_ADDRESS_{suffix}")
}

/// Run a shell command to completion, capturing stdout/stderr line by line.
pub async fn run_shell(label: &str, cmd: &str, envs: &[(String, String)]) -> Result<CommandOutput> {
    info!(contract = %label, cmd = %cmd, "running command");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning command for '{label}'"))?;

    // Always drain stderr concurrently so the pipe never fills up.
    let stderr_task = tokio::spawn(collect_lines(
        child.stderr.take(),
        label.to_string(),
        "stderr",
    ));
    let stdout = collect_lines(child.stdout.take(), label.to_string(), "stdout").await;

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for command of '{label}'"))?;
    let stderr = stderr_task.await.unwrap_or_default();

    let exit_code = status.code().unwrap_or(-1);
    debug!(
        contract = %label,
        exit_code,
        success = status.success(),
        "command exited"
    );

    Ok(CommandOutput {
        success: status.success(),
        exit_code,
        stdout,
        stderr,
    })
}

async fn collect_lines<R>(reader: Option<R>, label: String, stream: &'static str) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Vec::new();
    };

    // Lines are decoded lossily so a stray non-UTF-8 byte never ends the
    // drain early.
    let mut collected = Vec::new();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                debug!(contract = %label, stream, "{}", line);
                collected.push(line);
            }
            Err(err) => {
                warn!(contract = %label, stream, error = %err, "reading command output failed");
                break;
            }
        }
    }
    collected
}

/// Transport that shells out to user-provided commands.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    address_pattern: Regex,
}

impl CommandBackend {
    pub fn new(address_pattern: Regex) -> Self {
        Self { address_pattern }
    }

    pub fn with_default_pattern() -> Result<Self> {
        let pattern = Regex::new(DEFAULT_ADDRESS_PATTERN)?;
        Ok(Self::new(pattern))
    }

    /// Last address found in the given lines.
    pub fn extract_address(&self, lines: &[String]) -> Option<String> {
        lines
            .iter()
            .flat_map(|line| self.address_pattern.find_iter(line))
            .last()
            .map(|m| m.as_str().to_string())
    }

    fn env_for(&self, request: &DeployRequest) -> Vec<(String, String)> {
        let mut envs = vec![("DEPLOYDAG_CONTRACT".to_string(), request.name().to_string())];
        for (dep, address) in &request.dependency_addresses {
            envs.push((address_env_var(dep), address.clone()));
        }
        envs
    }

    async fn resolve_inner(&self, request: &DeployRequest) -> Result<String> {
        let name = request.name();
        match &request.contract.address_handler {
            Some(AddressSource::Known(address)) => Ok(address.clone()),
            Some(AddressSource::Command(cmd)) => {
                let output = run_shell(name, cmd, &self.env_for(request)).await?;
                if !output.success {
                    return Err(anyhow!(output.failure_message()));
                }
                self.extract_address(&output.stdout)
                    .ok_or_else(|| anyhow!("resolve command printed no address"))
            }
            None => bail!("contract '{name}' has no address source"),
        }
    }

    async fn deploy_inner(&self, request: &DeployRequest) -> Result<Option<String>> {
        let name = request.name();
        let Some(cmd) = request.contract.deploy_cmd.as_deref() else {
            bail!("contract '{name}' has no deploy command");
        };

        let output = run_shell(name, cmd, &self.env_for(request)).await?;
        if !output.success {
            return Err(anyhow!(output.failure_message()));
        }
        Ok(self.extract_address(&output.stdout))
    }
}

impl DeploymentBackend for CommandBackend {
    fn resolve_address<'a>(&'a self, request: &'a DeployRequest) -> BackendFuture<'a, String> {
        Box::pin(self.resolve_inner(request))
    }

    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> BackendFuture<'a, Option<String>> {
        Box::pin(self.deploy_inner(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_env_var_is_shell_safe() {
        assert_eq!(address_env_var("Token"), "DEPLOYDAG_ADDRESS_TOKEN");
        assert_eq!(address_env_var("my-token.v2"), "DEPLOYDAG_ADDRESS_MY_TOKEN_V2");
    }

    #[test]
    fn extract_address_takes_last_match() {
        let backend = CommandBackend::with_default_pattern().unwrap();
        let lines = vec![
            "deployer 0x1111111111111111111111111111111111111111".to_string(),
            "nothing here".to_string(),
            "deployed at 0x2222222222222222222222222222222222222222".to_string(),
        ];
        assert_eq!(
            backend.extract_address(&lines).as_deref(),
            Some("0x2222222222222222222222222222222222222222")
        );
        assert_eq!(backend.extract_address(&["0x12".to_string()]), None);
    }

    #[test]
    fn failure_message_prefers_last_stderr_line() {
        let output = CommandOutput {
            success: false,
            exit_code: 3,
            stdout: vec![],
            stderr: vec!["first".to_string(), "second".to_string(), "  ".to_string()],
        };
        assert_eq!(output.failure_message(), "second");

        let silent = CommandOutput {
            stderr: vec![],
            ..output
        };
        assert_eq!(silent.failure_message(), "command exited with code 3");
    }

    #[tokio::test]
    async fn collect_lines_keeps_draining_past_invalid_utf8() {
        let raw: &[u8] = b"caf\xe9 banner\r\nsecond\nlast without newline";
        let lines = collect_lines(Some(raw), "Token".to_string(), "stdout").await;
        assert_eq!(
            lines,
            vec![
                "caf\u{FFFD} banner".to_string(),
                "second".to_string(),
                "last without newline".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn known_address_resolves_without_running_anything() {
        let backend = CommandBackend::with_default_pattern().unwrap();
        let contract = crate::types::Contract::new("Registry")
            .with_address_handler(AddressSource::Known("0xABC".to_string()));
        let request = DeployRequest::new(contract);
        assert_eq!(backend.resolve_address(&request).await.unwrap(), "0xABC");
    }

    #[tokio::test]
    async fn deploy_without_command_fails() {
        let backend = CommandBackend::with_default_pattern().unwrap();
        let request = DeployRequest::new(crate::types::Contract::new("Token"));
        let err = backend.deploy(&request).await.unwrap_err();
        assert!(err.to_string().contains("no deploy command"));
    }
}
