//! Container runtime integration
//!
//! Resolves the container backing a participant's browser and executes
//! shell-style commands inside it via the runtime CLI.

use async_trait::async_trait;
use std::process::Command;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use qoe_common::{Error, Result};

/// Container runtime detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    Docker,
    Podman,
}

impl ContainerRuntime {
    /// Detect available container runtime
    pub fn detect() -> Option<Self> {
        // Check podman first (rootless friendly)
        if Command::new("podman").arg("--version").output().is_ok() {
            return Some(Self::Podman);
        }
        // Then docker
        if Command::new("docker").arg("--version").output().is_ok() {
            return Some(Self::Docker);
        }
        None
    }

    /// Get the CLI command name
    pub fn command(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
        }
    }
}

/// Executes commands inside a container identified by an opaque handle
#[async_trait]
pub trait ContainerExec: Send + Sync {
    /// Run a command inside the container, returning its stdout
    async fn exec(&self, container: &str, argv: &[String]) -> Result<String>;

    /// Resolve a container id from a name filter
    async fn resolve_container(&self, name_filter: &str) -> Result<Option<String>>;
}

/// CLI-backed executor (`docker exec` / `podman exec`)
pub struct CliExecutor {
    runtime: ContainerRuntime,
}

impl CliExecutor {
    pub fn new(runtime: ContainerRuntime) -> Self {
        Self { runtime }
    }

    pub fn detect() -> Result<Self> {
        ContainerRuntime::detect()
            .map(Self::new)
            .ok_or(Error::RuntimeMissing)
    }

    pub fn runtime(&self) -> ContainerRuntime {
        self.runtime
    }
}

#[async_trait]
impl ContainerExec for CliExecutor {
    async fn exec(&self, container: &str, argv: &[String]) -> Result<String> {
        debug!("Running {:?} in container {}", argv, container);

        let output = AsyncCommand::new(self.runtime.command())
            .arg("exec")
            .arg(container)
            .args(argv)
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::CommandExec {
                command: argv.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn resolve_container(&self, name_filter: &str) -> Result<Option<String>> {
        let output = AsyncCommand::new(self.runtime.command())
            .args([
                "ps",
                "--filter",
                &format!("name={}", name_filter),
                "--format",
                "{{.ID}}",
            ])
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::CommandExec {
                command: format!("ps --filter name={}", name_filter),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(String::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_command_names() {
        assert_eq!(ContainerRuntime::Docker.command(), "docker");
        assert_eq!(ContainerRuntime::Podman.command(), "podman");
    }
}
