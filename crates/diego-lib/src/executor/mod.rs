//! Container executor adapters
//!
//! Each supported executor gets its own adapter that shells out to the
//! executor's `ps` subcommand and normalizes the listing into
//! [`ContainerRecord`]s:
//! - docker: tab-separated Go template output
//! - podman: JSON array output

mod docker;
mod podman;


pub use docker::{parse_ps_line, parse_ps_output, DockerExecutor, PS_TEMPLATE};
pub use podman::{parse_ps_json, PodmanExecutor};

use crate::error::{Result, WatchError};
use crate::models::ContainerRecord;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::process::Command;

/// Trait for listing the containers an executor is currently running
#[async_trait]
pub trait ContainerExecutor: Send + Sync {
    /// Executor name used in logs and errors
    fn name(&self) -> &str;

    /// List all running containers
    async fn list_containers(&self) -> Result<Vec<ContainerRecord>>;
}

/// The executors with a known output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    Docker,
    Podman,
}

impl ExecutorKind {
    pub const ALL: [ExecutorKind; 2] = [ExecutorKind::Docker, ExecutorKind::Podman];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorKind::Docker => "docker",
            ExecutorKind::Podman => "podman",
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutorKind {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self> {
        ExecutorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| WatchError::UnsupportedExecutor(s.to_string()))
    }
}

/// Create the adapter for an executor kind
pub fn create_executor(kind: ExecutorKind) -> Arc<dyn ContainerExecutor> {
    match kind {
        ExecutorKind::Docker => {
            tracing::debug!("Using docker executor with tab-separated ps output");
            Arc::new(DockerExecutor::new())
        }
        ExecutorKind::Podman => {
            tracing::debug!("Using podman executor with JSON ps output");
            Arc::new(PodmanExecutor::new())
        }
    }
}

/// Program and leading arguments used to invoke an executor binary
#[derive(Debug, Clone)]
pub(crate) struct ExecutorCommand {
    program: String,
    leading_args: Vec<String>,
}

impl ExecutorCommand {
    pub(crate) fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub(crate) fn with_args<I, S>(program: impl Into<String>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    /// Run the executor and return its stdout
    ///
    /// Fails if the binary cannot be spawned or exits unsuccessfully. There is
    /// no timeout: a hung executor blocks the caller.
    pub(crate) async fn output(&self, executor: &str, args: &[&str]) -> Result<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .output()
            .await
            .map_err(|source| WatchError::Invocation {
                executor: executor.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(WatchError::ExecutorFailed {
                executor: executor.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
