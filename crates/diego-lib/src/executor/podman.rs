//! Podman adapter, decoding `podman ps --format json`

use super::{ContainerExecutor, ExecutorCommand};
use crate::error::{Result, WatchError};
use crate::models::ContainerRecord;
use async_trait::async_trait;

const NAME: &str = "podman";

/// Adapter for the podman CLI
pub struct PodmanExecutor {
    command: ExecutorCommand,
}

impl PodmanExecutor {
    pub fn new() -> Self {
        Self {
            command: ExecutorCommand::new(NAME),
        }
    }

    /// Create an adapter that runs a custom program (for testing)
    pub fn with_command<I, S>(program: impl Into<String>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: ExecutorCommand::with_args(program, leading_args),
        }
    }
}

impl Default for PodmanExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerExecutor for PodmanExecutor {
    fn name(&self) -> &str {
        NAME
    }

    async fn list_containers(&self) -> Result<Vec<ContainerRecord>> {
        let stdout = self
            .command
            .output(NAME, &["ps", "--format", "json"])
            .await?;

        parse_ps_json(&stdout)
    }
}

/// Decode a JSON array of containers
///
/// podman prints `[]` when nothing runs, so empty output is a decode error
/// rather than an empty listing.
pub fn parse_ps_json(output: &[u8]) -> Result<Vec<ContainerRecord>> {
    serde_json::from_slice(output).map_err(|e| WatchError::decode(NAME, e.to_string()))
}
