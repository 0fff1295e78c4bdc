//! Docker adapter
//!
//! Asks `docker ps` for one line per container using a Go template and maps
//! the fields positionally. Fields are separated by tabs rather than spaces
//! because commands, statuses and creation times all contain spaces.

use super::{ContainerExecutor, ExecutorCommand};
use crate::error::{Result, WatchError};
use crate::models::ContainerRecord;
use async_trait::async_trait;

const NAME: &str = "docker";

/// Go template passed to `docker ps --format`
pub const PS_TEMPLATE: &str =
    "{{.ID}}\t{{.Command}}\t{{.Image}}\t{{.Names}}\t{{.Status}}\t{{.CreatedAt}}";

const FIELD_COUNT: usize = 6;

/// Adapter for the docker CLI
pub struct DockerExecutor {
    command: ExecutorCommand,
}

impl DockerExecutor {
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

impl Default for DockerExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerExecutor for DockerExecutor {
    fn name(&self) -> &str {
        NAME
    }

    async fn list_containers(&self) -> Result<Vec<ContainerRecord>> {
        let stdout = self
            .command
            .output(NAME, &["ps", "--format", PS_TEMPLATE])
            .await?;
        let text = String::from_utf8(stdout).map_err(|e| WatchError::decode(NAME, e.to_string()))?;

        parse_ps_output(&text)
    }
}

/// Parse the full `docker ps` output, skipping blank lines
pub fn parse_ps_output(output: &str) -> Result<Vec<ContainerRecord>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_ps_line)
        .collect()
}

/// Parse one templated line into a record
///
/// Double quotes are stripped from every field; docker wraps the command
/// in them.
pub fn parse_ps_line(line: &str) -> Result<ContainerRecord> {
    let fields: Vec<String> = line.split('\t').map(|f| f.replace('"', "")).collect();

    match fields.as_slice() {
        [id, command, image, names, status, created_at] => {
            if id.trim().is_empty() {
                return Err(WatchError::decode(NAME, format!("empty container id in {line:?}")));
            }

            Ok(ContainerRecord {
                id: id.trim().to_string(),
                command: command.clone(),
                image: image.clone(),
                names: names.clone(),
                status: status.clone(),
                created_at: created_at.clone(),
                started_at: None,
            })
        }
        _ => Err(WatchError::decode(
            NAME,
            format!(
                "expected {FIELD_COUNT} tab-separated fields, got {}: {line:?}",
                fields.len()
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_keeps_values_with_spaces() {
        let line = "3f4e5d6c7b8a\t\"nginx -g 'daemon of…\"\tnginx:1.25\tweb\tUp 2 minutes\t2024-01-01 10:00:00 +0000 UTC";

        let record = parse_ps_line(line).unwrap();
        assert_eq!(record.id, "3f4e5d6c7b8a");
        assert_eq!(record.command, "nginx -g 'daemon of…");
        assert_eq!(record.image, "nginx:1.25");
        assert_eq!(record.names, "web");
        assert_eq!(record.status, "Up 2 minutes");
        assert_eq!(record.created_at, "2024-01-01 10:00:00 +0000 UTC");
        assert_eq!(record.started_at, None);
    }

    #[test]
    fn test_parse_line_strips_wrapping_quotes() {
        let record = parse_ps_line("\"c1\tsh\talpine\tbox\tUp\tnow\"").unwrap();
        assert_eq!(record.id, "c1");
        assert_eq!(record.created_at, "now");
    }

    #[test]
    fn test_parse_line_too_few_fields() {
        let err = parse_ps_line("c1 sh alpine box Up now").unwrap_err();
        assert!(matches!(err, WatchError::Decode { .. }));
        assert!(err.to_string().contains("got 1"));
    }

    #[test]
    fn test_parse_line_too_many_fields() {
        let err = parse_ps_line("c1\tsh\talpine\tbox\tUp\tnow\textra").unwrap_err();
        assert!(matches!(err, WatchError::Decode { .. }));
        assert!(err.to_string().contains("got 7"));
    }

    #[test]
    fn test_parse_line_empty_id() {
        let err = parse_ps_line("\tsh\talpine\tbox\tUp\tnow").unwrap_err();
        assert!(matches!(err, WatchError::Decode { .. }));
    }

    #[test]
    fn test_parse_output_skips_blank_lines() {
        let output = "c1\tsh\talpine\tone\tUp\tnow\n\nc2\tsh\talpine\ttwo\tUp\tnow\r\n";

        let records = parse_ps_output(output).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "c2");
        assert_eq!(records[1].created_at, "now");
    }

    #[test]
    fn test_parse_output_empty() {
        assert!(parse_ps_output("").unwrap().is_empty());
    }
}
