//! Core data models for the watcher

use serde::{Deserialize, Deserializer};

/// A container as reported by one executor listing
///
/// Only `id` is used for identity; everything else is descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerRecord {
    #[serde(rename = "Id", alias = "ID", alias = "id")]
    pub id: String,
    #[serde(rename = "Command", default, deserialize_with = "flexible_string")]
    pub command: String,
    #[serde(rename = "Image", default, deserialize_with = "flexible_string")]
    pub image: String,
    #[serde(rename = "Names", default, deserialize_with = "joined_with_comma")]
    pub names: String,
    #[serde(rename = "Status", default, deserialize_with = "flexible_string")]
    pub status: String,
    #[serde(rename = "CreatedAt", default, deserialize_with = "flexible_string")]
    pub created_at: String,
    #[serde(
        rename = "StartedAt",
        default,
        deserialize_with = "optional_flexible_string"
    )]
    pub started_at: Option<String>,
}

impl ContainerRecord {
    /// Name shown in log lines; the short id when the executor reports no name
    pub fn display_name(&self) -> &str {
        if self.names.is_empty() {
            self.short_id()
        } else {
            &self.names
        }
    }

    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(12) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }
}

/// Direction of a container transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Started,
    Stopped,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Started => "started",
            TransitionKind::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container that appeared or disappeared between two polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub record: ContainerRecord,
    pub kind: TransitionKind,
}

impl Transition {
    pub fn started(record: ContainerRecord) -> Self {
        Self {
            record,
            kind: TransitionKind::Started,
        }
    }

    pub fn stopped(record: ContainerRecord) -> Self {
        Self {
            record,
            kind: TransitionKind::Stopped,
        }
    }
}

/// Executors disagree on field shapes: podman emits `Names` and `Command`
/// as arrays and `StartedAt` as a unix timestamp, docker emits strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleValue {
    Text(String),
    List(Vec<String>),
    Integer(i64),
    Float(f64),
    Null(()),
}

impl FlexibleValue {
    fn into_string(self, separator: &str) -> String {
        match self {
            FlexibleValue::Text(s) => s,
            FlexibleValue::List(items) => items.join(separator),
            FlexibleValue::Integer(n) => n.to_string(),
            FlexibleValue::Float(n) => n.to_string(),
            FlexibleValue::Null(()) => String::new(),
        }
    }
}

fn flexible_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    FlexibleValue::deserialize(deserializer).map(|v| v.into_string(" "))
}

fn joined_with_comma<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    FlexibleValue::deserialize(deserializer).map(|v| v.into_string(","))
}

fn optional_flexible_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = FlexibleValue::deserialize(deserializer)?;
    Ok(match value {
        FlexibleValue::Null(()) => None,
        other => Some(other.into_string(" ")),
    })
}
