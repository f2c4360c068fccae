use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The canonical server descriptor every upstream source is mapped into.
///
/// One row per logical server, keyed by `id`. Rows are created or replaced
/// wholesale on each sync; they are never deleted by McpSync (a server
/// vanishing upstream does not delete it locally).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Stable identity. A pure function of stable upstream identifying data,
    /// never of volatile fields.
    pub id: String,

    /// Reverse-DNS-style namespace (e.g. "io.github.acme/weather"), unique
    /// per logical server within a source.
    pub name: String,

    pub description: Option<String>,

    pub status: ServerStatus,

    pub latest_version: Option<String>,

    pub website_url: Option<String>,

    pub repository: Option<RepositoryRef>,

    /// Opaque package listings; remote-only sources leave this empty.
    pub packages: Option<serde_json::Value>,

    /// Remotely invocable endpoints, in upstream order. Always non-empty:
    /// records without remotes are rejected before they reach this shape.
    pub remotes: Vec<Remote>,

    /// Namespace-string -> opaque blob. Each source writes only under its
    /// own namespace key; the storage layer merges this column on conflict
    /// so one source's write cannot erase another's.
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,

    pub published_at: DateTime<Utc>,

    /// Synchronization watermark field.
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a canonical record.
///
/// Anything an upstream reports outside this set is coerced to `Active` at
/// transform time; the raw value survives only in a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    #[default]
    Active,
    Deprecated,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Active => "active",
            ServerStatus::Deprecated => "deprecated",
        }
    }
}

impl std::str::FromStr for ServerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ServerStatus::Active),
            "deprecated" => Ok(ServerStatus::Deprecated),
            other => Err(format!("unknown server status: {}", other)),
        }
    }
}

/// A remotely invocable endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub url: String,
    #[serde(rename = "type")]
    pub remote_type: RemoteType,
}

/// Transport flavor of a remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteType {
    Sse,
    StreamableHttp,
}

impl RemoteType {
    /// URL heuristic: a URL mentioning `sse` anywhere is treated as an SSE
    /// endpoint; every other remote is Streamable HTTP.
    pub fn infer(url: &str) -> Self {
        if url.contains("sse") {
            RemoteType::Sse
        } else {
            RemoteType::StreamableHttp
        }
    }
}

/// Source repository reference for a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub url: String,
    /// Hosting platform identifier, e.g. "github".
    pub source: String,
}
