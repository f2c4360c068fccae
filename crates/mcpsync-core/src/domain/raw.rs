//! Raw upstream record shapes.
//!
//! These types mirror what the sources actually send. They are never
//! persisted; they exist only between a fetcher and the transformer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key under which the official registry nests its own metadata inside a
/// server object's `_meta` block.
pub const OFFICIAL_META_KEY: &str = "io.modelcontextprotocol.registry/official";

/// A raw record from either source, tagged by origin.
///
/// All schema mapping dispatches on this tag; there is exactly one transform
/// per source variant rather than parallel top-level functions.
#[derive(Debug, Clone)]
pub enum RawServerRecord {
    Registry(RegistryServer),
    Chain(ChainServer),
}

impl RawServerRecord {
    /// Stable logical name used for de-duplication and identity derivation.
    pub fn logical_name(&self) -> Option<&str> {
        match self {
            RawServerRecord::Registry(s) => s.name.as_deref(),
            RawServerRecord::Chain(s) => s.namespace.as_deref(),
        }
    }

    /// Upstream "this row is the latest version" flag, where the source has
    /// a notion of version rows at all.
    pub fn is_latest(&self) -> Option<bool> {
        match self {
            RawServerRecord::Registry(s) => s.meta.official.is_latest,
            RawServerRecord::Chain(_) => None,
        }
    }

    /// Raw upstream `updated_at` string, unparsed.
    pub fn raw_updated_at(&self) -> Option<&str> {
        match self {
            RawServerRecord::Registry(s) => s.meta.official.updated_at.as_deref(),
            RawServerRecord::Chain(_) => None,
        }
    }
}

/// Parse an upstream RFC 3339 timestamp, tolerating the trailing-`Z` form.
/// Returns `None` for absent or unparsable input; callers decide the
/// fallback (dedup keeps the first record, transform stamps the sync time).
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================
// Official registry wire shapes
// ============================================

/// One element of the official registry's `servers` array.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistryServer {
    /// Reverse-DNS namespace, e.g. "io.github.acme/weather".
    pub name: Option<String>,
    pub description: Option<String>,
    /// Free-form upstream status string; sanitized at transform time.
    pub status: Option<String>,
    pub version: Option<String>,
    pub website_url: Option<String>,
    pub repository: Option<RawRepository>,
    pub packages: Option<serde_json::Value>,
    #[serde(default)]
    pub remotes: Vec<RawRemote>,
    #[serde(rename = "_meta", default)]
    pub meta: RegistryMeta,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRepository {
    pub url: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRemote {
    pub url: Option<String>,
    /// Upstream-declared transport. Ignored: the canonical type comes from
    /// the URL heuristic.
    #[serde(rename = "type")]
    pub remote_type: Option<String>,
}

/// The `_meta` envelope on a registry server object.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistryMeta {
    #[serde(rename = "io.modelcontextprotocol.registry/official", default)]
    pub official: OfficialMeta,
}

/// Registry-operator metadata: the opaque row id, the latest-version flag,
/// and the only timestamps this source exposes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OfficialMeta {
    pub id: Option<String>,
    pub is_latest: Option<bool>,
    /// Kept as raw strings: bad dates must not reject the whole record.
    pub published_at: Option<String>,
    pub updated_at: Option<String>,
}

// ============================================
// Chain (delegated) wire shapes
// ============================================

/// One element of the JSON array returned by the delegated chain fetch.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainServer {
    /// Stable reverse-DNS namespace; the identity source for this origin.
    pub namespace: Option<String>,
    /// Human-friendly display name, not the logical name.
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub banner_url: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<serde_json::Value>,
    pub details: Option<ChainDetails>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDetails {
    pub latest_version: Option<ChainVersion>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainVersion {
    pub version_string: Option<String>,
    /// Chain review status, e.g. "Verified"; sanitized at transform time.
    pub status: Option<String>,
    pub server_url: Option<String>,
    pub wasm_id: Option<String>,
    pub security_tier: Option<String>,
    pub build_info: Option<ChainBuildInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainBuildInfo {
    pub repo_url: Option<String>,
}

impl ChainServer {
    /// The latest-version block, however deeply the delegate nested it.
    pub fn latest_version(&self) -> Option<&ChainVersion> {
        self.details.as_ref()?.latest_version.as_ref()
    }
}
