//! Canonical transformer.
//!
//! Maps raw upstream records into `ServerRecord`, dispatching on the source
//! tag. Pure: no I/O, no clock reads (the sync time is a parameter), and a
//! bad record yields `None` plus a diagnostic - one malformed upstream entry
//! must never abort a batch.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    parse_timestamp, ChainServer, RawServerRecord, RegistryServer, Remote, RemoteType,
    RepositoryRef, ServerRecord, ServerStatus,
};
use crate::sources::SourceId;

/// Fixed namespace for name-based identity derivation. Versioned: changing
/// it forks every derived id, so it changes only with a schema migration.
pub const SERVER_ID_NAMESPACE: Uuid = Uuid::from_u128(0x02ffac85_92a0_4bb2_adf4_c715b3c93b0d);

/// Derive the stable identity for a namespace string. Same input, same id,
/// across runs and restarts - upsert idempotence depends on this.
pub fn deterministic_id(namespace_name: &str) -> String {
    Uuid::new_v5(&SERVER_ID_NAMESPACE, namespace_name.as_bytes()).to_string()
}

/// Transform one raw record into the canonical shape, or `None` if the
/// record is ineligible (no stable name, or not remotely reachable).
pub fn transform(raw: &RawServerRecord, now: DateTime<Utc>) -> Option<ServerRecord> {
    match raw {
        RawServerRecord::Registry(server) => transform_registry(server, now),
        RawServerRecord::Chain(server) => transform_chain(server, now),
    }
}

// ============================================
// Official registry mapping
// ============================================

fn transform_registry(server: &RegistryServer, now: DateTime<Utc>) -> Option<ServerRecord> {
    let name = match server.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => {
            warn!(
                description = server.description.as_deref().unwrap_or("<none>"),
                "rejecting registry record without a name"
            );
            return None;
        }
    };

    let remotes: Vec<Remote> = server
        .remotes
        .iter()
        .filter_map(|r| r.url.as_deref())
        .filter(|url| !url.is_empty())
        .map(|url| Remote {
            url: url.to_string(),
            remote_type: RemoteType::infer(url),
        })
        .collect();

    if remotes.is_empty() {
        // Package-only servers are the common case upstream, not an anomaly.
        debug!(name, "skipping registry record without remote endpoints");
        return None;
    }

    let official = &server.meta.official;

    // Prefer the registry's own opaque row id; fall back to the derived one.
    let id = official
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| deterministic_id(name));

    let repository = server.repository.as_ref().and_then(|r| {
        let url = r.url.as_deref().filter(|u| !u.is_empty())?.to_string();
        let source = r
            .source
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| url.contains("github.com").then(|| "github".to_string()))?;
        Some(RepositoryRef { url, source })
    });

    let (provider, server_part) = split_namespace(name);
    let meta_block = json!({
        "display_name": display_name(server_part),
        "is_official": true,
        "category": "Uncategorized",
        "authentication_type": "Unknown",
        "dynamic_client_registration": false,
        "maintainer_name": provider.map(domain_from_reverse_dns),
        "maintainer_url": repository.as_ref().map(|r| r.url.clone()),
    });

    Some(ServerRecord {
        id,
        name: name.to_string(),
        description: server.description.clone(),
        status: sanitize_status(server.status.as_deref(), name),
        latest_version: server.version.clone(),
        website_url: server.website_url.clone(),
        repository,
        packages: server.packages.clone(),
        remotes,
        meta: [(SourceId::Registry.meta_namespace().to_string(), meta_block)].into(),
        published_at: parse_timestamp(official.published_at.as_deref()).unwrap_or(now),
        updated_at: parse_timestamp(official.updated_at.as_deref()).unwrap_or(now),
    })
}

// ============================================
// Chain mapping
// ============================================

fn transform_chain(server: &ChainServer, now: DateTime<Utc>) -> Option<ServerRecord> {
    let namespace = match server.namespace.as_deref().filter(|n| !n.is_empty()) {
        Some(namespace) => namespace,
        None => {
            warn!(
                display_name = server.name.as_deref().unwrap_or("<none>"),
                "rejecting chain record without a namespace"
            );
            return None;
        }
    };

    let latest = server.latest_version();

    let remotes: Vec<Remote> = latest
        .and_then(|v| v.server_url.as_deref())
        .filter(|url| !url.is_empty())
        .map(|url| Remote {
            url: url.to_string(),
            remote_type: RemoteType::infer(url),
        })
        .into_iter()
        .collect();

    if remotes.is_empty() {
        debug!(namespace, "skipping chain record without a server URL");
        return None;
    }

    let repository = latest
        .and_then(|v| v.build_info.as_ref())
        .and_then(|b| b.repo_url.as_deref())
        .filter(|url| url.contains("github.com"))
        .map(|url| RepositoryRef {
            url: url.to_string(),
            source: "github".to_string(),
        });

    let meta_block = json!({
        "display_name": server.name,
        "icon_url": server.icon_url,
        "banner_url": server.banner_url,
        "is_official": false,
        "category": server.category,
        "authentication_type": "Unknown",
        "dynamic_client_registration": false,
        "publisher": server.publisher,
        "wasm_id": latest.and_then(|v| v.wasm_id.clone()),
        "security_tier": latest.and_then(|v| v.security_tier.clone()),
    });

    Some(ServerRecord {
        // The chain supplies no opaque row id; identity is always derived.
        id: deterministic_id(namespace),
        name: namespace.to_string(),
        description: server.description.clone(),
        status: sanitize_chain_status(latest.and_then(|v| v.status.as_deref()), namespace),
        latest_version: latest.and_then(|v| v.version_string.clone()),
        website_url: None,
        repository,
        packages: None,
        remotes,
        meta: [(SourceId::Chain.meta_namespace().to_string(), meta_block)].into(),
        // The chain exposes no timestamps, so rows are stamped with the sync
        // time; a watermark can never narrow this source.
        published_at: now,
        updated_at: now,
    })
}

// ============================================
// Field helpers
// ============================================

/// Coerce an upstream status string into the canonical enum. Unrecognized
/// values become `Active`; the raw value survives only in the diagnostic.
fn sanitize_status(raw: Option<&str>, name: &str) -> ServerStatus {
    match raw {
        None | Some("active") => ServerStatus::Active,
        Some("deprecated") => ServerStatus::Deprecated,
        Some(other) => {
            warn!(record = name, status = other, "unrecognized upstream status, coercing to active");
            ServerStatus::Active
        }
    }
}

/// Chain review vocabulary: "Verified" is live, "Deprecated" is retired,
/// anything else falls back like `sanitize_status`.
fn sanitize_chain_status(raw: Option<&str>, name: &str) -> ServerStatus {
    match raw {
        None | Some("Verified") => ServerStatus::Active,
        Some("Deprecated") => ServerStatus::Deprecated,
        Some(other) => {
            warn!(record = name, status = other, "unrecognized chain status, coercing to active");
            ServerStatus::Active
        }
    }
}

/// Split "io.github.acme/weather" into (provider, server part). Names with
/// no slash have no provider.
fn split_namespace(name: &str) -> (Option<&str>, &str) {
    match name.split_once('/') {
        Some((provider, rest)) => (Some(provider), rest),
        None => (None, name),
    }
}

/// "weather-api_v2" -> "Weather Api V2".
fn display_name(server_part: &str) -> String {
    server_part
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// "io.github.acme" -> "acme.github.io". Providers without dots pass
/// through unchanged.
fn domain_from_reverse_dns(provider: &str) -> String {
    if provider.contains('.') {
        provider.rsplit('.').collect::<Vec<_>>().join(".")
    } else {
        provider.to_string()
    }
}
