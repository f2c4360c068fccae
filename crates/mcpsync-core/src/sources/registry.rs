//! Fetcher for the official MCP registry.
//!
//! The registry serves `GET /v0/servers` pages shaped
//! `{servers: [...], metadata: {<cursor-field>: token}}`. The cursor field
//! name differs between registry deployments (`next_cursor` vs
//! `nextCursor`), so it is configuration here - assuming one spelling makes
//! pagination silently stop after the first page on the other deployment.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::{RawServerRecord, RegistryServer};
use crate::error::FetchError;
use crate::sources::{SourceFetcher, SourceId};

/// Default cursor field emitted by current registry deployments.
pub const DEFAULT_CURSOR_FIELD: &str = "next_cursor";

/// Configuration for the registry fetcher.
#[derive(Debug, Clone)]
pub struct RegistryFetcherConfig {
    /// Base URL without the `/v0/servers` suffix.
    pub base_url: String,
    /// Name of the pagination token field inside the page `metadata`.
    pub cursor_field: String,
    /// Optional `version` query selector (e.g. "latest").
    pub version_filter: Option<String>,
}

impl RegistryFetcherConfig {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            cursor_field: DEFAULT_CURSOR_FIELD.to_string(),
            version_filter: None,
        }
    }
}

/// One page of the servers listing.
#[derive(Debug, Deserialize)]
struct ServersPage {
    #[serde(default)]
    servers: Vec<RegistryServer>,
    /// Read as a raw map so the cursor field name stays configuration.
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

/// Paginating fetcher for the official registry.
pub struct RegistryFetcher {
    config: RegistryFetcherConfig,
    client: reqwest::Client,
}

impl RegistryFetcher {
    pub fn new(config: RegistryFetcherConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("McpSync/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self { config, client }
    }

    fn servers_url(&self) -> String {
        format!("{}/v0/servers", self.config.base_url.trim_end_matches('/'))
    }

    /// Pull the pagination token for the next page, if any. Absent, null,
    /// or empty tokens all mean "no further pages".
    fn next_cursor(&self, page: &ServersPage) -> Option<String> {
        page.metadata
            .get(&self.config.cursor_field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[async_trait]
impl SourceFetcher for RegistryFetcher {
    fn source(&self) -> SourceId {
        SourceId::Registry
    }

    async fn fetch(
        &self,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawServerRecord>, FetchError> {
        let url = self.servers_url();
        let mut servers = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        match watermark {
            Some(since) => info!(%since, "fetching registry servers updated since watermark"),
            None => info!("fetching all registry servers (full sync)"),
        }

        loop {
            let mut request = self.client.get(&url).header("Accept", "application/json");

            if let Some(ref token) = cursor {
                request = request.query(&[("cursor", token.as_str())]);
            }
            if let Some(since) = watermark {
                request = request.query(&[(
                    "updated_since",
                    since.to_rfc3339_opts(SecondsFormat::Secs, true),
                )]);
            }
            if let Some(ref version) = self.config.version_filter {
                request = request.query(&[("version", version.as_str())]);
            }

            let response = request.send().await.map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

            let status = response.status();
            let body = response.text().await.map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

            if !status.is_success() {
                return Err(FetchError::UpstreamStatus {
                    url,
                    status: status.as_u16(),
                    body,
                });
            }

            let page: ServersPage =
                serde_json::from_str(&body).map_err(|source| FetchError::Decode {
                    url: url.clone(),
                    source,
                })?;

            pages += 1;
            cursor = self.next_cursor(&page);
            debug!(
                page = pages,
                received = page.servers.len(),
                has_more = cursor.is_some(),
                "fetched registry page"
            );
            servers.extend(page.servers);

            if cursor.is_none() {
                break;
            }
        }

        info!(total = servers.len(), pages, "finished registry fetch");

        Ok(servers.into_iter().map(RawServerRecord::Registry).collect())
    }
}
