//! Fetcher for the blockchain-backed registry.
//!
//! The chain itself is not read from here. A sibling delegate process holds
//! the chain client; this fetcher POSTs to it with the shared secret and
//! receives a plain JSON array of raw server objects. That indirection adds
//! a second failure domain: reaching the delegate can fail independently of
//! the chain read behind it, and the two must stay distinguishable
//! (`FetchError::Transport` vs `FetchError::Delegate`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::{ChainServer, RawServerRecord};
use crate::error::FetchError;
use crate::sources::{SourceFetcher, SourceId};

/// Chain reads are materially slower than a plain HTTP GET; the delegate
/// gets a correspondingly larger budget.
const DELEGATE_TIMEOUT: Duration = Duration::from_secs(300);

/// Error body shape the delegate emits on failure.
#[derive(Debug, Deserialize)]
struct DelegateErrorBody {
    error: Option<String>,
    details: Option<String>,
}

/// Fetcher that delegates the chain read to a sibling process.
pub struct ChainFetcher {
    delegate_base_url: String,
    shared_secret: String,
    client: reqwest::Client,
}

impl ChainFetcher {
    pub fn new(delegate_base_url: String, shared_secret: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DELEGATE_TIMEOUT)
            .user_agent(concat!("McpSync/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            delegate_base_url,
            shared_secret,
            client,
        }
    }

    fn delegate_url(&self) -> String {
        format!(
            "{}/fetch-chain-data",
            self.delegate_base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl SourceFetcher for ChainFetcher {
    fn source(&self) -> SourceId {
        SourceId::Chain
    }

    /// The chain source exposes no update timestamps, so there is nothing
    /// to filter by; every run fetches the full listing.
    fn supports_incremental(&self) -> bool {
        false
    }

    async fn fetch(
        &self,
        _watermark: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawServerRecord>, FetchError> {
        let url = self.delegate_url();

        info!(%url, "requesting chain data from delegate");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.shared_secret))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            // The delegate was reachable and answered; this is its own
            // reported failure, not a transport problem.
            let detail = serde_json::from_str::<DelegateErrorBody>(&body)
                .ok()
                .and_then(|b| match (b.error, b.details) {
                    (Some(error), Some(details)) => Some(format!("{}: {}", error, details)),
                    (Some(error), None) => Some(error),
                    (None, Some(details)) => Some(details),
                    (None, None) => None,
                })
                .unwrap_or(body);

            return Err(FetchError::Delegate {
                status: status.as_u16(),
                detail,
            });
        }

        let servers: Vec<ChainServer> =
            serde_json::from_str(&body).map_err(|source| FetchError::Decode {
                url: url.clone(),
                source,
            })?;

        debug!(count = servers.len(), "delegate returned chain servers");
        info!(total = servers.len(), "finished chain fetch");

        Ok(servers.into_iter().map(RawServerRecord::Chain).collect())
    }
}
