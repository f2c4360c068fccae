//! Run-aborting error taxonomy.
//!
//! Per-record problems never appear here: the transformer skips bad records
//! and the run continues. Everything in this module aborts the whole run
//! with nothing committed; retry belongs to the outer scheduler.

use thiserror::Error;

/// A fetch against an upstream source failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never completed: DNS, connect, TLS, or timeout.
    #[error("transport failure contacting {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with a non-success status.
    #[error("upstream returned HTTP {status} for {url}: {body}")]
    UpstreamStatus { url: String, status: u16, body: String },

    /// The delegated fetch process was reachable, ran, and reported a data
    /// error of its own. Distinct from `Transport`: the delegation hop
    /// worked, the chain read behind it did not.
    #[error("delegate reported failure (HTTP {status}): {detail}")]
    Delegate { status: u16, detail: String },

    /// The response body was not the structured shape this source promises.
    #[error("failed to decode payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A reconcile run failed before a complete batch could be committed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("store operation failed: {0}")]
    Store(#[source] anyhow::Error),
}

impl SyncError {
    /// Short machine-readable tag for structured failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Fetch(FetchError::Transport { .. }) => "fetch_transport",
            SyncError::Fetch(FetchError::UpstreamStatus { .. }) => "fetch_status",
            SyncError::Fetch(FetchError::Delegate { .. }) => "delegate",
            SyncError::Fetch(FetchError::Decode { .. }) => "decode",
            SyncError::Store(_) => "store",
        }
    }
}
