//! Upstream source fetchers.
//!
//! Each source is a strategy behind the `SourceFetcher` trait so the
//! reconciler stays source-agnostic: the official registry is a paginated
//! HTTP API, the chain registry is reached through a delegated fetch
//! process, and both yield the same tagged raw records.

pub mod chain;
pub mod registry;

pub use chain::ChainFetcher;
pub use registry::{RegistryFetcher, RegistryFetcherConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::RawServerRecord;
use crate::error::FetchError;

/// Upstream sources McpSync reconciles against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    /// The official MCP registry (paginated HTTP API).
    Registry,
    /// The blockchain-backed registry, read through the delegated fetch
    /// process.
    Chain,
}

impl SourceId {
    /// Namespace key this source owns inside `ServerRecord::meta`. Sources
    /// never write under each other's keys; together with the storage-layer
    /// meta merge this keeps concurrent cross-source syncs safe.
    pub fn meta_namespace(&self) -> &'static str {
        match self {
            SourceId::Registry => "com.mcpsync.source/registry",
            SourceId::Chain => "com.mcpsync.source/chain",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Registry => "registry",
            SourceId::Chain => "chain",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pluggable upstream data source.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Which upstream this fetcher talks to.
    fn source(&self) -> SourceId;

    /// Whether this source can filter by update time. When false, the
    /// reconciler never resolves or forwards a watermark and every run is a
    /// full sync.
    fn supports_incremental(&self) -> bool {
        true
    }

    /// Retrieve all raw records, optionally narrowed to those updated at or
    /// after `watermark`.
    async fn fetch(
        &self,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawServerRecord>, FetchError>;
}
