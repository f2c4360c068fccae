//! Repository trait for canonical server records.
//!
//! Defines the storage interface without specifying the implementation
//! (SQLite, in-memory, etc.). The reconciler is the only writer; reads
//! exist for watermark resolution and status reporting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ServerRecord;

/// Result type for repository operations
pub type RepoResult<T> = anyhow::Result<T>;

/// Keyed access to the canonical server table.
#[async_trait]
pub trait ServerRecordRepository: Send + Sync {
    /// Most recent `updated_at` among rows carrying `namespace` in `meta` -
    /// the incremental-sync watermark for that source. `None` when the
    /// source has never written a row.
    async fn latest_updated_at(&self, namespace: &str) -> RepoResult<Option<DateTime<Utc>>>;

    /// Insert-or-replace every record, keyed by `id`, in one transaction.
    /// Whole-row replace semantics for every column except `meta`, which is
    /// merged per namespace so one source's write cannot erase another
    /// source's blob. Returns the number of rows written.
    async fn upsert_batch(&self, records: &[ServerRecord]) -> RepoResult<usize>;

    /// Get a record by id.
    async fn get(&self, id: &str) -> RepoResult<Option<ServerRecord>>;

    /// Total number of stored records.
    async fn count(&self) -> RepoResult<u64>;

    /// Number of rows carrying `namespace` in `meta`.
    async fn count_for_namespace(&self, namespace: &str) -> RepoResult<u64>;

    /// The most recently updated row, for status reporting.
    async fn latest_record(&self) -> RepoResult<Option<ServerRecord>>;
}
