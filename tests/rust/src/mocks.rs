//! Mock fetcher and repository implementations for reconciler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mcpsync_core::{
    FetchError, RawServerRecord, RepoResult, ServerRecord, ServerRecordRepository, SourceFetcher,
    SourceId,
};

/// Fetcher returning a fixed set of raw records, recording the watermark it
/// was asked to fetch with.
pub struct StaticFetcher {
    source: SourceId,
    records: Vec<RawServerRecord>,
    supports_incremental: bool,
    pub seen_watermarks: Mutex<Vec<Option<DateTime<Utc>>>>,
}

impl StaticFetcher {
    pub fn new(source: SourceId, records: Vec<RawServerRecord>) -> Self {
        Self {
            source,
            records,
            supports_incremental: true,
            seen_watermarks: Mutex::new(Vec::new()),
        }
    }

    pub fn without_incremental(mut self) -> Self {
        self.supports_incremental = false;
        self
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    fn source(&self) -> SourceId {
        self.source
    }

    fn supports_incremental(&self) -> bool {
        self.supports_incremental
    }

    async fn fetch(
        &self,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawServerRecord>, FetchError> {
        self.seen_watermarks.lock().unwrap().push(watermark);
        Ok(self.records.clone())
    }
}

/// Fetcher that always fails with an upstream status error.
pub struct FailingFetcher {
    source: SourceId,
}

impl FailingFetcher {
    pub fn new(source: SourceId) -> Self {
        Self { source }
    }
}

#[async_trait]
impl SourceFetcher for FailingFetcher {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn fetch(
        &self,
        _watermark: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawServerRecord>, FetchError> {
        Err(FetchError::UpstreamStatus {
            url: "https://registry.example.com/v0/servers".to_string(),
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

/// Repository recording every call, for asserting what the reconciler did
/// (and did not) touch.
#[derive(Default)]
pub struct RecordingRepository {
    /// Watermark handed back to the reconciler.
    pub watermark: Option<DateTime<Utc>>,
    /// When set, upserts fail with this message.
    pub fail_upserts_with: Option<String>,
    pub upsert_calls: AtomicUsize,
    pub last_batch: Mutex<Vec<ServerRecord>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watermark(watermark: DateTime<Utc>) -> Self {
        Self {
            watermark: Some(watermark),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_upserts_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn upsert_call_count(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerRecordRepository for RecordingRepository {
    async fn latest_updated_at(&self, _namespace: &str) -> RepoResult<Option<DateTime<Utc>>> {
        Ok(self.watermark)
    }

    async fn upsert_batch(&self, records: &[ServerRecord]) -> RepoResult<usize> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.fail_upserts_with {
            anyhow::bail!("{}", message);
        }

        *self.last_batch.lock().unwrap() = records.to_vec();
        Ok(records.len())
    }

    async fn get(&self, _id: &str) -> RepoResult<Option<ServerRecord>> {
        Ok(None)
    }

    async fn count(&self) -> RepoResult<u64> {
        Ok(self.last_batch.lock().unwrap().len() as u64)
    }

    async fn count_for_namespace(&self, _namespace: &str) -> RepoResult<u64> {
        Ok(0)
    }

    async fn latest_record(&self) -> RepoResult<Option<ServerRecord>> {
        Ok(None)
    }
}
