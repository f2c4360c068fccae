//! The reconciler: one sync run from watermark to upsert.
//!
//! A run walks `FetchingWatermark -> Fetching -> Transforming -> Upserting`
//! and ends in `Done` or `Failed`. Stages are sequential - the dataset is
//! hundreds to low thousands of rows, which does not justify fan-out, and
//! the upstreams rate-limit through pagination anyway. Nothing is committed
//! unless the whole batch commits.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::repository::ServerRecordRepository;
use crate::sources::SourceFetcher;
use crate::sync::{dedup, transform};

/// Stages of a reconcile run, for logging and failure attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    FetchingWatermark,
    Fetching,
    Transforming,
    Upserting,
    Done,
    Failed,
}

/// Per-run options, passed explicitly from the trigger boundary. Nothing
/// below this type reads process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Ignore the stored watermark and fetch everything.
    pub force_full: bool,
}

/// What a completed run did.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub source: String,
    /// True when no watermark narrowed the fetch.
    pub full_sync: bool,
    /// Raw records received from the source, across all pages.
    pub fetched: usize,
    /// Records remaining after de-duplication.
    pub unique: usize,
    /// Unique records the transformer rejected (skipped, not fatal).
    pub rejected: usize,
    /// Rows written to the store.
    pub written: usize,
    /// The watermark the fetch was narrowed to, if any.
    pub watermark: Option<DateTime<Utc>>,
}

/// Orchestrates fetch -> dedup -> transform -> upsert for one source.
pub struct Reconciler {
    fetcher: Box<dyn SourceFetcher>,
    repository: Arc<dyn ServerRecordRepository>,
}

impl Reconciler {
    pub fn new(fetcher: Box<dyn SourceFetcher>, repository: Arc<dyn ServerRecordRepository>) -> Self {
        Self { fetcher, repository }
    }

    /// Run one full reconcile cycle. Per-record problems are skipped inside
    /// the transform stage; any returned error means nothing was written.
    pub async fn run(&self, options: SyncOptions) -> Result<SyncOutcome, SyncError> {
        let source = self.fetcher.source();
        let namespace = source.meta_namespace();
        let mut state = SyncState::Idle;

        // --- FetchingWatermark ---
        self.advance(&mut state, SyncState::FetchingWatermark);
        let watermark = if options.force_full {
            info!(%source, "full resync forced, ignoring stored watermark");
            None
        } else if !self.fetcher.supports_incremental() {
            debug!(%source, "source cannot filter by update time, full sync");
            None
        } else {
            match self.repository.latest_updated_at(namespace).await {
                Ok(watermark) => watermark,
                Err(e) => {
                    self.advance(&mut state, SyncState::Failed);
                    return Err(SyncError::Store(e));
                }
            }
        };

        // --- Fetching ---
        self.advance(&mut state, SyncState::Fetching);
        let raw = match self.fetcher.fetch(watermark).await {
            Ok(raw) => raw,
            Err(e) => {
                self.advance(&mut state, SyncState::Failed);
                return Err(e.into());
            }
        };
        let fetched = raw.len();

        // --- Transforming ---
        // Dedup and transform are pure and fast; no cancellation point here.
        self.advance(&mut state, SyncState::Transforming);
        let now = Utc::now();
        let unique_records = dedup(raw);
        let unique = unique_records.len();

        let batch: Vec<_> = unique_records
            .iter()
            .filter_map(|record| transform(record, now))
            .collect();
        let rejected = unique - batch.len();

        if rejected > 0 {
            warn!(%source, rejected, "some records were rejected during transform");
        }

        // --- Upserting ---
        self.advance(&mut state, SyncState::Upserting);
        let written = if batch.is_empty() {
            // Zero survivors is a valid outcome; the store is not invoked.
            info!(%source, fetched, "empty batch after transform, skipping upsert");
            0
        } else {
            match self.repository.upsert_batch(&batch).await {
                Ok(written) => written,
                Err(e) => {
                    self.advance(&mut state, SyncState::Failed);
                    return Err(SyncError::Store(e));
                }
            }
        };

        self.advance(&mut state, SyncState::Done);
        info!(
            %source,
            fetched,
            unique,
            rejected,
            written,
            full_sync = watermark.is_none(),
            "sync run complete"
        );

        Ok(SyncOutcome {
            source: source.to_string(),
            full_sync: watermark.is_none(),
            fetched,
            unique,
            rejected,
            written,
            watermark,
        })
    }

    fn advance(&self, state: &mut SyncState, next: SyncState) {
        debug!(source = %self.fetcher.source(), from = ?state, to = ?next, "sync state transition");
        *state = next;
    }
}
