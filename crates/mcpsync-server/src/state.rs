//! Shared application state for the trigger service.

use std::sync::Arc;

use tokio::sync::Mutex;

use mcpsync_core::{ServerRecordRepository, ServiceConfig, SourceId};

/// Per-source in-flight guards.
///
/// Two different sources may sync concurrently (disjoint meta namespaces,
/// disjoint identity spaces), but two runs of the same source against the
/// same watermark are not safe. A held guard means a run is in flight;
/// `try_lock` failure turns into 409 at the handler.
pub struct SyncLocks {
    registry: Mutex<()>,
    chain: Mutex<()>,
}

impl SyncLocks {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(()),
            chain: Mutex::new(()),
        }
    }

    pub fn for_source(&self, source: SourceId) -> &Mutex<()> {
        match source {
            SourceId::Registry => &self.registry,
            SourceId::Chain => &self.chain,
        }
    }
}

impl Default for SyncLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// App state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub repository: Arc<dyn ServerRecordRepository>,
    pub sync_locks: Arc<SyncLocks>,
}

impl AppState {
    pub fn new(config: ServiceConfig, repository: Arc<dyn ServerRecordRepository>) -> Self {
        Self {
            config: Arc::new(config),
            repository,
            sync_locks: Arc::new(SyncLocks::new()),
        }
    }
}
