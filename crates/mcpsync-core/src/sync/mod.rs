//! The reconciliation pipeline: dedup -> transform -> upsert.
//!
//! `transform` and `dedup` are pure; all I/O lives in the fetchers and the
//! repository, orchestrated by the `Reconciler`.

mod dedup;
mod reconciler;
mod transform;

pub use dedup::dedup;
pub use reconciler::{Reconciler, SyncOptions, SyncOutcome, SyncState};
pub use transform::{deterministic_id, transform, SERVER_ID_NAMESPACE};
