//! De-duplication of raw records by logical name.
//!
//! The registry returns one row per published version, so a single fetch
//! can carry the same server name many times. This runs before the
//! transformer so only one row per name is ever mapped and upserted.

use std::collections::HashMap;

use crate::domain::{parse_timestamp, RawServerRecord};

/// Collapse duplicate logical names, keeping the preferred record per name.
///
/// Tie-break, evaluated in order until one side wins:
/// 1. the record flagged `is_latest` beats one that is not;
/// 2. otherwise the greater parseable `updated_at` wins;
/// 3. otherwise the first record encountered stays (stable fallback: bad
///    dates must not crash a run, and they decide nothing).
///
/// Output holds exactly one entry per distinct name, in first-encounter
/// order. Nameless records pass through untouched so the transformer can
/// reject them with its own diagnostic.
pub fn dedup(records: Vec<RawServerRecord>) -> Vec<RawServerRecord> {
    let mut index_by_name: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<RawServerRecord> = Vec::with_capacity(records.len());

    for record in records {
        let Some(name) = record.logical_name().map(str::to_owned) else {
            kept.push(record);
            continue;
        };

        match index_by_name.get(&name) {
            None => {
                index_by_name.insert(name, kept.len());
                kept.push(record);
            }
            Some(&idx) => {
                if prefer_incoming(&kept[idx], &record) {
                    kept[idx] = record;
                }
            }
        }
    }

    kept
}

/// Whether `incoming` should replace `existing` for the same name.
fn prefer_incoming(existing: &RawServerRecord, incoming: &RawServerRecord) -> bool {
    let existing_latest = existing.is_latest().unwrap_or(false);
    let incoming_latest = incoming.is_latest().unwrap_or(false);

    if incoming_latest != existing_latest {
        return incoming_latest;
    }

    match (
        parse_timestamp(existing.raw_updated_at()),
        parse_timestamp(incoming.raw_updated_at()),
    ) {
        (Some(existing_at), Some(incoming_at)) => incoming_at > existing_at,
        // Absent or unparsable on either side: the earlier record stays.
        _ => false,
    }
}
