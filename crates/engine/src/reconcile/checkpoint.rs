// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch map persistence across restarts

use crate::records::{decode, decode_opt, encode};
use crate::EngineError;
use keel_core::{keys, WatchId, WatchKey};
use keel_storage::DurableStore;
use serde_json::Value;
use std::collections::HashMap;

/// Keys still awaiting completion, in id order. Keys that already emitted
/// their completion event are left out.
pub fn pending_keys(watched: &HashMap<WatchId, WatchKey>) -> Vec<WatchKey> {
    let mut pending: Vec<WatchKey> = watched
        .values()
        .filter(|key| !key.generated_completion_event)
        .cloned()
        .collect();
    pending.sort_by_key(|key| key.id());
    pending
}

/// Persist the pending keys of `watched`; returns how many were written
pub fn save_checkpoint<S: DurableStore>(
    store: &S,
    cluster: &str,
    watched: &HashMap<WatchId, WatchKey>,
) -> Result<usize, EngineError> {
    let pending = pending_keys(watched);
    write_checkpoint(store, cluster, &pending)?;
    Ok(pending.len())
}

pub(crate) fn write_checkpoint<S: DurableStore>(
    store: &S,
    cluster: &str,
    pending: &[WatchKey],
) -> Result<(), EngineError> {
    let key = keys::watch_checkpoint(cluster);
    store.set(&key, encode(&key, &pending)?)?;
    Ok(())
}

/// Entries that no longer decode are logged and skipped
pub fn load_checkpoint<S: DurableStore>(
    store: &S,
    cluster: &str,
) -> Result<HashMap<WatchId, WatchKey>, EngineError> {
    let key = keys::watch_checkpoint(cluster);
    let saved: Vec<Value> = decode_opt(&key, store.get(&key)?)?.unwrap_or_default();
    let mut restored = HashMap::new();
    for entry in saved {
        match decode::<WatchKey>(&key, entry) {
            Ok(watch) => {
                restored.insert(watch.id(), watch);
            }
            Err(e) => tracing::warn!(cluster, error = %e, "dropping undecodable checkpoint entry"),
        }
    }
    Ok(restored)
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
