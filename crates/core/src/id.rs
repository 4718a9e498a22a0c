// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier generation for notification requests and pipeline runs
//!
//! Notification request ids correlate an admin action with the result an
//! agent posts back. Run ids become the UVN shared by every step log of one
//! pipeline run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of fresh identifiers
pub trait IdGen: Clone + Send + Sync + 'static {
    /// Id correlating a notification with its posted result
    fn request_id(&self) -> String;

    /// Unique version number for a new pipeline run
    fn run_id(&self) -> String;
}

/// Random v4 UUIDs, used by the daemon
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn request_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn run_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Deterministic ids for tests: `req-1`, `run-2`, ...
///
/// Both kinds draw from one shared counter so ids stay unique across kinds.
#[derive(Clone, Debug, Default)]
pub struct SequentialIdGen {
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl IdGen for SequentialIdGen {
    fn request_id(&self) -> String {
        format!("req-{}", self.bump())
    }

    fn run_id(&self) -> String {
        format!("run-{}", self.bump())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
