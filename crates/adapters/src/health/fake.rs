// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake health source for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{HealthError, HealthSource};
use async_trait::async_trait;
use keel_core::AppSnapshot;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeHealthState {
    snapshot: Vec<AppSnapshot>,
    failures_left: u32,
    fetches: u32,
}

/// Fake health source serving a settable snapshot
#[derive(Clone, Default)]
pub struct FakeHealthSource {
    inner: Arc<Mutex<FakeHealthState>>,
}

impl FakeHealthSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_snapshot(&self, snapshot: Vec<AppSnapshot>) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).snapshot = snapshot;
    }

    /// Fail the next `n` fetches
    pub fn fail_next(&self, n: u32) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).failures_left = n;
    }

    /// Number of fetch attempts so far
    pub fn fetches(&self) -> u32 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fetches
    }
}

#[async_trait]
impl HealthSource for FakeHealthSource {
    async fn fetch_snapshot(&self) -> Result<Vec<AppSnapshot>, HealthError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.fetches += 1;
        if inner.failures_left > 0 {
            inner.failures_left -= 1;
            return Err(HealthError::Request("injected failure".to_string()));
        }
        Ok(inner.snapshot.clone())
    }
}
