// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake event sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{EventSink, SinkError};
use async_trait::async_trait;
use keel_core::EventInfo;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeSinkState {
    events: Vec<EventInfo>,
    attempts: u32,
    failures_left: u32,
}

/// Fake sink recording delivered events
#[derive(Clone, Default)]
pub struct FakeEventSink {
    inner: Arc<Mutex<FakeSinkState>>,
}

impl FakeEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successfully delivered events, oldest first
    pub fn events(&self) -> Vec<EventInfo> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .events
            .clone()
    }

    /// Delivery attempts, including failed ones
    pub fn attempts(&self) -> u32 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).attempts
    }

    /// Fail the next `n` deliveries
    pub fn fail_next(&self, n: u32) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).failures_left = n;
    }
}

#[async_trait]
impl EventSink for FakeEventSink {
    async fn emit(&self, event: &EventInfo) -> Result<(), SinkError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.attempts += 1;
        if inner.failures_left > 0 {
            inner.failures_left -= 1;
            return Err(SinkError::Delivery("injected failure".to_string()));
        }
        inner.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
