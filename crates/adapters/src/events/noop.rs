// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op event sink for when no pipeline engine is configured.

use super::{EventSink, SinkError};
use async_trait::async_trait;
use keel_core::EventInfo;

/// Event sink that accepts and discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpEventSink;

impl NoOpEventSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: &EventInfo) -> Result<(), SinkError> {
        Ok(())
    }
}
