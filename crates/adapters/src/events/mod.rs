// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event sinks: where completion and failure events are delivered

mod http;
mod noop;

pub use self::http::HttpEventSink;
pub use noop::NoOpEventSink;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEventSink;

use async_trait::async_trait;
use keel_core::EventInfo;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("event rejected: {0}")]
    Rejected(String),
    #[error("event delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait EventSink: Clone + Send + Sync + 'static {
    async fn emit(&self, event: &EventInfo) -> Result<(), SinkError>;
}
