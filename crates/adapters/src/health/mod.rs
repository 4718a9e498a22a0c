// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health snapshot sources

mod metrics;

pub use metrics::{parse_metrics, MetricsHealthSource};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHealthSource;

use async_trait::async_trait;
use keel_core::AppSnapshot;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("snapshot request failed: {0}")]
    Request(String),
}

/// Source of the controller's view of every application
#[async_trait]
pub trait HealthSource: Clone + Send + Sync + 'static {
    async fn fetch_snapshot(&self) -> Result<Vec<AppSnapshot>, HealthError>;
}
