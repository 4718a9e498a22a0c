// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the health source, compute-cluster jobs,
//! the deployment driver, task plugins and the event sink

pub mod deploy;
pub mod events;
pub mod health;
mod http;
pub mod jobs;
pub mod plugin;
pub mod traced;

pub use deploy::{DeployResult, DeploymentDriver, DriverError, HttpDriver, NoOpDeploymentDriver};
pub use events::{EventSink, HttpEventSink, NoOpEventSink, SinkError};
pub use health::{HealthError, HealthSource, MetricsHealthSource};
pub use jobs::{job_selector, JobError, JobSource, JobStatus, NoOpJobSource, JOB_KIND};
pub use plugin::{Plugin, PluginError, PluginTask, Plugins};
pub use traced::{TracedDeploymentDriver, TracedEventSink, TracedHealthSource, TracedJobSource};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use deploy::{DriverCall, FakeDeploymentDriver};
#[cfg(any(test, feature = "test-support"))]
pub use events::FakeEventSink;
#[cfg(any(test, feature = "test-support"))]
pub use health::FakeHealthSource;
#[cfg(any(test, feature = "test-support"))]
pub use jobs::{FakeJobSource, JobCall};
#[cfg(any(test, feature = "test-support"))]
pub use plugin::FakePlugin;
