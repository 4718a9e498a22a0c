// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Keel orchestration engine
//!
//! Command queues and the execution agent that drains them, the
//! reconciliation loop that turns watched deployments into events, and the
//! audit history behind pipeline status.

pub mod agent;
mod audit;
mod clusters;
mod deployment;
mod error;
mod metadata;
mod notifications;
mod queue;
pub mod reconcile;
mod records;
mod runs;
mod status;

pub use agent::{AgentDeps, CommandOutcome, CommandProcessor, DispatchError, Processed};
pub use audit::{AuditLog, Located, PipelineRef, PAGE_SIZE};
pub use clusters::ClusterRegistry;
pub use deployment::{DeploymentLogs, PROCESSING_ERROR};
pub use error::EngineError;
pub use metadata::{source_from_manifest, MetadataHandler};
pub use notifications::{NotificationResults, WaitPolicy};
pub use queue::{CommandQueue, QueueDepth};
pub use reconcile::{ReconcileConfig, ReconcileDeps, ReconcileHandle};
pub use runs::PipelineRuns;
pub use status::{cancel_latest_pipeline, derive_status, LATEST};
