// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! keel-core: data model for the Keel pipeline orchestrator
//!
//! This crate provides:
//! - Commands, notifications and deliveries exchanged with execution agents
//! - Watch keys and the events emitted when they complete
//! - Step audit logs and the derived pipeline status
//! - The step dependency graph
//! - Durable store key layout

pub mod cluster;
pub mod command;
pub mod event;
pub mod graph;
pub mod health;
pub mod id;
pub mod keys;
pub mod log;
pub mod metadata;
pub mod run;
pub mod status;
pub mod watch;

pub use cluster::{ClusterRecord, NoDeploy, NoDeployScope};
pub use command::{
    audit_label, CommandEvent, CommandMetadata, CommandPacket, Delivery, DeployKind,
    Notification, NotificationPacket, NotificationRequest, ResourceGvk, FINAL_TRY_THRESHOLD,
    RESULT_NOT_FOUND,
};
pub use event::{ApplicationEvent, EventInfo, EventMetadata, FailureEvent, TestEvent};
pub use graph::{GraphError, PipelineGraph, StepData, TestDef, ROOT_STEP};
pub use health::{AppSnapshot, HealthStatus, OperationStatus, ResourceStatus, SyncStatus};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use log::{DeploymentLog, Log, LogStatus, RemediationLog};
pub use metadata::{SourceCoordinates, StepMetadata};
pub use run::PipelineRun;
pub use status::{FailedStep, PipelineStatus, UNKNOWN_STEP};
pub use watch::{WatchId, WatchKey, WatchKind, WatchMessage};
