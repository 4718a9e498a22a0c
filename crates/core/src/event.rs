// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events emitted to the pipeline engine
//!
//! Every event carries the run it belongs to. The reconciler emits
//! application and test events; the execution agent emits failures.

use crate::command::CommandMetadata;
use crate::health::{HealthStatus, ResourceStatus, SyncStatus};
use crate::watch::WatchKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub org: String,
    pub team: String,
    pub pipeline: String,
    pub pipeline_uvn: String,
    pub step: String,
}

impl From<&CommandMetadata> for EventMetadata {
    fn from(meta: &CommandMetadata) -> Self {
        Self {
            org: meta.org.clone(),
            team: meta.team.clone(),
            pipeline: meta.pipeline.clone(),
            pipeline_uvn: meta.pipeline_uvn.clone(),
            step: meta.step.clone(),
        }
    }
}

impl From<&WatchKey> for EventMetadata {
    fn from(key: &WatchKey) -> Self {
        Self {
            org: key.org.clone(),
            team: key.team.clone(),
            pipeline: key.pipeline.clone(),
            pipeline_uvn: key.pipeline_uvn.clone(),
            step: key.step.clone(),
        }
    }
}

/// An application reached a reportable state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationEvent {
    pub meta: EventMetadata,
    pub health: HealthStatus,
    pub sync: SyncStatus,
    #[serde(default)]
    pub resources: Vec<ResourceStatus>,
    pub app_name: String,
    pub app_namespace: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub revision_hash: String,
}

/// A test job or plugin task finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEvent {
    pub meta: EventMetadata,
    pub successful: bool,
    #[serde(default)]
    pub log: String,
    pub test_name: String,
    #[serde(default)]
    pub test_number: i32,
}

impl TestEvent {
    pub fn for_key(key: &WatchKey, successful: bool, log: impl Into<String>) -> Self {
        Self {
            meta: EventMetadata::from(key),
            successful,
            log: log.into(),
            test_name: key.name.clone(),
            test_number: key.test_number,
        }
    }
}

/// A command could not be carried out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEvent {
    pub meta: EventMetadata,
    pub status_code: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventInfo {
    Application(ApplicationEvent),
    Test(TestEvent),
    Failure(FailureEvent),
}

impl EventInfo {
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            EventInfo::Application(e) => &e.meta,
            EventInfo::Test(e) => &e.meta,
            EventInfo::Failure(e) => &e.meta,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventInfo::Application(_) => "application",
            EventInfo::Test(_) => "test",
            EventInfo::Failure(_) => "failure",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
