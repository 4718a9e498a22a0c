// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch keys: entities the reconciler polls until they complete

use crate::command::CommandMetadata;
use crate::health::{HealthStatus, SyncStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a watched entity is resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WatchKind {
    /// A controller-managed application
    App,
    /// A test job on the compute cluster
    TestJob,
    /// A task owned by a named plugin
    PluginTask { plugin: String },
}

impl WatchKind {
    pub fn is_one_shot(&self) -> bool {
        !matches!(self, WatchKind::App)
    }
}

/// Identity of a watch key; later keys with the same identity replace earlier ones
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WatchId {
    pub team: String,
    pub pipeline: String,
    pub step: String,
    pub name: String,
    pub namespace: String,
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.team, self.pipeline, self.step, self.namespace, self.name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchKey {
    pub kind: WatchKind,
    pub org: String,
    pub team: String,
    pub pipeline: String,
    pub pipeline_uvn: String,
    pub step: String,
    #[serde(default)]
    pub test_number: i32,
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub health: HealthStatus,
    #[serde(default)]
    pub sync: SyncStatus,
    /// Set once the key's completion event has been emitted
    #[serde(default)]
    pub generated_completion_event: bool,
}

impl WatchKey {
    pub fn new(
        kind: WatchKind,
        meta: &CommandMetadata,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            org: meta.org.clone(),
            team: meta.team.clone(),
            pipeline: meta.pipeline.clone(),
            pipeline_uvn: meta.pipeline_uvn.clone(),
            step: meta.step.clone(),
            test_number: 0,
            name: name.into(),
            namespace: namespace.into(),
            health: HealthStatus::Missing,
            sync: SyncStatus::OutOfSync,
            generated_completion_event: false,
        }
    }

    pub fn with_test_number(mut self, test_number: i32) -> Self {
        self.test_number = test_number;
        self
    }

    pub fn id(&self) -> WatchId {
        WatchId {
            team: self.team.clone(),
            pipeline: self.pipeline.clone(),
            step: self.step.clone(),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// Message on the watch intake; keys are buffered until `EndOfBatch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchMessage {
    Key(WatchKey),
    EndOfBatch,
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
