// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-step audit log entries
//!
//! Each step keeps a most-recent-first list of [`Log`] entries. A run
//! starts with a deployment log at instance 0; every rollback pushes a new
//! deployment log with the next instance, and remediation attempts push
//! remediation logs in between.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogStatus {
    #[default]
    Progressing,
    Success,
    Failure,
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentLog {
    pub pipeline_uvn: String,
    /// Run whose deployment this log rolled back to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_uvn: Option<String>,
    #[serde(default)]
    pub version_instance: u32,
    pub status: LogStatus,
    #[serde(default)]
    pub deployment_complete: bool,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub revision_hash: String,
    #[serde(default)]
    pub git_commit: String,
    #[serde(default)]
    pub broken_test: String,
    #[serde(default)]
    pub broken_test_log: String,
}

impl DeploymentLog {
    /// Fresh instance-0 log for a run that is just starting on a step
    pub fn start(pipeline_uvn: impl Into<String>, git_commit: impl Into<String>) -> Self {
        Self {
            pipeline_uvn: pipeline_uvn.into(),
            git_commit: git_commit.into(),
            ..Self::default()
        }
    }

    /// Placeholder recording that a run was cancelled before reaching the step
    pub fn cancelled(pipeline_uvn: impl Into<String>) -> Self {
        Self {
            pipeline_uvn: pipeline_uvn.into(),
            status: LogStatus::Cancelled,
            ..Self::default()
        }
    }

    pub fn has_broken_test(&self) -> bool {
        !self.broken_test.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationLog {
    pub pipeline_uvn: String,
    #[serde(default)]
    pub version_instance: u32,
    #[serde(default)]
    pub unhealthy_resources: Vec<String>,
    pub status: LogStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Log {
    Deployment(DeploymentLog),
    Remediation(RemediationLog),
}

impl Log {
    pub fn pipeline_uvn(&self) -> &str {
        match self {
            Log::Deployment(l) => &l.pipeline_uvn,
            Log::Remediation(l) => &l.pipeline_uvn,
        }
    }

    pub fn version_instance(&self) -> u32 {
        match self {
            Log::Deployment(l) => l.version_instance,
            Log::Remediation(l) => l.version_instance,
        }
    }

    pub fn status(&self) -> LogStatus {
        match self {
            Log::Deployment(l) => l.status,
            Log::Remediation(l) => l.status,
        }
    }

    pub fn set_status(&mut self, status: LogStatus) {
        match self {
            Log::Deployment(l) => l.status = status,
            Log::Remediation(l) => l.status = status,
        }
    }

    pub fn as_deployment(&self) -> Option<&DeploymentLog> {
        match self {
            Log::Deployment(l) => Some(l),
            Log::Remediation(_) => None,
        }
    }

    pub fn as_remediation(&self) -> Option<&RemediationLog> {
        match self {
            Log::Remediation(l) => Some(l),
            Log::Deployment(_) => None,
        }
    }
}

impl From<DeploymentLog> for Log {
    fn from(log: DeploymentLog) -> Self {
        Log::Deployment(log)
    }
}

impl From<RemediationLog> for Log {
    fn from(log: RemediationLog) -> Self {
        Log::Remediation(log)
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
