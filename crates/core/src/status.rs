// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whole-pipeline status, derived from step logs and never stored

use crate::log::{DeploymentLog, Log, LogStatus};
use serde::{Deserialize, Serialize};

/// Step name used for failures that are not tied to a step
pub const UNKNOWN_STEP: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedStep {
    pub step: String,
    pub deployment_failed: bool,
    pub broken_test: String,
    pub broken_test_log: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub progressing_steps: Vec<String>,
    pub stable: bool,
    pub complete: bool,
    pub cancelled: bool,
    pub failed_steps: Vec<FailedStep>,
}

impl Default for PipelineStatus {
    fn default() -> Self {
        Self {
            progressing_steps: Vec::new(),
            stable: true,
            complete: true,
            cancelled: false,
            failed_steps: Vec::new(),
        }
    }
}

impl PipelineStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_incomplete(&mut self) {
        self.complete = false;
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
        self.complete = false;
    }

    pub fn add_progressing_step(&mut self, step: impl Into<String>) {
        self.progressing_steps.push(step.into());
    }

    /// Fold the most recent log of a step into stability.
    ///
    /// A failed deployment is unstable. A remediation is unstable unless its
    /// status is a failure.
    pub fn observe_stability(&mut self, log: &Log) {
        match log {
            Log::Deployment(l) if l.status == LogStatus::Failure => self.stable = false,
            Log::Remediation(l) if l.status != LogStatus::Failure => self.stable = false,
            _ => {}
        }
    }

    /// Fold the most recent deployment log of a step into completeness
    pub fn record_deployment_outcome(&mut self, log: &DeploymentLog, step: &str) {
        if log.status == LogStatus::Failure {
            self.complete = false;
            self.add_failed_step(log, step);
        }
    }

    pub fn add_failed_step(&mut self, log: &DeploymentLog, step: &str) {
        self.failed_steps.push(FailedStep {
            step: step.to_string(),
            deployment_failed: !log.deployment_complete,
            broken_test: log.broken_test.clone(),
            broken_test_log: log.broken_test_log.clone(),
        });
    }

    /// Run-level processing errors, reported under [`UNKNOWN_STEP`]
    pub fn add_processing_errors(&mut self, errors: &[String]) {
        for (idx, error) in errors.iter().enumerate() {
            self.failed_steps.push(FailedStep {
                step: UNKNOWN_STEP.to_string(),
                deployment_failed: true,
                broken_test: format!("Processing error {idx}"),
                broken_test_log: error.clone(),
            });
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
