// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compute-cluster job queries

mod noop;

pub use noop::NoOpJobSource;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJobSource, JobCall};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resource kind passed to [`JobSource::delete_job`] for test jobs
pub const JOB_KIND: &str = "Job";

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("job request failed: {0}")]
    Request(String),
}

/// Pod completion counts for a job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub succeeded: u32,
    pub failed: u32,
    /// Pods the job must complete
    pub expected: u32,
}

impl JobStatus {
    /// All pods succeeded, or enough failed that the job cannot succeed
    pub fn is_done(&self) -> bool {
        self.succeeded >= self.expected || self.failed >= self.expected
    }

    pub fn is_successful(&self) -> bool {
        self.succeeded > 0
    }
}

/// Label selector matching the pods of a job
pub fn job_selector(job_name: &str) -> String {
    format!("job-name={job_name}")
}

#[async_trait]
pub trait JobSource: Clone + Send + Sync + 'static {
    async fn get_job_status(&self, name: &str, namespace: &str) -> Result<JobStatus, JobError>;

    async fn get_logs(&self, namespace: &str, selector: &str) -> Result<String, JobError>;

    async fn delete_job(&self, name: &str, namespace: &str, kind: &str) -> Result<(), JobError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
