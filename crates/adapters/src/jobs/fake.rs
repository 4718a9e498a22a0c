// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake job source for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{JobError, JobSource, JobStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Recorded job call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCall {
    Status { name: String, namespace: String },
    Logs { namespace: String, selector: String },
    Delete { name: String, namespace: String, kind: String },
}

#[derive(Default)]
struct FakeJobState {
    statuses: HashMap<(String, String), JobStatus>,
    logs: HashMap<String, String>,
    fail_logs: u32,
    fail_deletes: u32,
    calls: Vec<JobCall>,
}

/// Fake job source with scripted statuses and logs
#[derive(Clone, Default)]
pub struct FakeJobSource {
    inner: Arc<Mutex<FakeJobState>>,
}

impl FakeJobSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, name: &str, namespace: &str, status: JobStatus) {
        self.lock()
            .statuses
            .insert((name.to_string(), namespace.to_string()), status);
    }

    /// Logs returned for any selector in `namespace`
    pub fn set_logs(&self, namespace: &str, logs: &str) {
        self.lock()
            .logs
            .insert(namespace.to_string(), logs.to_string());
    }

    pub fn fail_next_logs(&self, n: u32) {
        self.lock().fail_logs = n;
    }

    pub fn fail_next_deletes(&self, n: u32) {
        self.lock().fail_deletes = n;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<JobCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeJobState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl JobSource for FakeJobSource {
    async fn get_job_status(&self, name: &str, namespace: &str) -> Result<JobStatus, JobError> {
        let mut inner = self.lock();
        inner.calls.push(JobCall::Status {
            name: name.to_string(),
            namespace: namespace.to_string(),
        });
        inner
            .statuses
            .get(&(name.to_string(), namespace.to_string()))
            .copied()
            .ok_or_else(|| JobError::NotFound(name.to_string()))
    }

    async fn get_logs(&self, namespace: &str, selector: &str) -> Result<String, JobError> {
        let mut inner = self.lock();
        inner.calls.push(JobCall::Logs {
            namespace: namespace.to_string(),
            selector: selector.to_string(),
        });
        if inner.fail_logs > 0 {
            inner.fail_logs -= 1;
            return Err(JobError::Request("injected log failure".to_string()));
        }
        Ok(inner.logs.get(namespace).cloned().unwrap_or_default())
    }

    async fn delete_job(&self, name: &str, namespace: &str, kind: &str) -> Result<(), JobError> {
        let mut inner = self.lock();
        inner.calls.push(JobCall::Delete {
            name: name.to_string(),
            namespace: namespace.to_string(),
            kind: kind.to_string(),
        });
        if inner.fail_deletes > 0 {
            inner.fail_deletes -= 1;
            return Err(JobError::Request("injected delete failure".to_string()));
        }
        inner
            .statuses
            .remove(&(name.to_string(), namespace.to_string()));
        Ok(())
    }
}
