// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use keel_adapters::SinkError;
use keel_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("cluster not found: {org}/{cluster}")]
    ClusterNotFound { org: String, cluster: String },
    #[error("cluster already exists: {org}/{cluster}")]
    ClusterExists { org: String, cluster: String },
    #[error("step not found: {0}")]
    StepNotFound(String),
    #[error("run not found: {0}")]
    RunNotFound(String),
    #[error("step {0} has no deployment log")]
    NoDeploymentLog(String),
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
    #[error("step {0} has a broken test and cannot succeed")]
    BrokenTest(String),
    #[error("event delivery failed: {0}")]
    Sink(#[from] SinkError),
    #[error("corrupt record at {key}: {message}")]
    Corrupt { key: String, message: String },
}

impl EngineError {
    /// Errors caused by the caller's request rather than the engine
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            EngineError::ClusterNotFound { .. }
                | EngineError::ClusterExists { .. }
                | EngineError::StepNotFound(_)
                | EngineError::RunNotFound(_)
                | EngineError::NoDeploymentLog(_)
                | EngineError::InvalidManifest(_)
                | EngineError::BrokenTest(_)
        )
    }

    /// Optimistic transaction lost a race; the caller may retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_conflict())
    }
}
