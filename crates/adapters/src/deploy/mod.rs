// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment driver: applies manifests and drives the deployment controller

mod http;
mod noop;

pub use self::http::HttpDriver;
pub use noop::NoOpDeploymentDriver;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DriverCall, FakeDeploymentDriver};

use async_trait::async_trait;
use keel_core::{DeployKind, OperationStatus, ResourceGvk, ResourceStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Revision hash reported for resources that are not revisioned
pub const NOT_APPLICABLE: &str = "NotApplicable";

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver request failed: {0}")]
    Request(String),
    #[error("driver rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid driver response: {0}")]
    InvalidResponse(String),
}

impl DriverError {
    /// Whether the agent should hand the command back for another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, DriverError::Request(_))
    }
}

/// What a deploy, sync or rollback left running
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResult {
    pub app_name: String,
    pub namespace: String,
    #[serde(default)]
    pub revision_hash: String,
}

#[async_trait]
pub trait DeploymentDriver: Clone + Send + Sync + 'static {
    async fn deploy(
        &self,
        kind: &DeployKind,
        namespace: &str,
        payload: &str,
        revision_hash: &str,
    ) -> Result<DeployResult, DriverError>;

    /// Sync an existing application to its configured revision
    async fn sync(&self, app_name: &str) -> Result<DeployResult, DriverError>;

    async fn selective_sync(
        &self,
        app_name: &str,
        revision_hash: &str,
        resources: &[ResourceGvk],
    ) -> Result<DeployResult, DriverError>;

    async fn rollback(&self, app_name: &str, revision_hash: &str)
        -> Result<DeployResult, DriverError>;

    async fn delete_by_config(&self, namespace: &str, payload: &str) -> Result<(), DriverError>;

    async fn delete_by_gvk(&self, resource: &ResourceGvk) -> Result<(), DriverError>;

    /// Apply or lift a deploy freeze on a cluster, or on one of its namespaces
    async fn mark_no_deploy(
        &self,
        cluster: &str,
        namespace: Option<&str>,
        apply: bool,
    ) -> Result<(), DriverError>;

    async fn label_resources(
        &self,
        label: &str,
        resources: &[ResourceGvk],
    ) -> Result<(), DriverError>;

    async fn aggregate_resources(
        &self,
        cluster: &str,
        namespace: Option<&str>,
    ) -> Result<serde_json::Value, DriverError>;

    async fn delete_by_label(&self, label: &str, namespace: &str) -> Result<(), DriverError>;

    async fn get_app_resource_statuses(
        &self,
        app_name: &str,
    ) -> Result<Vec<ResourceStatus>, DriverError>;

    async fn get_operation_success(&self, app_name: &str)
        -> Result<OperationStatus, DriverError>;

    async fn get_current_revision(&self, app_name: &str) -> Result<String, DriverError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
