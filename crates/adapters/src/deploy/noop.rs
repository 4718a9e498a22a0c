// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op driver for when no cluster driver is configured.

use super::{DeployResult, DeploymentDriver, DriverError, NOT_APPLICABLE};
use async_trait::async_trait;
use keel_core::{DeployKind, OperationStatus, ResourceGvk, ResourceStatus};

/// Driver that accepts every request and changes nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpDeploymentDriver;

impl NoOpDeploymentDriver {
    pub fn new() -> Self {
        Self
    }
}

fn unchanged(app_name: &str) -> DeployResult {
    DeployResult {
        app_name: app_name.to_string(),
        namespace: String::new(),
        revision_hash: NOT_APPLICABLE.to_string(),
    }
}

#[async_trait]
impl DeploymentDriver for NoOpDeploymentDriver {
    async fn deploy(
        &self,
        _kind: &DeployKind,
        namespace: &str,
        _payload: &str,
        _revision_hash: &str,
    ) -> Result<DeployResult, DriverError> {
        Ok(DeployResult {
            namespace: namespace.to_string(),
            ..unchanged("")
        })
    }

    async fn sync(&self, app_name: &str) -> Result<DeployResult, DriverError> {
        Ok(unchanged(app_name))
    }

    async fn selective_sync(
        &self,
        app_name: &str,
        _revision_hash: &str,
        _resources: &[ResourceGvk],
    ) -> Result<DeployResult, DriverError> {
        Ok(unchanged(app_name))
    }

    async fn rollback(
        &self,
        app_name: &str,
        _revision_hash: &str,
    ) -> Result<DeployResult, DriverError> {
        Ok(unchanged(app_name))
    }

    async fn delete_by_config(&self, _namespace: &str, _payload: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn delete_by_gvk(&self, _resource: &ResourceGvk) -> Result<(), DriverError> {
        Ok(())
    }

    async fn mark_no_deploy(
        &self,
        _cluster: &str,
        _namespace: Option<&str>,
        _apply: bool,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    async fn label_resources(
        &self,
        _label: &str,
        _resources: &[ResourceGvk],
    ) -> Result<(), DriverError> {
        Ok(())
    }

    async fn aggregate_resources(
        &self,
        _cluster: &str,
        _namespace: Option<&str>,
    ) -> Result<serde_json::Value, DriverError> {
        Ok(serde_json::Value::Array(Vec::new()))
    }

    async fn delete_by_label(&self, _label: &str, _namespace: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn get_app_resource_statuses(
        &self,
        _app_name: &str,
    ) -> Result<Vec<ResourceStatus>, DriverError> {
        Ok(Vec::new())
    }

    async fn get_operation_success(
        &self,
        _app_name: &str,
    ) -> Result<OperationStatus, DriverError> {
        Ok(OperationStatus {
            completed: true,
            succeeded: true,
            revision: String::new(),
        })
    }

    async fn get_current_revision(&self, _app_name: &str) -> Result<String, DriverError> {
        Ok(String::new())
    }
}
