// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake deployment driver for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DeployResult, DeploymentDriver, DriverError, NOT_APPLICABLE};
use async_trait::async_trait;
use keel_core::{DeployKind, OperationStatus, ResourceGvk, ResourceStatus};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded driver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Deploy {
        kind: DeployKind,
        namespace: String,
        payload: String,
        revision_hash: String,
    },
    Sync {
        app_name: String,
    },
    SelectiveSync {
        app_name: String,
        revision_hash: String,
        resources: Vec<ResourceGvk>,
    },
    Rollback {
        app_name: String,
        revision_hash: String,
    },
    DeleteByConfig {
        namespace: String,
        payload: String,
    },
    DeleteByGvk {
        resource: ResourceGvk,
    },
    MarkNoDeploy {
        cluster: String,
        namespace: Option<String>,
        apply: bool,
    },
    Label {
        label: String,
        resources: Vec<ResourceGvk>,
    },
    Aggregate {
        cluster: String,
        namespace: Option<String>,
    },
    DeleteByLabel {
        label: String,
        namespace: String,
    },
    ResourceStatuses {
        app_name: String,
    },
    OperationSuccess {
        app_name: String,
    },
    CurrentRevision {
        app_name: String,
    },
}

impl DriverCall {
    /// Status queries made by the reconciler, as opposed to mutations
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            DriverCall::ResourceStatuses { .. }
                | DriverCall::OperationSuccess { .. }
                | DriverCall::CurrentRevision { .. }
        )
    }
}

#[derive(Default)]
struct FakeDriverState {
    calls: Vec<DriverCall>,
    errors: VecDeque<DriverError>,
    deploy_app: Option<String>,
    resources: HashMap<String, Vec<ResourceStatus>>,
    operations: HashMap<String, OperationStatus>,
    revisions: HashMap<String, String>,
    aggregate: Option<serde_json::Value>,
}

/// Fake driver with scripted results and a queue of injected errors
///
/// Each queued error fails the next mutating call. Status queries fail only
/// for apps with nothing scripted.
#[derive(Clone, Default)]
pub struct FakeDeploymentDriver {
    inner: Arc<Mutex<FakeDriverState>>,
}

impl FakeDeploymentDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name reported for deployed applications (defaults to "app")
    pub fn set_deploy_app(&self, app_name: &str) {
        self.lock().deploy_app = Some(app_name.to_string());
    }

    pub fn push_error(&self, error: DriverError) {
        self.lock().errors.push_back(error);
    }

    pub fn set_resources(&self, app_name: &str, resources: Vec<ResourceStatus>) {
        self.lock()
            .resources
            .insert(app_name.to_string(), resources);
    }

    pub fn set_operation(&self, app_name: &str, operation: OperationStatus) {
        self.lock()
            .operations
            .insert(app_name.to_string(), operation);
    }

    pub fn set_revision(&self, app_name: &str, revision: &str) {
        self.lock()
            .revisions
            .insert(app_name.to_string(), revision.to_string());
    }

    pub fn set_aggregate(&self, value: serde_json::Value) {
        self.lock().aggregate = Some(value);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls that changed cluster state
    pub fn mutations(&self) -> Vec<DriverCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| !c.is_query())
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeDriverState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: DriverCall) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        match inner.errors.pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn result_for(&self, app_name: &str, revision_hash: &str) -> DeployResult {
        DeployResult {
            app_name: app_name.to_string(),
            namespace: String::new(),
            revision_hash: revision_hash.to_string(),
        }
    }
}

#[async_trait]
impl DeploymentDriver for FakeDeploymentDriver {
    async fn deploy(
        &self,
        kind: &DeployKind,
        namespace: &str,
        payload: &str,
        revision_hash: &str,
    ) -> Result<DeployResult, DriverError> {
        self.record(DriverCall::Deploy {
            kind: kind.clone(),
            namespace: namespace.to_string(),
            payload: payload.to_string(),
            revision_hash: revision_hash.to_string(),
        })?;
        let app_name = self
            .lock()
            .deploy_app
            .clone()
            .unwrap_or_else(|| "app".to_string());
        let revision_hash = match kind {
            DeployKind::App => revision_hash,
            _ => NOT_APPLICABLE,
        };
        Ok(DeployResult {
            namespace: namespace.to_string(),
            ..self.result_for(&app_name, revision_hash)
        })
    }

    async fn sync(&self, app_name: &str) -> Result<DeployResult, DriverError> {
        self.record(DriverCall::Sync {
            app_name: app_name.to_string(),
        })?;
        let revision = self.lock().revisions.get(app_name).cloned().unwrap_or_default();
        Ok(self.result_for(app_name, &revision))
    }

    async fn selective_sync(
        &self,
        app_name: &str,
        revision_hash: &str,
        resources: &[ResourceGvk],
    ) -> Result<DeployResult, DriverError> {
        self.record(DriverCall::SelectiveSync {
            app_name: app_name.to_string(),
            revision_hash: revision_hash.to_string(),
            resources: resources.to_vec(),
        })?;
        Ok(self.result_for(app_name, revision_hash))
    }

    async fn rollback(
        &self,
        app_name: &str,
        revision_hash: &str,
    ) -> Result<DeployResult, DriverError> {
        self.record(DriverCall::Rollback {
            app_name: app_name.to_string(),
            revision_hash: revision_hash.to_string(),
        })?;
        Ok(self.result_for(app_name, revision_hash))
    }

    async fn delete_by_config(&self, namespace: &str, payload: &str) -> Result<(), DriverError> {
        self.record(DriverCall::DeleteByConfig {
            namespace: namespace.to_string(),
            payload: payload.to_string(),
        })
    }

    async fn delete_by_gvk(&self, resource: &ResourceGvk) -> Result<(), DriverError> {
        self.record(DriverCall::DeleteByGvk {
            resource: resource.clone(),
        })
    }

    async fn mark_no_deploy(
        &self,
        cluster: &str,
        namespace: Option<&str>,
        apply: bool,
    ) -> Result<(), DriverError> {
        self.record(DriverCall::MarkNoDeploy {
            cluster: cluster.to_string(),
            namespace: namespace.map(str::to_string),
            apply,
        })
    }

    async fn label_resources(
        &self,
        label: &str,
        resources: &[ResourceGvk],
    ) -> Result<(), DriverError> {
        self.record(DriverCall::Label {
            label: label.to_string(),
            resources: resources.to_vec(),
        })
    }

    async fn aggregate_resources(
        &self,
        cluster: &str,
        namespace: Option<&str>,
    ) -> Result<serde_json::Value, DriverError> {
        self.record(DriverCall::Aggregate {
            cluster: cluster.to_string(),
            namespace: namespace.map(str::to_string),
        })?;
        Ok(self
            .lock()
            .aggregate
            .clone()
            .unwrap_or(serde_json::Value::Array(Vec::new())))
    }

    async fn delete_by_label(&self, label: &str, namespace: &str) -> Result<(), DriverError> {
        self.record(DriverCall::DeleteByLabel {
            label: label.to_string(),
            namespace: namespace.to_string(),
        })
    }

    async fn get_app_resource_statuses(
        &self,
        app_name: &str,
    ) -> Result<Vec<ResourceStatus>, DriverError> {
        let mut inner = self.lock();
        inner.calls.push(DriverCall::ResourceStatuses {
            app_name: app_name.to_string(),
        });
        inner
            .resources
            .get(app_name)
            .cloned()
            .ok_or_else(|| DriverError::NotFound(app_name.to_string()))
    }

    async fn get_operation_success(
        &self,
        app_name: &str,
    ) -> Result<OperationStatus, DriverError> {
        let mut inner = self.lock();
        inner.calls.push(DriverCall::OperationSuccess {
            app_name: app_name.to_string(),
        });
        inner
            .operations
            .get(app_name)
            .cloned()
            .ok_or_else(|| DriverError::NotFound(app_name.to_string()))
    }

    async fn get_current_revision(&self, app_name: &str) -> Result<String, DriverError> {
        let mut inner = self.lock();
        inner.calls.push(DriverCall::CurrentRevision {
            app_name: app_name.to_string(),
        });
        inner
            .revisions
            .get(app_name)
            .cloned()
            .ok_or_else(|| DriverError::NotFound(app_name.to_string()))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
