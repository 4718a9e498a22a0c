// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::deploy::{DeployResult, DeploymentDriver, DriverError};
use crate::events::{EventSink, SinkError};
use crate::health::{HealthError, HealthSource};
use crate::jobs::{JobError, JobSource, JobStatus};
use async_trait::async_trait;
use keel_core::{
    AppSnapshot, DeployKind, EventInfo, OperationStatus, ResourceGvk, ResourceStatus,
};
use std::fmt::Display;
use std::future::Future;
use tracing::Instrument;

/// Run `fut` inside `span`, logging entry, elapsed time and failure
async fn timed<T, E, F>(span: tracing::Span, fut: F) -> Result<T, E>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    async move {
        tracing::debug!("starting");
        let start = std::time::Instant::now();
        let result = fut.await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::debug!(elapsed_ms, "completed"),
            Err(e) => tracing::warn!(elapsed_ms, error = %e, "failed"),
        }
        result
    }
    .instrument(span)
    .await
}

/// Wrapper that adds tracing to any HealthSource
#[derive(Clone)]
pub struct TracedHealthSource<H> {
    inner: H,
}

impl<H> TracedHealthSource<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: HealthSource> HealthSource for TracedHealthSource<H> {
    async fn fetch_snapshot(&self) -> Result<Vec<AppSnapshot>, HealthError> {
        let span = tracing::info_span!("health.fetch");
        let result = timed(span.clone(), self.inner.fetch_snapshot()).await;
        if let Ok(apps) = &result {
            span.in_scope(|| tracing::trace!(apps = apps.len(), "snapshot"));
        }
        result
    }
}

/// Wrapper that adds tracing to any JobSource
#[derive(Clone)]
pub struct TracedJobSource<J> {
    inner: J,
}

impl<J> TracedJobSource<J> {
    pub fn new(inner: J) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<J: JobSource> JobSource for TracedJobSource<J> {
    async fn get_job_status(&self, name: &str, namespace: &str) -> Result<JobStatus, JobError> {
        let span = tracing::info_span!("jobs.status", name, namespace);
        timed(span, self.inner.get_job_status(name, namespace)).await
    }

    async fn get_logs(&self, namespace: &str, selector: &str) -> Result<String, JobError> {
        let span = tracing::info_span!("jobs.logs", namespace, selector);
        timed(span, self.inner.get_logs(namespace, selector)).await
    }

    async fn delete_job(&self, name: &str, namespace: &str, kind: &str) -> Result<(), JobError> {
        let span = tracing::info_span!("jobs.delete", name, namespace, kind);
        let result = timed(span, self.inner.delete_job(name, namespace, kind)).await;
        if result.is_ok() {
            tracing::info!(name, namespace, "job deleted");
        }
        result
    }
}

/// Wrapper that adds tracing to any EventSink
#[derive(Clone)]
pub struct TracedEventSink<S> {
    inner: S,
}

impl<S> TracedEventSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: EventSink> EventSink for TracedEventSink<S> {
    async fn emit(&self, event: &EventInfo) -> Result<(), SinkError> {
        let meta = event.metadata();
        let span = tracing::info_span!(
            "events.emit",
            event = event.name(),
            pipeline = %meta.pipeline,
            step = %meta.step,
            uvn = %meta.pipeline_uvn,
        );
        let result = timed(span, self.inner.emit(event)).await;
        if result.is_ok() {
            tracing::info!(event = event.name(), step = %meta.step, "event emitted");
        }
        result
    }
}

/// Wrapper that adds tracing to any DeploymentDriver
#[derive(Clone)]
pub struct TracedDeploymentDriver<D> {
    inner: D,
}

impl<D> TracedDeploymentDriver<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<D: DeploymentDriver> DeploymentDriver for TracedDeploymentDriver<D> {
    async fn deploy(
        &self,
        kind: &DeployKind,
        namespace: &str,
        payload: &str,
        revision_hash: &str,
    ) -> Result<DeployResult, DriverError> {
        let span = tracing::info_span!("driver.deploy", ?kind, namespace, revision_hash);
        let result = timed(
            span,
            self.inner.deploy(kind, namespace, payload, revision_hash),
        )
        .await;
        if let Ok(deployed) = &result {
            tracing::info!(
                app = %deployed.app_name,
                namespace = %deployed.namespace,
                revision = %deployed.revision_hash,
                "deployed"
            );
        }
        result
    }

    async fn sync(&self, app_name: &str) -> Result<DeployResult, DriverError> {
        let span = tracing::info_span!("driver.sync", app_name);
        timed(span, self.inner.sync(app_name)).await
    }

    async fn selective_sync(
        &self,
        app_name: &str,
        revision_hash: &str,
        resources: &[ResourceGvk],
    ) -> Result<DeployResult, DriverError> {
        let span = tracing::info_span!(
            "driver.selective_sync",
            app_name,
            revision_hash,
            resources = resources.len()
        );
        timed(
            span,
            self.inner.selective_sync(app_name, revision_hash, resources),
        )
        .await
    }

    async fn rollback(
        &self,
        app_name: &str,
        revision_hash: &str,
    ) -> Result<DeployResult, DriverError> {
        let span = tracing::info_span!("driver.rollback", app_name, revision_hash);
        timed(span, self.inner.rollback(app_name, revision_hash)).await
    }

    async fn delete_by_config(&self, namespace: &str, payload: &str) -> Result<(), DriverError> {
        let span = tracing::info_span!("driver.delete_by_config", namespace);
        timed(span, self.inner.delete_by_config(namespace, payload)).await
    }

    async fn delete_by_gvk(&self, resource: &ResourceGvk) -> Result<(), DriverError> {
        let span = tracing::info_span!(
            "driver.delete_by_gvk",
            kind = %resource.kind,
            name = %resource.name,
            namespace = %resource.namespace,
        );
        timed(span, self.inner.delete_by_gvk(resource)).await
    }

    async fn mark_no_deploy(
        &self,
        cluster: &str,
        namespace: Option<&str>,
        apply: bool,
    ) -> Result<(), DriverError> {
        let span = tracing::info_span!("driver.mark_no_deploy", cluster, ?namespace, apply);
        timed(span, self.inner.mark_no_deploy(cluster, namespace, apply)).await
    }

    async fn label_resources(
        &self,
        label: &str,
        resources: &[ResourceGvk],
    ) -> Result<(), DriverError> {
        let span = tracing::info_span!("driver.label", label, resources = resources.len());
        timed(span, self.inner.label_resources(label, resources)).await
    }

    async fn aggregate_resources(
        &self,
        cluster: &str,
        namespace: Option<&str>,
    ) -> Result<serde_json::Value, DriverError> {
        let span = tracing::info_span!("driver.aggregate", cluster, ?namespace);
        timed(span, self.inner.aggregate_resources(cluster, namespace)).await
    }

    async fn delete_by_label(&self, label: &str, namespace: &str) -> Result<(), DriverError> {
        let span = tracing::info_span!("driver.delete_by_label", label, namespace);
        timed(span, self.inner.delete_by_label(label, namespace)).await
    }

    async fn get_app_resource_statuses(
        &self,
        app_name: &str,
    ) -> Result<Vec<ResourceStatus>, DriverError> {
        let span = tracing::debug_span!("driver.resource_statuses", app_name);
        timed(span, self.inner.get_app_resource_statuses(app_name)).await
    }

    async fn get_operation_success(
        &self,
        app_name: &str,
    ) -> Result<OperationStatus, DriverError> {
        let span = tracing::debug_span!("driver.operation", app_name);
        timed(span, self.inner.get_operation_success(app_name)).await
    }

    async fn get_current_revision(&self, app_name: &str) -> Result<String, DriverError> {
        let span = tracing::debug_span!("driver.revision", app_name);
        timed(span, self.inner.get_current_revision(app_name)).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
