// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver backed by the cluster-side driver service's JSON API

use super::{DeployResult, DeploymentDriver, DriverError};
use crate::http::{self, HttpError};
use crate::jobs::{JobError, JobSource, JobStatus};
use async_trait::async_trait;
use keel_core::{DeployKind, OperationStatus, ResourceGvk, ResourceStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Debug)]
pub struct HttpDriver {
    base: String,
}

impl HttpDriver {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<String, DriverError> {
        let body =
            serde_json::to_string(body).map_err(|e| DriverError::InvalidResponse(e.to_string()))?;
        http::post_json(self.url(path), body)
            .await
            .map_err(driver_error)
    }

    async fn post_for<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DriverError> {
        let text = self.post(path, body).await?;
        parse(&text)
    }

    async fn get_for<T: DeserializeOwned>(&self, path: &str) -> Result<T, DriverError> {
        let text = http::get_text(self.url(path))
            .await
            .map_err(driver_error)?;
        parse(&text)
    }
}

fn parse<T: DeserializeOwned>(text: &str) -> Result<T, DriverError> {
    serde_json::from_str(text).map_err(|e| DriverError::InvalidResponse(e.to_string()))
}

fn driver_error(e: HttpError) -> DriverError {
    match e {
        HttpError::Status(404) => DriverError::NotFound("HTTP status 404".to_string()),
        HttpError::Status(code) if code < 500 && code != 429 => DriverError::Rejected {
            status: code,
            message: format!("HTTP status {code}"),
        },
        other => DriverError::Request(other.to_string()),
    }
}

fn job_error(e: HttpError) -> JobError {
    match e {
        HttpError::Status(404) => JobError::NotFound("HTTP status 404".to_string()),
        other => JobError::Request(other.to_string()),
    }
}

#[async_trait]
impl DeploymentDriver for HttpDriver {
    async fn deploy(
        &self,
        kind: &DeployKind,
        namespace: &str,
        payload: &str,
        revision_hash: &str,
    ) -> Result<DeployResult, DriverError> {
        self.post_for(
            "/deploy",
            &json!({
                "kind": kind,
                "namespace": namespace,
                "payload": payload,
                "revision_hash": revision_hash,
            }),
        )
        .await
    }

    async fn sync(&self, app_name: &str) -> Result<DeployResult, DriverError> {
        self.post_for("/sync", &json!({ "app_name": app_name }))
            .await
    }

    async fn selective_sync(
        &self,
        app_name: &str,
        revision_hash: &str,
        resources: &[ResourceGvk],
    ) -> Result<DeployResult, DriverError> {
        self.post_for(
            "/selective-sync",
            &json!({
                "app_name": app_name,
                "revision_hash": revision_hash,
                "resources": resources,
            }),
        )
        .await
    }

    async fn rollback(
        &self,
        app_name: &str,
        revision_hash: &str,
    ) -> Result<DeployResult, DriverError> {
        self.post_for(
            "/rollback",
            &json!({ "app_name": app_name, "revision_hash": revision_hash }),
        )
        .await
    }

    async fn delete_by_config(&self, namespace: &str, payload: &str) -> Result<(), DriverError> {
        self.post(
            "/delete",
            &json!({ "namespace": namespace, "payload": payload }),
        )
        .await
        .map(|_| ())
    }

    async fn delete_by_gvk(&self, resource: &ResourceGvk) -> Result<(), DriverError> {
        self.post("/delete-gvk", resource).await.map(|_| ())
    }

    async fn mark_no_deploy(
        &self,
        cluster: &str,
        namespace: Option<&str>,
        apply: bool,
    ) -> Result<(), DriverError> {
        self.post(
            "/no-deploy",
            &json!({ "cluster": cluster, "namespace": namespace, "apply": apply }),
        )
        .await
        .map(|_| ())
    }

    async fn label_resources(
        &self,
        label: &str,
        resources: &[ResourceGvk],
    ) -> Result<(), DriverError> {
        self.post(
            "/label",
            &json!({ "label": label, "resources": resources }),
        )
        .await
        .map(|_| ())
    }

    async fn aggregate_resources(
        &self,
        cluster: &str,
        namespace: Option<&str>,
    ) -> Result<serde_json::Value, DriverError> {
        self.post_for(
            "/aggregate",
            &json!({ "cluster": cluster, "namespace": namespace }),
        )
        .await
    }

    async fn delete_by_label(&self, label: &str, namespace: &str) -> Result<(), DriverError> {
        self.post(
            "/delete-by-label",
            &json!({ "label": label, "namespace": namespace }),
        )
        .await
        .map(|_| ())
    }

    async fn get_app_resource_statuses(
        &self,
        app_name: &str,
    ) -> Result<Vec<ResourceStatus>, DriverError> {
        self.get_for(&format!("/apps/{app_name}/resources")).await
    }

    async fn get_operation_success(
        &self,
        app_name: &str,
    ) -> Result<OperationStatus, DriverError> {
        self.get_for(&format!("/apps/{app_name}/operation")).await
    }

    async fn get_current_revision(&self, app_name: &str) -> Result<String, DriverError> {
        #[derive(serde::Deserialize)]
        struct Revision {
            revision: String,
        }
        let revision: Revision = self.get_for(&format!("/apps/{app_name}/revision")).await?;
        Ok(revision.revision)
    }
}

#[async_trait]
impl JobSource for HttpDriver {
    async fn get_job_status(&self, name: &str, namespace: &str) -> Result<JobStatus, JobError> {
        let text = http::get_text(self.url(&format!("/jobs/{namespace}/{name}")))
            .await
            .map_err(job_error)?;
        serde_json::from_str(&text).map_err(|e| JobError::Request(e.to_string()))
    }

    async fn get_logs(&self, namespace: &str, selector: &str) -> Result<String, JobError> {
        let body = json!({ "namespace": namespace, "selector": selector }).to_string();
        http::post_json(self.url("/logs"), body)
            .await
            .map_err(job_error)
    }

    async fn delete_job(&self, name: &str, namespace: &str, kind: &str) -> Result<(), JobError> {
        http::delete(self.url(&format!("/jobs/{namespace}/{name}?kind={kind}")))
            .await
            .map(|_| ())
            .map_err(job_error)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
