// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health snapshots scraped from the controller's metrics endpoint

use super::{HealthError, HealthSource};
use crate::http;
use async_trait::async_trait;
use keel_core::{AppSnapshot, HealthStatus, SyncStatus};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// Constant patterns, valid by construction
#[allow(clippy::expect_used)]
static APP_INFO_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^argocd_app_info\{(.*)\}\s+[0-9.eE+-]+\s*$").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)="((?:[^"\\]|\\.)*)""#).expect("constant regex pattern is valid")
});

/// Parse `argocd_app_info{...}` samples out of a Prometheus text payload
pub fn parse_metrics(payload: &str) -> Vec<AppSnapshot> {
    let mut apps = Vec::new();
    for line in APP_INFO_LINE.captures_iter(payload) {
        let labels: HashMap<&str, &str> = LABEL
            .captures_iter(&line[1])
            .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
            .collect();
        let label = |name: &str| labels.get(name).copied().unwrap_or_default().to_string();

        apps.push(AppSnapshot {
            name: label("name"),
            namespace: label("namespace"),
            health: HealthStatus::parse(&label("health_status")),
            sync: SyncStatus::parse(&label("sync_status")),
            repo: label("repo"),
            operation: label("operation"),
            project: label("project"),
            dest_server: label("dest_server"),
            dest_namespace: label("dest_namespace"),
        });
    }
    apps
}

/// Scrapes a Prometheus-format metrics endpoint
#[derive(Clone, Debug)]
pub struct MetricsHealthSource {
    url: String,
}

impl MetricsHealthSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl HealthSource for MetricsHealthSource {
    async fn fetch_snapshot(&self) -> Result<Vec<AppSnapshot>, HealthError> {
        let body = http::get_text(self.url.clone())
            .await
            .map_err(|e| HealthError::Request(e.to_string()))?;
        Ok(parse_metrics(&body))
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
