// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable store key layout
//!
//! Keys are colon-separated and scoped from the organization down.

pub fn cluster(org: &str, cluster: &str) -> String {
    format!("cluster:{org}:{cluster}")
}

/// Prefix shared by every cluster record of an organization
pub fn cluster_prefix(org: &str) -> String {
    format!("cluster:{org}:")
}

pub fn commands(org: &str, cluster: &str) -> String {
    format!("commands:{org}:{cluster}")
}

pub fn notifications(org: &str, cluster: &str) -> String {
    format!("notifications:{org}:{cluster}")
}

pub fn notification_result(request_id: &str) -> String {
    format!("notification-result:{request_id}")
}

pub fn step_logs(org: &str, team: &str, pipeline: &str, step: &str) -> String {
    format!("step-log:{org}:{team}:{pipeline}:{step}")
}

pub fn step_metadata(org: &str, team: &str, pipeline: &str, step: &str) -> String {
    format!("step-meta:{org}:{team}:{pipeline}:{step}")
}

pub fn pipeline_runs(org: &str, team: &str, pipeline: &str) -> String {
    format!("pipeline-runs:{org}:{team}:{pipeline}")
}

pub fn watch_checkpoint(cluster: &str) -> String {
    format!("watch-checkpoint:{cluster}")
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
