// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn start_is_progressing_instance_zero() {
    let log = DeploymentLog::start("run-1", "c0ffee");
    assert_eq!(log.status, LogStatus::Progressing);
    assert_eq!(log.version_instance, 0);
    assert!(!log.deployment_complete);
    assert_eq!(log.rollback_uvn, None);
}

#[test]
fn cancelled_placeholder() {
    let log = DeploymentLog::cancelled("run-2");
    assert_eq!(log.status, LogStatus::Cancelled);
    assert!(log.git_commit.is_empty());
}

#[test]
fn set_status_reaches_remediation_logs() {
    let mut log = Log::from(RemediationLog {
        pipeline_uvn: "run-1".into(),
        version_instance: 1,
        unhealthy_resources: vec!["Deployment/web".into()],
        status: LogStatus::Progressing,
    });
    log.set_status(LogStatus::Success);
    assert_eq!(log.status(), LogStatus::Success);
    assert_eq!(log.version_instance(), 1);
    assert!(log.as_deployment().is_none());
}

#[test]
fn log_json_is_tagged() {
    let log = Log::from(DeploymentLog::start("run-1", "abc"));
    let json = serde_json::to_value(&log).unwrap();
    assert_eq!(json["type"], "deployment");
    assert_eq!(json["pipeline_uvn"], "run-1");
    let back: Log = serde_json::from_value(json).unwrap();
    assert_eq!(back, log);
}
