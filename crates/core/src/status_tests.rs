// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::log::RemediationLog;
use yare::parameterized;

fn remediation(status: LogStatus) -> Log {
    Log::Remediation(RemediationLog {
        pipeline_uvn: "run-1".into(),
        version_instance: 0,
        unhealthy_resources: vec![],
        status,
    })
}

fn deployment(status: LogStatus) -> DeploymentLog {
    DeploymentLog {
        status,
        ..DeploymentLog::start("run-1", "abc")
    }
}

#[test]
fn default_is_stable_and_complete() {
    let status = PipelineStatus::new();
    assert!(status.stable);
    assert!(status.complete);
    assert!(!status.cancelled);
}

#[test]
fn cancelling_also_marks_incomplete() {
    let mut status = PipelineStatus::new();
    status.mark_cancelled();
    assert!(status.cancelled);
    assert!(!status.complete);
}

#[parameterized(
    progressing = { LogStatus::Progressing, false },
    success = { LogStatus::Success, false },
    failure = { LogStatus::Failure, true },
    cancelled = { LogStatus::Cancelled, false },
)]
fn remediation_stability_is_inverted(status: LogStatus, stable: bool) {
    let mut pipeline = PipelineStatus::new();
    pipeline.observe_stability(&remediation(status));
    assert_eq!(pipeline.stable, stable);
}

#[parameterized(
    progressing = { LogStatus::Progressing, true },
    success = { LogStatus::Success, true },
    failure = { LogStatus::Failure, false },
)]
fn deployment_stability(status: LogStatus, stable: bool) {
    let mut pipeline = PipelineStatus::new();
    pipeline.observe_stability(&Log::Deployment(deployment(status)));
    assert_eq!(pipeline.stable, stable);
}

#[test]
fn failed_deployment_records_step() {
    let mut pipeline = PipelineStatus::new();
    let mut log = deployment(LogStatus::Failure);
    log.deployment_complete = true;
    log.broken_test = "smoke".into();
    log.broken_test_log = "assertion failed".into();
    pipeline.record_deployment_outcome(&log, "eu");

    assert!(!pipeline.complete);
    assert_eq!(
        pipeline.failed_steps,
        vec![FailedStep {
            step: "eu".into(),
            deployment_failed: false,
            broken_test: "smoke".into(),
            broken_test_log: "assertion failed".into(),
        }]
    );
}

#[test]
fn successful_deployment_changes_nothing() {
    let mut pipeline = PipelineStatus::new();
    pipeline.record_deployment_outcome(&deployment(LogStatus::Success), "eu");
    assert_eq!(pipeline, PipelineStatus::new());
}

#[test]
fn processing_errors_are_numbered() {
    let mut pipeline = PipelineStatus::new();
    pipeline.add_processing_errors(&["bad yaml".into(), "timeout".into()]);
    assert_eq!(pipeline.failed_steps.len(), 2);
    assert_eq!(pipeline.failed_steps[0].step, UNKNOWN_STEP);
    assert_eq!(pipeline.failed_steps[0].broken_test, "Processing error 0");
    assert_eq!(pipeline.failed_steps[1].broken_test, "Processing error 1");
    assert_eq!(pipeline.failed_steps[1].broken_test_log, "timeout");
}
