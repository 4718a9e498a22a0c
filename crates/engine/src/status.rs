// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whole-pipeline status derived from step log chains, and run cancellation

use crate::audit::{AuditLog, Located, PipelineRef};
use crate::runs::PipelineRuns;
use crate::EngineError;
use keel_core::{DeploymentLog, Log, LogStatus, PipelineStatus};
use keel_storage::DurableStore;

/// Run selector meaning "the most recent run"
pub const LATEST: &str = "LATEST";

/// Derive the status of run `uvn` (or [`LATEST`]) across `steps`.
///
/// For each step the most recent entry of the run decides: a progressing or
/// cancelled deployment short-circuits, anything else feeds stability, and
/// the nearest deployment entry of the run decides completeness. Rollback
/// attempts also surface the failure of the run's original attempt.
pub fn derive_status<S: DurableStore>(
    audit: &AuditLog<S>,
    runs: &PipelineRuns<S>,
    pipeline: &PipelineRef,
    steps: &[String],
    uvn: &str,
) -> Result<PipelineStatus, EngineError> {
    let mut status = PipelineStatus::new();
    let mut uvn = (uvn != LATEST).then(|| uvn.to_string());

    for step in steps {
        let Some(head) = audit.head(pipeline, step)? else {
            status.mark_incomplete();
            continue;
        };
        let uvn = uvn.get_or_insert_with(|| head.pipeline_uvn().to_string()).clone();

        let Some(found) = audit.latest_for_run(pipeline, step, &uvn)? else {
            status.mark_incomplete();
            continue;
        };

        if let Log::Deployment(log) = &found.log {
            match log.status {
                LogStatus::Progressing => {
                    status.add_progressing_step(step.as_str());
                    continue;
                }
                LogStatus::Cancelled => {
                    status.mark_cancelled();
                    if log.has_broken_test() {
                        status.add_failed_step(log, step);
                    }
                    continue;
                }
                LogStatus::Success | LogStatus::Failure => {}
            }
        }

        status.observe_stability(&found.log);

        let deployment = match found.log {
            Log::Deployment(log) => log,
            Log::Remediation(_) => {
                match deployment_for_run(audit, pipeline, step, &uvn, found.index + 1)? {
                    Some(log) => log,
                    None => {
                        status.mark_incomplete();
                        continue;
                    }
                }
            }
        };
        status.record_deployment_outcome(&deployment, step);

        if deployment.version_instance != 0 {
            let original = audit.scan(pipeline, step, |log| {
                log.pipeline_uvn() == uvn && log.version_instance() == 0 && log.as_deployment().is_some()
            })?;
            if let Some(Located {
                log: Log::Deployment(original),
                ..
            }) = original
            {
                if original.status == LogStatus::Failure {
                    status.add_failed_step(&original, step);
                }
            }
        }
    }

    if let Some(uvn) = uvn {
        if let Some(run) = runs.find(pipeline, &uvn)? {
            status.add_processing_errors(&run.errors);
        }
    }
    Ok(status)
}

/// Nearest deployment entry of run `uvn` at or after `from`
fn deployment_for_run<S: DurableStore>(
    audit: &AuditLog<S>,
    pipeline: &PipelineRef,
    step: &str,
    uvn: &str,
    from: usize,
) -> Result<Option<DeploymentLog>, EngineError> {
    let found = audit.scan_from(pipeline, step, from, |log| {
        log.pipeline_uvn() == uvn && log.as_deployment().is_some()
    })?;
    Ok(found.and_then(|located| match located.log {
        Log::Deployment(log) => Some(log),
        Log::Remediation(_) => None,
    }))
}

/// Cancel the most recent run on every step.
///
/// The run is taken from the first step that has any log. Steps whose head
/// belongs to that run are flipped in place; every other step gets a
/// cancelled placeholder so the run still reads as cancelled there.
/// Returns the cancelled run, if any step had a log.
pub fn cancel_latest_pipeline<S: DurableStore>(
    audit: &AuditLog<S>,
    pipeline: &PipelineRef,
    steps: &[String],
) -> Result<Option<String>, EngineError> {
    let mut latest = None;
    for step in steps {
        if let Some(head) = audit.head(pipeline, step)? {
            latest = Some(head.pipeline_uvn().to_string());
            break;
        }
    }
    let Some(uvn) = latest else {
        return Ok(None);
    };

    for step in steps {
        match audit.head(pipeline, step)? {
            Some(mut head) if head.pipeline_uvn() == uvn => {
                head.set_status(LogStatus::Cancelled);
                audit.update_head(pipeline, step, &head)?;
            }
            _ => {
                audit.append_log(pipeline, step, &DeploymentLog::cancelled(uvn.as_str()).into())?;
            }
        }
    }
    tracing::info!(%pipeline, uvn = %uvn, "run cancelled");
    Ok(Some(uvn))
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
