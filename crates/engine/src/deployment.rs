// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step log lifecycle: start, record, mark and roll back
//!
//! Every update rewrites the matched entry at its own index in the step's
//! chain, so a remediation pushed on top of a deployment never shadows it.

use crate::audit::{AuditLog, Located, PipelineRef};
use crate::runs::PipelineRuns;
use crate::EngineError;
use keel_core::{DeploymentLog, Log, LogStatus, RemediationLog, ROOT_STEP};
use keel_storage::DurableStore;

/// Broken-test name used when a step fails outside of any test
pub const PROCESSING_ERROR: &str = "Processing Error";

#[derive(Clone)]
pub struct DeploymentLogs<S> {
    audit: AuditLog<S>,
    runs: PipelineRuns<S>,
}

impl<S: DurableStore> DeploymentLogs<S> {
    pub fn new(store: S) -> Self {
        Self {
            audit: AuditLog::new(store.clone()),
            runs: PipelineRuns::new(store),
        }
    }

    pub fn audit(&self) -> &AuditLog<S> {
        &self.audit
    }

    /// Start run `uvn` on a step with a progressing instance-0 deployment
    pub fn init_step_log(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        uvn: &str,
        git_commit: &str,
    ) -> Result<(), EngineError> {
        self.audit
            .append_log(pipeline, step, &DeploymentLog::start(uvn, git_commit).into())
    }

    /// Start a remediation attempt; instances count up within one run
    pub fn init_remediation_log(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        uvn: &str,
        unhealthy_resources: Vec<String>,
    ) -> Result<u32, EngineError> {
        let previous = self
            .audit
            .scan(pipeline, step, |log| log.as_remediation().is_some())?
            .filter(|found| found.log.pipeline_uvn() == uvn)
            .map_or(0, |found| found.log.version_instance());
        let instance = previous + 1;
        let log = RemediationLog {
            pipeline_uvn: uvn.to_string(),
            version_instance: instance,
            unhealthy_resources,
            status: LogStatus::Progressing,
        };
        self.audit.append_log(pipeline, step, &log.into())?;
        Ok(instance)
    }

    /// Attach the deployed application to the latest deployment
    pub fn record_deployment(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        app_name: &str,
        revision_hash: &str,
    ) -> Result<(), EngineError> {
        self.update_deployment(pipeline, step, |log| {
            log.app_name = app_name.to_string();
            log.revision_hash = revision_hash.to_string();
            Ok(())
        })
    }

    pub fn mark_deployment_successful(
        &self,
        pipeline: &PipelineRef,
        step: &str,
    ) -> Result<(), EngineError> {
        self.update_deployment(pipeline, step, |log| {
            log.deployment_complete = true;
            Ok(())
        })
    }

    /// Refuses when the deployment already carries a broken test
    pub fn mark_step_successful(&self, pipeline: &PipelineRef, step: &str) -> Result<(), EngineError> {
        self.update_deployment(pipeline, step, |log| {
            if log.has_broken_test() {
                return Err(EngineError::BrokenTest(step.to_string()));
            }
            log.status = LogStatus::Success;
            Ok(())
        })
    }

    pub fn mark_failed_deployment(&self, pipeline: &PipelineRef, step: &str) -> Result<(), EngineError> {
        self.update_deployment(pipeline, step, |log| {
            log.deployment_complete = false;
            log.status = LogStatus::Failure;
            Ok(())
        })
    }

    pub fn mark_failed_test(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        test: &str,
        test_log: &str,
    ) -> Result<(), EngineError> {
        self.update_deployment(pipeline, step, |log| {
            log.broken_test = test.to_string();
            log.broken_test_log = test_log.to_string();
            log.status = LogStatus::Failure;
            Ok(())
        })
    }

    pub fn mark_remediated(&self, pipeline: &PipelineRef, step: &str) -> Result<(), EngineError> {
        self.finish_remediation(pipeline, step, LogStatus::Success)
    }

    pub fn mark_remediation_failed(&self, pipeline: &PipelineRef, step: &str) -> Result<(), EngineError> {
        self.finish_remediation(pipeline, step, LogStatus::Failure)
    }

    /// Fail the step's latest entry, or the run itself when the step has
    /// no log yet.
    pub fn mark_processing_error(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        uvn: &str,
        error: &str,
    ) -> Result<(), EngineError> {
        let Some(mut head) = self.audit.head(pipeline, step)? else {
            return self.runs.record_error(pipeline, uvn, error);
        };
        if let Log::Deployment(log) = &mut head {
            log.broken_test = PROCESSING_ERROR.to_string();
            log.broken_test_log = error.to_string();
        }
        head.set_status(LogStatus::Failure);
        self.audit.update_head(pipeline, step, &head)?;
        tracing::warn!(%pipeline, step, uvn, error, "step failed with processing error");
        Ok(())
    }

    /// Whether every parent's latest deployment is a successful first attempt
    pub fn are_parents_complete(
        &self,
        pipeline: &PipelineRef,
        parents: &[String],
    ) -> Result<bool, EngineError> {
        for parent in parents.iter().filter(|p| p.as_str() != ROOT_STEP) {
            let complete = self
                .latest_deployment(pipeline, parent)?
                .is_some_and(|(_, log)| log.version_instance == 0 && log.status == LogStatus::Success);
            if !complete {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Push a rollback to the previous successful run and return its commit.
    ///
    /// Returns `None` when the step has no history, the rollback limit is
    /// reached, or no earlier successful deployment exists. An interrupted
    /// rollback is resumed rather than stacked. A dry run only resolves the
    /// target commit.
    pub fn make_rollback_log(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        limit: u32,
        dry_run: bool,
    ) -> Result<Option<String>, EngineError> {
        if self.audit.head(pipeline, step)?.is_none() {
            return Ok(None);
        }
        let (_, current) = self
            .latest_deployment(pipeline, step)?
            .ok_or_else(|| EngineError::NoDeploymentLog(step.to_string()))?;

        if current.version_instance >= limit {
            tracing::info!(%pipeline, step, limit, "rollback limit reached");
            return Ok(None);
        }
        if current.status == LogStatus::Progressing && current.version_instance > 0 {
            return Ok(Some(current.git_commit));
        }

        let from = if current.version_instance > 0 {
            let rolled_back_to = current.rollback_uvn.as_deref();
            let target = self.audit.scan(pipeline, step, |log| {
                log.as_deployment().is_some()
                    && Some(log.pipeline_uvn()) == rolled_back_to
                    && log.version_instance() == 0
            })?;
            match target {
                Some(found) => found.index + 1,
                None => return Ok(None),
            }
        } else if current.status == LogStatus::Success {
            let older = self.audit.scan(pipeline, step, |log| {
                log.as_deployment().is_some() && log.pipeline_uvn() != current.pipeline_uvn
            })?;
            match older {
                Some(found) => found.index,
                None => return Ok(None),
            }
        } else {
            0
        };

        let target = self.audit.scan_from(pipeline, step, from, |log| {
            matches!(log, Log::Deployment(d) if d.status == LogStatus::Success && d.version_instance == 0)
        })?;
        let Some(Located {
            log: Log::Deployment(target),
            ..
        }) = target
        else {
            tracing::info!(%pipeline, step, "no earlier successful deployment to roll back to");
            return Ok(None);
        };

        if !dry_run {
            let rollback = DeploymentLog {
                pipeline_uvn: current.pipeline_uvn.clone(),
                rollback_uvn: Some(target.pipeline_uvn.clone()),
                version_instance: current.version_instance + 1,
                app_name: target.app_name.clone(),
                revision_hash: target.revision_hash.clone(),
                git_commit: target.git_commit.clone(),
                ..DeploymentLog::default()
            };
            self.audit.append_log(pipeline, step, &rollback.into())?;
            tracing::info!(
                %pipeline,
                step,
                uvn = %current.pipeline_uvn,
                target = %target.pipeline_uvn,
                instance = current.version_instance + 1,
                "rollback started"
            );
        }
        Ok(Some(target.git_commit))
    }

    pub fn last_successful_git_commit(
        &self,
        pipeline: &PipelineRef,
        step: &str,
    ) -> Result<Option<String>, EngineError> {
        let found = self.audit.scan(pipeline, step, |log| {
            matches!(log, Log::Deployment(d) if d.status == LogStatus::Success)
        })?;
        Ok(found.and_then(|f| f.log.as_deployment().map(|d| d.git_commit.clone())))
    }

    /// Run of the step's latest deployment
    pub fn current_uvn(&self, pipeline: &PipelineRef, step: &str) -> Result<Option<String>, EngineError> {
        Ok(self
            .latest_deployment(pipeline, step)?
            .map(|(_, log)| log.pipeline_uvn))
    }

    pub fn latest_deployment(
        &self,
        pipeline: &PipelineRef,
        step: &str,
    ) -> Result<Option<(usize, DeploymentLog)>, EngineError> {
        Ok(self
            .audit
            .latest_deployment(pipeline, step)?
            .and_then(|found| match found.log {
                Log::Deployment(log) => Some((found.index, log)),
                Log::Remediation(_) => None,
            }))
    }

    fn update_deployment(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        f: impl FnOnce(&mut DeploymentLog) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        let (index, mut log) = self
            .latest_deployment(pipeline, step)?
            .ok_or_else(|| EngineError::NoDeploymentLog(step.to_string()))?;
        f(&mut log)?;
        self.audit.update_at(pipeline, step, index, &log.into())
    }

    fn finish_remediation(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        status: LogStatus,
    ) -> Result<(), EngineError> {
        let Some(mut found) = self.audit.scan(pipeline, step, |log| log.as_remediation().is_some())?
        else {
            tracing::warn!(%pipeline, step, "no remediation to finish");
            return Ok(());
        };
        found.log.set_status(status);
        self.audit.update_at(pipeline, step, found.index, &found.log)
    }
}

#[cfg(test)]
#[path = "deployment_tests.rs"]
mod tests;
