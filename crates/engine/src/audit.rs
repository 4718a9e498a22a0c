// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-step audit log chains
//!
//! Each step's log is a most-recent-first list in the store. Readers walk it
//! in pages of [`PAGE_SIZE`] entries so long histories are never loaded whole.

use crate::records::{decode_all, decode_opt, encode};
use crate::EngineError;
use keel_core::{keys, Log};
use keel_storage::DurableStore;
use serde::{Deserialize, Serialize};

/// Entries fetched per page when scanning a step's history
pub const PAGE_SIZE: usize = 15;

/// Identifies one pipeline of one team
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineRef {
    pub org: String,
    pub team: String,
    pub pipeline: String,
}

impl PipelineRef {
    pub fn new(org: impl Into<String>, team: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            team: team.into(),
            pipeline: pipeline.into(),
        }
    }

    pub fn step_logs_key(&self, step: &str) -> String {
        keys::step_logs(&self.org, &self.team, &self.pipeline, step)
    }

    pub fn step_metadata_key(&self, step: &str) -> String {
        keys::step_metadata(&self.org, &self.team, &self.pipeline, step)
    }

    pub fn runs_key(&self) -> String {
        keys::pipeline_runs(&self.org, &self.team, &self.pipeline)
    }
}

impl std::fmt::Display for PipelineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.org, self.team, self.pipeline)
    }
}

/// A log entry together with its position in the step's list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub index: usize,
    pub log: Log,
}

#[derive(Clone)]
pub struct AuditLog<S> {
    store: S,
}

impl<S: DurableStore> AuditLog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Push a new most-recent entry
    pub fn append_log(&self, pipeline: &PipelineRef, step: &str, log: &Log) -> Result<(), EngineError> {
        let key = pipeline.step_logs_key(step);
        self.store.push_front(&key, encode(&key, log)?)?;
        tracing::debug!(%pipeline, step, uvn = log.pipeline_uvn(), status = ?log.status(), "log appended");
        Ok(())
    }

    /// Replace the most recent entry
    pub fn update_head(&self, pipeline: &PipelineRef, step: &str, log: &Log) -> Result<(), EngineError> {
        self.update_at(pipeline, step, 0, log)
    }

    /// Replace the entry at `index`, counted from the most recent
    pub fn update_at(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        index: usize,
        log: &Log,
    ) -> Result<(), EngineError> {
        let key = pipeline.step_logs_key(step);
        self.store.set_index(&key, index, encode(&key, log)?)?;
        Ok(())
    }

    pub fn head(&self, pipeline: &PipelineRef, step: &str) -> Result<Option<Log>, EngineError> {
        let key = pipeline.step_logs_key(step);
        decode_opt(&key, self.store.head(&key)?)
    }

    /// Page `page` of the step's history, most recent first
    pub fn page(&self, pipeline: &PipelineRef, step: &str, page: usize) -> Result<Vec<Log>, EngineError> {
        let key = pipeline.step_logs_key(step);
        let start = page * PAGE_SIZE;
        decode_all(&key, self.store.range(&key, start, start + PAGE_SIZE - 1)?)
    }

    /// The `count` most recent entries
    pub fn recent(&self, pipeline: &PipelineRef, step: &str, count: usize) -> Result<Vec<Log>, EngineError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let key = pipeline.step_logs_key(step);
        decode_all(&key, self.store.range(&key, 0, count - 1)?)
    }

    /// First entry, most recent first, at or after `from` matching `pred`
    pub fn scan_from(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        from: usize,
        mut pred: impl FnMut(&Log) -> bool,
    ) -> Result<Option<Located>, EngineError> {
        let mut page = from / PAGE_SIZE;
        let mut offset = from % PAGE_SIZE;
        loop {
            let logs = self.page(pipeline, step, page)?;
            for (i, log) in logs.iter().enumerate().skip(offset) {
                if pred(log) {
                    return Ok(Some(Located {
                        index: page * PAGE_SIZE + i,
                        log: log.clone(),
                    }));
                }
            }
            if logs.len() < PAGE_SIZE {
                return Ok(None);
            }
            page += 1;
            offset = 0;
        }
    }

    pub fn scan(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        pred: impl FnMut(&Log) -> bool,
    ) -> Result<Option<Located>, EngineError> {
        self.scan_from(pipeline, step, 0, pred)
    }

    /// Most recent entry belonging to run `uvn`
    pub fn latest_for_run(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        uvn: &str,
    ) -> Result<Option<Located>, EngineError> {
        self.scan(pipeline, step, |log| log.pipeline_uvn() == uvn)
    }

    /// Most recent deployment entry of any run
    pub fn latest_deployment(
        &self,
        pipeline: &PipelineRef,
        step: &str,
    ) -> Result<Option<Located>, EngineError> {
        self.scan(pipeline, step, |log| log.as_deployment().is_some())
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
