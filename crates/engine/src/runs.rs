// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline run history, most recent first

use crate::audit::{PipelineRef, PAGE_SIZE};
use crate::records::{decode_all, decode_opt, encode};
use crate::EngineError;
use chrono::{DateTime, Utc};
use keel_core::PipelineRun;
use keel_storage::DurableStore;

#[derive(Clone)]
pub struct PipelineRuns<S> {
    store: S,
}

impl<S: DurableStore> PipelineRuns<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn start_run(
        &self,
        pipeline: &PipelineRef,
        uvn: &str,
        steps: Vec<String>,
        started_at: DateTime<Utc>,
    ) -> Result<PipelineRun, EngineError> {
        let run = PipelineRun::new(uvn, steps, started_at);
        let key = pipeline.runs_key();
        self.store.push_front(&key, encode(&key, &run)?)?;
        tracing::info!(%pipeline, uvn, steps = run.steps.len(), "run started");
        Ok(run)
    }

    /// Attach a processing error that belongs to no single step
    pub fn record_error(
        &self,
        pipeline: &PipelineRef,
        uvn: &str,
        error: &str,
    ) -> Result<(), EngineError> {
        let (index, mut run) = self
            .locate(pipeline, uvn)?
            .ok_or_else(|| EngineError::RunNotFound(uvn.to_string()))?;
        run.errors.push(error.to_string());
        let key = pipeline.runs_key();
        self.store.set_index(&key, index, encode(&key, &run)?)?;
        tracing::warn!(%pipeline, uvn, error, "processing error recorded");
        Ok(())
    }

    pub fn latest(&self, pipeline: &PipelineRef) -> Result<Option<PipelineRun>, EngineError> {
        let key = pipeline.runs_key();
        decode_opt(&key, self.store.head(&key)?)
    }

    /// Up to `count` most recent runs
    pub fn history(
        &self,
        pipeline: &PipelineRef,
        count: usize,
    ) -> Result<Vec<PipelineRun>, EngineError> {
        let mut runs = Vec::new();
        let mut page = 0;
        while runs.len() < count {
            let batch = self.page(pipeline, page)?;
            let exhausted = batch.len() < PAGE_SIZE;
            runs.extend(batch.into_iter().take(count - runs.len()));
            if exhausted {
                break;
            }
            page += 1;
        }
        Ok(runs)
    }

    pub fn find(&self, pipeline: &PipelineRef, uvn: &str) -> Result<Option<PipelineRun>, EngineError> {
        Ok(self.locate(pipeline, uvn)?.map(|(_, run)| run))
    }

    fn page(&self, pipeline: &PipelineRef, page: usize) -> Result<Vec<PipelineRun>, EngineError> {
        let key = pipeline.runs_key();
        let start = page * PAGE_SIZE;
        decode_all(&key, self.store.range(&key, start, start + PAGE_SIZE - 1)?)
    }

    fn locate(
        &self,
        pipeline: &PipelineRef,
        uvn: &str,
    ) -> Result<Option<(usize, PipelineRun)>, EngineError> {
        let mut page = 0;
        loop {
            let batch = self.page(pipeline, page)?;
            if let Some(i) = batch.iter().position(|run| run.uvn == uvn) {
                let index = page * PAGE_SIZE + i;
                return Ok(batch.into_iter().nth(i).map(|run| (index, run)));
            }
            if batch.len() < PAGE_SIZE {
                return Ok(None);
            }
            page += 1;
        }
    }
}

#[cfg(test)]
#[path = "runs_tests.rs"]
mod tests;
