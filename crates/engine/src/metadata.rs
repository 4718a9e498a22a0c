// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached step source coordinates and the cross-step revision lock

use crate::audit::{AuditLog, PipelineRef};
use crate::records::{decode_opt, encode};
use crate::EngineError;
use keel_core::{Log, PipelineGraph, SourceCoordinates, StepMetadata};
use keel_storage::DurableStore;
use serde::Deserialize;

#[derive(Deserialize)]
struct Manifest {
    spec: ManifestSpec,
}

#[derive(Deserialize)]
struct ManifestSpec {
    source: ManifestSource,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestSource {
    #[serde(rename = "repoURL", default)]
    repo_url: String,
    #[serde(default)]
    target_revision: Option<String>,
    #[serde(default)]
    path: String,
}

/// Read `spec.source` out of an application manifest
pub fn source_from_manifest(manifest: &str) -> Result<SourceCoordinates, EngineError> {
    let parsed: Manifest =
        serde_yaml::from_str(manifest).map_err(|e| EngineError::InvalidManifest(e.to_string()))?;
    let source = parsed.spec.source;
    let mut coords = SourceCoordinates {
        repo_url: source.repo_url,
        path: source.path,
        ..SourceCoordinates::default()
    };
    if let Some(revision) = source.target_revision.filter(|r| !r.is_empty()) {
        coords.target_revision = revision;
    }
    Ok(coords)
}

#[derive(Clone)]
pub struct MetadataHandler<S> {
    store: S,
    audit: AuditLog<S>,
}

impl<S: DurableStore> MetadataHandler<S> {
    pub fn new(store: S) -> Self {
        Self {
            audit: AuditLog::new(store.clone()),
            store,
        }
    }

    pub fn get(&self, pipeline: &PipelineRef, step: &str) -> Result<StepMetadata, EngineError> {
        let key = pipeline.step_metadata_key(step);
        Ok(decode_opt(&key, self.store.get(&key)?)?.unwrap_or_default())
    }

    /// Cache the manifest's source for `step`; returns whether it changed
    pub fn assert_source(
        &self,
        pipeline: &PipelineRef,
        step: &str,
        manifest: &str,
    ) -> Result<bool, EngineError> {
        let metadata = StepMetadata {
            source: Some(source_from_manifest(manifest)?),
        };
        if self.get(pipeline, step)? == metadata {
            return Ok(false);
        }
        let key = pipeline.step_metadata_key(step);
        self.store.set(&key, encode(&key, &metadata)?)?;
        tracing::debug!(%pipeline, step, "step source updated");
        Ok(true)
    }

    /// Revision hash a step must deploy to stay in line with an earlier
    /// step built from the same source.
    pub fn revision_lock(
        &self,
        pipeline: &PipelineRef,
        graph: &PipelineGraph,
        step: &str,
    ) -> Result<Option<String>, EngineError> {
        let own = self.get(pipeline, step)?;
        for sibling in graph.preceding_steps(step) {
            if !own.shares_source_with(&self.get(pipeline, &sibling)?) {
                continue;
            }
            let locked = self
                .audit
                .latest_deployment(pipeline, &sibling)?
                .and_then(|found| match found.log {
                    Log::Deployment(log) => Some(log.revision_hash),
                    Log::Remediation(_) => None,
                })
                .filter(|hash| !hash.is_empty());
            if let Some(hash) = &locked {
                tracing::debug!(%pipeline, step, sibling = %sibling, hash = %hash, "revision locked");
            }
            return Ok(locked);
        }
        Ok(None)
    }

    /// Other steps of the graph whose cached source equals `step`'s
    pub fn steps_with_same_source(
        &self,
        pipeline: &PipelineRef,
        graph: &PipelineGraph,
        step: &str,
    ) -> Result<Vec<String>, EngineError> {
        let own = self.get(pipeline, step)?;
        let mut same = Vec::new();
        for other in graph.step_names() {
            if other != step && own.shares_source_with(&self.get(pipeline, &other)?) {
                same.push(other);
            }
        }
        Ok(same)
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
