// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline definition TOML parsing

use crate::PipelineDef;
use keel_core::{GraphError, StepData};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading pipeline definitions
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("invalid {field}: {name:?}")]
    InvalidName { field: String, name: String },
    #[error("invalid step graph: {0}")]
    Graph(#[from] GraphError),
    #[error("duplicate pipeline: {0}")]
    DuplicatePipeline(String),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        source: Box<ParseError>,
    },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPipeline {
    name: String,
    #[serde(default)]
    cluster: String,
    #[serde(default)]
    revision_lock: bool,
    #[serde(default)]
    steps: Vec<StepData>,
}

/// Parse one pipeline definition from TOML content
pub fn parse_pipeline(content: &str) -> Result<PipelineDef, ParseError> {
    let raw: RawPipeline = toml::from_str(content)?;
    PipelineDef::new(raw.name, raw.cluster, raw.revision_lock, raw.steps)
}

/// Load every `*.toml` definition in `dir`, sorted by file name.
///
/// Pipeline names must be unique across the directory.
pub fn load_dir(dir: &Path) -> Result<Vec<PipelineDef>, ParseError> {
    let io_err = |source| ParseError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut names = HashSet::new();
    let mut pipelines = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path).map_err(|source| ParseError::Io {
            path: path.clone(),
            source,
        })?;
        let pipeline = parse_pipeline(&content).map_err(|e| ParseError::InFile {
            path: path.clone(),
            source: Box::new(e),
        })?;
        if !names.insert(pipeline.name.clone()) {
            return Err(ParseError::DuplicatePipeline(pipeline.name));
        }
        pipelines.push(pipeline);
    }
    Ok(pipelines)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
