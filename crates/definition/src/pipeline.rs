// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated pipeline definitions

use crate::ParseError;
use keel_core::{PipelineGraph, StepData};
use regex::Regex;
use std::sync::LazyLock;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("constant regex pattern is valid")
});

/// Whether `name` may be used for a pipeline, step or test
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// A pipeline whose names, clusters and step graph have been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDef {
    pub name: String,
    /// Default cluster for steps that name none
    pub cluster: String,
    /// Pin steps sharing a source to the revision their predecessor deployed
    pub revision_lock: bool,
    graph: PipelineGraph,
}

impl PipelineDef {
    pub(crate) fn new(
        name: String,
        cluster: String,
        revision_lock: bool,
        mut steps: Vec<StepData>,
    ) -> Result<Self, ParseError> {
        check_name("name", &name)?;
        for step in &mut steps {
            check_name("steps.name", &step.name)?;
            for test in &step.tests {
                check_name(&format!("steps.{}.tests.name", step.name), &test.name)?;
            }
            if step.cluster.is_empty() {
                if cluster.is_empty() {
                    return Err(ParseError::MissingField(format!("steps.{}.cluster", step.name)));
                }
                step.cluster = cluster.clone();
            }
        }
        Ok(Self {
            graph: PipelineGraph::build(steps)?,
            name,
            cluster,
            revision_lock,
        })
    }

    pub fn graph(&self) -> &PipelineGraph {
        &self.graph
    }

    pub fn steps(&self) -> &[StepData] {
        self.graph.steps()
    }

    pub fn step(&self, name: &str) -> Option<&StepData> {
        self.graph.step(name)
    }

    pub fn step_names(&self) -> Vec<String> {
        self.graph.step_names()
    }

    /// Distinct clusters the steps deploy to, in declaration order
    pub fn clusters(&self) -> Vec<&str> {
        let mut clusters: Vec<&str> = Vec::new();
        for step in self.steps() {
            if !clusters.contains(&step.cluster.as_str()) {
                clusters.push(&step.cluster);
            }
        }
        clusters
    }
}

fn check_name(field: &str, name: &str) -> Result<(), ParseError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ParseError::InvalidName {
            field: field.to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
