// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step dependency graph for a pipeline
//!
//! Steps without dependencies hang off a synthetic [`ROOT_STEP`]. The graph
//! is validated on construction (no duplicates, no unknown dependencies, no
//! cycles) and is immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Synthetic parent of every step that declares no dependencies
pub const ROOT_STEP: &str = "ROOT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDef {
    pub name: String,
    pub path: String,
    /// Run before the application is deployed instead of after
    #[serde(default)]
    pub before: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepData {
    pub name: String,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub app_path: String,
    #[serde(default)]
    pub other_deployments_path: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub tests: Vec<TestDef>,
    #[serde(default)]
    pub remediation_limit: u32,
    #[serde(default)]
    pub rollback_limit: u32,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl StepData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn depends_on(mut self, parents: &[&str]) -> Self {
        self.dependencies = parents.iter().map(|p| p.to_string()).collect();
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate step: {0}")]
    DuplicateStep(String),
    #[error("step {step} depends on unknown step {dependency}")]
    UnknownDependency { step: String, dependency: String },
    #[error("dependency cycle involving step {0}")]
    Cycle(String),
    #[error("step name {0} is reserved")]
    ReservedName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineGraph {
    steps: Vec<StepData>,
    parents: HashMap<String, Vec<String>>,
    children: HashMap<String, Vec<String>>,
}

impl PipelineGraph {
    pub fn build(steps: Vec<StepData>) -> Result<Self, GraphError> {
        let mut names = HashSet::new();
        for step in &steps {
            if step.name == ROOT_STEP {
                return Err(GraphError::ReservedName(step.name.clone()));
            }
            if !names.insert(step.name.as_str()) {
                return Err(GraphError::DuplicateStep(step.name.clone()));
            }
        }

        let mut parents: HashMap<String, Vec<String>> = HashMap::new();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for step in &steps {
            let deps = if step.dependencies.is_empty() {
                vec![ROOT_STEP.to_string()]
            } else {
                step.dependencies.clone()
            };
            for dep in &deps {
                if dep != ROOT_STEP && !names.contains(dep.as_str()) {
                    return Err(GraphError::UnknownDependency {
                        step: step.name.clone(),
                        dependency: dep.clone(),
                    });
                }
                children
                    .entry(dep.clone())
                    .or_default()
                    .push(step.name.clone());
            }
            parents.insert(step.name.clone(), deps);
        }

        let graph = Self {
            steps,
            parents,
            children,
        };

        let ordered = graph.ordered_steps();
        if ordered.len() != graph.steps.len() {
            let placed: HashSet<&str> = ordered.iter().map(String::as_str).collect();
            let stuck = graph
                .steps
                .iter()
                .find(|s| !placed.contains(s.name.as_str()))
                .map(|s| s.name.clone())
                .unwrap_or_default();
            return Err(GraphError::Cycle(stuck));
        }
        Ok(graph)
    }

    pub fn steps(&self) -> &[StepData] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&StepData> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    /// Direct parents of a step; [`ROOT_STEP`] for steps without dependencies
    pub fn parents(&self, name: &str) -> &[String] {
        self.parents.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn children(&self, name: &str) -> &[String] {
        self.children.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Execution order: a step is placed only after all of its parents.
    ///
    /// Expansion starts at the root's children; ties break by first-seen order.
    pub fn ordered_steps(&self) -> Vec<String> {
        let mut placed: HashSet<&str> = HashSet::from([ROOT_STEP]);
        let mut order = Vec::with_capacity(self.steps.len());
        let mut queue: VecDeque<&str> = self.children(ROOT_STEP).iter().map(String::as_str).collect();

        while let Some(step) = queue.pop_front() {
            if placed.contains(step) {
                continue;
            }
            // Re-queued by whichever parent is placed last
            if !self.parents(step).iter().all(|p| placed.contains(p.as_str())) {
                continue;
            }
            placed.insert(step);
            order.push(step.to_string());
            for child in self.children(step) {
                if !placed.contains(child.as_str()) {
                    queue.push_back(child);
                }
            }
        }
        order
    }

    /// Steps visited by a breadth-first walk from the root before `step` is
    /// first reached. Empty if the step is unknown.
    pub fn preceding_steps(&self, step: &str) -> Vec<String> {
        if !self.contains(step) {
            return Vec::new();
        }
        let mut seen: HashSet<&str> = HashSet::from([ROOT_STEP]);
        let mut visited = Vec::new();
        let mut queue: VecDeque<&str> = self.children(ROOT_STEP).iter().map(String::as_str).collect();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if current == step {
                break;
            }
            visited.push(current.to_string());
            queue.extend(self.children(current).iter().map(String::as_str));
        }
        visited
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
