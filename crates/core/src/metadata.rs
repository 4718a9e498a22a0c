// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached source coordinates of a step's application

use serde::{Deserialize, Serialize};

fn default_revision() -> String {
    "main".to_string()
}

/// Where an application's manifests come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCoordinates {
    #[serde(default)]
    pub repo_url: String,
    #[serde(default = "default_revision")]
    pub target_revision: String,
    #[serde(default)]
    pub path: String,
}

impl Default for SourceCoordinates {
    fn default() -> Self {
        Self {
            repo_url: String::new(),
            target_revision: default_revision(),
            path: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMetadata {
    #[serde(default)]
    pub source: Option<SourceCoordinates>,
}

impl StepMetadata {
    /// True only when both sides have known, identical coordinates
    pub fn shares_source_with(&self, other: &StepMetadata) -> bool {
        match (&self.source, &other.source) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
