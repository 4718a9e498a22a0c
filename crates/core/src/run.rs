// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline run records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One execution of a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub uvn: String,
    /// Steps in execution order at the time the run started
    pub steps: Vec<String>,
    /// Processing errors not attributable to a step
    #[serde(default)]
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn new(uvn: impl Into<String>, steps: Vec<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            uvn: uvn.into(),
            steps,
            errors: Vec::new(),
            started_at,
        }
    }
}
