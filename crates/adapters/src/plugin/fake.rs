// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake plugin for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Plugin, PluginError, PluginTask};
use async_trait::async_trait;
use keel_core::{EventInfo, TestEvent, WatchKey};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakePluginState {
    deployed: Vec<(String, String)>,
    checks: u32,
    finished: Option<bool>,
}

/// Plugin whose tasks finish when told to
#[derive(Clone)]
pub struct FakePlugin {
    name: String,
    inner: Arc<Mutex<FakePluginState>>,
}

impl FakePlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inner: Arc::default(),
        }
    }

    /// Report the task as finished from the next status check
    pub fn finish(&self, successful: bool) {
        self.lock().finished = Some(successful);
    }

    /// `(namespace, payload)` of every started task
    pub fn deployed(&self) -> Vec<(String, String)> {
        self.lock().deployed.clone()
    }

    pub fn checks(&self) -> u32 {
        self.lock().checks
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakePluginState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Plugin for FakePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_and_deploy(
        &self,
        namespace: &str,
        payload: &str,
    ) -> Result<PluginTask, PluginError> {
        let mut inner = self.lock();
        inner
            .deployed
            .push((namespace.to_string(), payload.to_string()));
        Ok(PluginTask {
            name: format!("{}-task-{}", self.name, inner.deployed.len()),
            namespace: namespace.to_string(),
        })
    }

    async fn check_status(&self, key: &WatchKey) -> Result<Option<EventInfo>, PluginError> {
        let mut inner = self.lock();
        inner.checks += 1;
        Ok(inner.finished.map(|successful| {
            EventInfo::Test(TestEvent::for_key(key, successful, "task finished"))
        }))
    }
}
