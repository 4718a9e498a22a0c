// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task plugins: workloads run by an external engine and watched to completion

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePlugin;

use async_trait::async_trait;
use keel_core::{EventInfo, WatchKey};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("no plugin registered for {0}")]
    Unknown(String),
    #[error("plugin request failed: {0}")]
    Request(String),
    #[error("invalid task payload: {0}")]
    InvalidPayload(String),
}

impl PluginError {
    /// An unregistered plugin may be registered by the next attempt
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PluginError::InvalidPayload(_))
    }
}

/// Where a plugin task was started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginTask {
    pub name: String,
    pub namespace: String,
}

#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    async fn create_and_deploy(
        &self,
        namespace: &str,
        payload: &str,
    ) -> Result<PluginTask, PluginError>;

    /// The completion event once the task has finished, `None` while it runs
    async fn check_status(&self, key: &WatchKey) -> Result<Option<EventInfo>, PluginError>;
}

/// Registry of plugins by name
#[derive(Clone, Default)]
pub struct Plugins {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl Plugins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    pub fn with(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.register(plugin);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Plugin>, PluginError> {
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::Unknown(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for Plugins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugins")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
