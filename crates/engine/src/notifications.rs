// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification results, correlated by request id

use crate::records::{decode_opt, encode};
use crate::EngineError;
use keel_core::{keys, Notification};
use keel_storage::DurableStore;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a producer waits for an agent to post a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(1),
            max_polls: 60,
        }
    }
}

#[derive(Clone)]
pub struct NotificationResults<S> {
    store: S,
    policy: WaitPolicy,
}

impl<S: DurableStore> NotificationResults<S> {
    pub fn new(store: S, policy: WaitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn post(&self, request_id: &str, notification: &Notification) -> Result<(), EngineError> {
        let key = keys::notification_result(request_id);
        self.store.set(&key, encode(&key, notification)?)?;
        tracing::info!(request_id, successful = notification.successful, "notification result posted");
        Ok(())
    }

    /// Read and remove a posted result
    pub fn take(&self, request_id: &str) -> Result<Option<Notification>, EngineError> {
        let key = keys::notification_result(request_id);
        let result = decode_opt(&key, self.store.get(&key)?)?;
        if result.is_some() {
            self.store.delete(&key)?;
        }
        Ok(result)
    }

    /// Wait for the result of `request_id`.
    ///
    /// Gives up after the policy's poll budget with a failed "not found"
    /// notification rather than an error.
    pub async fn wait(&self, request_id: &str) -> Result<Notification, EngineError> {
        tokio::time::sleep(self.policy.initial_delay).await;
        for _ in 0..self.policy.max_polls {
            if let Some(result) = self.take(request_id)? {
                return Ok(result);
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }
        if let Some(result) = self.take(request_id)? {
            return Ok(result);
        }
        tracing::warn!(request_id, "notification result never arrived");
        Ok(Notification::not_found())
    }
}

#[cfg(test)]
#[path = "notifications_tests.rs"]
mod tests;
