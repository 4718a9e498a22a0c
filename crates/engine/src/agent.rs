// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution agent: acts on the deliveries queued for one cluster
//!
//! Each call to [`CommandProcessor::process_next`] peeks one delivery,
//! performs it against the deployment driver or a plugin, and settles the
//! queue. Commands that leave something running hand a watch batch to the
//! reconciler.

use crate::notifications::{NotificationResults, WaitPolicy};
use crate::queue::CommandQueue;
use crate::EngineError;
use keel_adapters::{
    DeployResult, DeploymentDriver, DriverError, EventSink, PluginError, Plugins,
};
use keel_core::{
    audit_label, CommandEvent, CommandMetadata, CommandPacket, Delivery, DeployKind, EventInfo,
    EventMetadata, FailureEvent, IdGen, Notification, NotificationPacket, NotificationRequest,
    WatchKey, WatchKind, WatchMessage,
};
use keel_storage::DurableStore;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Test number carried by watch keys of a rollback
pub const ROLLBACK_TEST_NUMBER: i32 = -1;

/// Failure code of a command that used up its retries
pub const RETRIES_EXHAUSTED: &str = "RetriesExhausted";
/// Failure code of a command that can never succeed as sent
pub const NON_RETRYABLE: &str = "NonRetryable";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error("watch intake closed")]
    WatchIntakeClosed,
}

impl DispatchError {
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchError::Driver(e) => e.is_retryable(),
            DispatchError::Plugin(e) => e.is_retryable(),
            DispatchError::WatchIntakeClosed => true,
        }
    }
}

/// How a command delivery was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Performed and acked
    Completed,
    /// Left at the head with one more retry counted
    Retried,
    /// Reported as a failure event and acked
    Failed,
}

/// Result of one `process_next` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    Idle,
    Command {
        command: &'static str,
        outcome: CommandOutcome,
    },
    Notification {
        request_id: String,
        successful: bool,
    },
}

/// Agent adapter dependencies
pub struct AgentDeps<D, E, S, I> {
    pub driver: D,
    pub sink: E,
    pub plugins: Arc<Plugins>,
    pub store: S,
    pub id_gen: I,
}

pub struct CommandProcessor<D, E, S, I> {
    org: String,
    cluster: String,
    driver: D,
    sink: E,
    plugins: Arc<Plugins>,
    queue: CommandQueue<S, I>,
    results: NotificationResults<S>,
    watches: mpsc::Sender<WatchMessage>,
    retry_limit: u32,
}

impl<D, E, S, I> CommandProcessor<D, E, S, I>
where
    D: DeploymentDriver,
    E: EventSink,
    S: DurableStore,
    I: IdGen,
{
    pub fn new(
        org: impl Into<String>,
        cluster: impl Into<String>,
        deps: AgentDeps<D, E, S, I>,
        watches: mpsc::Sender<WatchMessage>,
        retry_limit: u32,
    ) -> Self {
        Self {
            org: org.into(),
            cluster: cluster.into(),
            driver: deps.driver,
            sink: deps.sink,
            plugins: deps.plugins,
            queue: CommandQueue::new(deps.store.clone(), deps.id_gen),
            results: NotificationResults::new(deps.store, WaitPolicy::default()),
            watches,
            retry_limit: retry_limit.max(1),
        }
    }

    /// Peek the next delivery, perform it and settle the queue.
    ///
    /// Returns an error only when the store fails, or when a failure event
    /// could not be delivered; the head then stays for the next call.
    pub async fn process_next(&self) -> Result<Processed, EngineError> {
        match self.queue.peek(&self.org, &self.cluster)? {
            None => Ok(Processed::Idle),
            Some(Delivery::Notification(packet)) => self.process_notification(packet).await,
            Some(Delivery::Command(packet)) => {
                let command = packet.command.name();
                let span = tracing::info_span!(
                    "agent.command",
                    org = %self.org,
                    cluster = %self.cluster,
                    command,
                    step = %packet.command.metadata().step,
                );
                let outcome = self.settle_command(&packet).instrument(span).await?;
                Ok(Processed::Command { command, outcome })
            }
        }
    }

    async fn settle_command(&self, packet: &CommandPacket) -> Result<CommandOutcome, EngineError> {
        let meta = packet.command.metadata();
        let error = match self.dispatch(packet).await {
            Ok(()) => {
                self.queue.ack_head(&self.org, &self.cluster)?;
                return Ok(CommandOutcome::Completed);
            }
            Err(e) => e,
        };

        if error.is_retryable() && !meta.final_try {
            tracing::warn!(retry_count = packet.retry_count, error = %error, "command failed, retrying");
            self.queue.retry_head(&self.org, &self.cluster)?;
            return Ok(CommandOutcome::Retried);
        }

        let status_code = if error.is_retryable() {
            RETRIES_EXHAUSTED
        } else {
            NON_RETRYABLE
        };
        tracing::error!(status_code, error = %error, "command failed");
        let event = EventInfo::Failure(FailureEvent {
            meta: EventMetadata::from(meta),
            status_code: status_code.to_string(),
            error: error.to_string(),
        });
        self.emit(&event).await?;
        self.queue.ack_head(&self.org, &self.cluster)?;
        Ok(CommandOutcome::Failed)
    }

    async fn dispatch(&self, packet: &CommandPacket) -> Result<(), DispatchError> {
        let namespace = packet.namespace.as_str();
        match &packet.command {
            CommandEvent::Deploy {
                kind,
                revision_hash,
                payload,
                ..
            } => {
                self.deploy(kind, namespace, payload, revision_hash).await?;
            }
            CommandEvent::DeployAndWatch {
                meta,
                kind,
                revision_hash,
                payload,
                watch,
                test_number,
            } => {
                let result = self.deploy(kind, namespace, payload, revision_hash).await?;
                let key = watch_key(watch, meta, result, namespace).with_test_number(*test_number);
                self.submit_watch(key).await?;
            }
            CommandEvent::DeleteByConfig { payload, .. } => {
                self.driver.delete_by_config(namespace, payload).await?;
            }
            CommandEvent::DeleteByGvk { resource, .. } => {
                self.driver.delete_by_gvk(resource).await?;
            }
            CommandEvent::RollbackAndWatch {
                meta,
                app_name,
                revision_hash,
                watch,
            } => {
                let result = self.driver.rollback(app_name, revision_hash).await?;
                let key = watch_key(watch, meta, result, namespace)
                    .with_test_number(ROLLBACK_TEST_NUMBER);
                self.submit_watch(key).await?;
            }
            CommandEvent::SelectiveSync {
                app_name,
                revision_hash,
                resources,
                ..
            } => {
                self.driver
                    .selective_sync(app_name, revision_hash, resources)
                    .await?;
            }
            CommandEvent::DeployNamedApp { app_name, .. } => {
                self.driver.sync(app_name).await?;
            }
            CommandEvent::DeployNamedAppAndWatch {
                meta,
                app_name,
                watch,
            } => {
                let result = self.driver.sync(app_name).await?;
                self.submit_watch(watch_key(watch, meta, result, namespace))
                    .await?;
            }
        }
        Ok(())
    }

    async fn deploy(
        &self,
        kind: &DeployKind,
        namespace: &str,
        payload: &str,
        revision_hash: &str,
    ) -> Result<DeployResult, DispatchError> {
        match kind {
            DeployKind::Plugin(name) => {
                let task = self
                    .plugins
                    .get(name)?
                    .create_and_deploy(namespace, payload)
                    .await?;
                tracing::info!(plugin = %name, task = %task.name, "plugin task started");
                Ok(DeployResult {
                    app_name: task.name,
                    namespace: task.namespace,
                    revision_hash: String::new(),
                })
            }
            _ => Ok(self
                .driver
                .deploy(kind, namespace, payload, revision_hash)
                .await?),
        }
    }

    /// Hand one key to the reconciler as a complete batch
    async fn submit_watch(&self, key: WatchKey) -> Result<(), DispatchError> {
        tracing::info!(name = %key.name, namespace = %key.namespace, "watch submitted");
        self.watches
            .send(WatchMessage::Key(key))
            .await
            .map_err(|_| DispatchError::WatchIntakeClosed)?;
        self.watches
            .send(WatchMessage::EndOfBatch)
            .await
            .map_err(|_| DispatchError::WatchIntakeClosed)
    }

    async fn emit(&self, event: &EventInfo) -> Result<(), EngineError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.sink.emit(event).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= self.retry_limit => return Err(e.into()),
                Err(e) => tracing::warn!(attempt, event = event.name(), error = %e, "emit failed"),
            }
        }
    }

    async fn process_notification(
        &self,
        packet: NotificationPacket,
    ) -> Result<Processed, EngineError> {
        let request = packet.request.name();
        let mut attempt = 0;
        let notification = loop {
            attempt += 1;
            match self.handle_notification(&packet.request).await {
                Ok(body) => break Notification::ok(body),
                Err(e) if attempt >= self.retry_limit || !e.is_retryable() => {
                    tracing::warn!(request, request_id = %packet.request_id, error = %e, "notification failed");
                    break Notification::failed(e.to_string());
                }
                Err(e) => tracing::warn!(request, attempt, error = %e, "notification attempt failed"),
            }
        };

        self.results.post(&packet.request_id, &notification)?;
        self.queue.ack_notification_head(&self.org, &self.cluster)?;
        Ok(Processed::Notification {
            request_id: packet.request_id,
            successful: notification.successful,
        })
    }

    async fn handle_notification(
        &self,
        request: &NotificationRequest,
    ) -> Result<serde_json::Value, DriverError> {
        match request {
            NotificationRequest::MarkNoDeploy {
                cluster,
                namespace,
                apply,
            } => {
                self.driver
                    .mark_no_deploy(cluster, namespace.as_deref(), *apply)
                    .await?;
                Ok(serde_json::Value::Null)
            }
            NotificationRequest::Label {
                team,
                pipeline,
                resources,
            } => {
                self.driver
                    .label_resources(&audit_label(team, pipeline), resources)
                    .await?;
                Ok(serde_json::Value::Null)
            }
            NotificationRequest::Aggregate { cluster, namespace } => {
                self.driver
                    .aggregate_resources(cluster, namespace.as_deref())
                    .await
            }
            NotificationRequest::DeleteByLabel {
                team,
                pipeline,
                namespace,
            } => {
                self.driver
                    .delete_by_label(&audit_label(team, pipeline), namespace)
                    .await?;
                Ok(serde_json::Value::Null)
            }
        }
    }
}

/// Key for whatever a command left running; drivers may omit the namespace
fn watch_key(
    watch: &WatchKind,
    meta: &CommandMetadata,
    result: DeployResult,
    namespace: &str,
) -> WatchKey {
    let namespace = if result.namespace.is_empty() {
        namespace.to_string()
    } else {
        result.namespace
    };
    WatchKey::new(watch.clone(), meta, result.app_name, namespace)
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
