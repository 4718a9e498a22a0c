// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic completion checks over the watch map

use super::checkpoint::{load_checkpoint, pending_keys, write_checkpoint};
use super::{ReconcileConfig, ReconcileDeps};
use crate::EngineError;
use keel_adapters::{
    job_selector, DeploymentDriver, EventSink, HealthSource, JobSource, JOB_KIND,
};
use keel_core::{
    AppSnapshot, ApplicationEvent, EventInfo, EventMetadata, HealthStatus, ResourceStatus,
    SyncStatus, TestEvent, WatchId, WatchKey, WatchKind,
};
use keel_storage::DurableStore;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// What a check decided for one key
enum Outcome {
    Keep(WatchKey),
    Remove,
}

/// Owner of the watch map for one cluster
pub struct Ticker<H, J, E, D, S> {
    cluster: String,
    deps: ReconcileDeps<H, J, E, D, S>,
    config: ReconcileConfig,
    inbox: mpsc::Receiver<WatchKey>,
    watched: HashMap<WatchId, WatchKey>,
    /// Pending keys as last written; unchanged sets are not rewritten
    saved: Option<Vec<WatchKey>>,
}

impl<H, J, E, D, S> Ticker<H, J, E, D, S>
where
    H: HealthSource,
    J: JobSource,
    E: EventSink,
    D: DeploymentDriver,
    S: DurableStore,
{
    pub fn new(
        cluster: impl Into<String>,
        deps: ReconcileDeps<H, J, E, D, S>,
        config: ReconcileConfig,
        inbox: mpsc::Receiver<WatchKey>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            deps,
            config,
            inbox,
            watched: HashMap::new(),
            saved: None,
        }
    }

    /// Reload keys checkpointed by a previous process
    pub fn restore(&mut self) -> Result<usize, EngineError> {
        let saved = load_checkpoint(&self.deps.store, &self.cluster)?;
        let restored = saved.len();
        self.watched.extend(saved);
        tracing::info!(cluster = %self.cluster, restored, "watch map restored");
        Ok(restored)
    }

    pub fn watched(&self) -> &HashMap<WatchId, WatchKey> {
        &self.watched
    }

    /// Tick until cancelled, checkpointing on the way out
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut timer = tokio::time::interval(self.config.tick_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.checkpoint();
                    tracing::info!(cluster = %self.cluster, "reconciler stopped");
                    return;
                }
                _ = timer.tick() => self.tick().await,
            }
        }
    }

    /// One pass over every watched key
    pub async fn tick(&mut self) {
        let span = tracing::info_span!("reconcile.tick", cluster = %self.cluster);
        async {
            self.drain_inbox();
            let snapshot = self.fetch_snapshot().await;

            let mut ids: Vec<WatchId> = self.watched.keys().cloned().collect();
            ids.sort();
            for id in ids {
                let Some(key) = self.watched.get(&id).cloned() else {
                    continue;
                };
                let outcome = match key.kind.clone() {
                    WatchKind::App => Outcome::Keep(self.check_app(key, snapshot.as_deref()).await),
                    WatchKind::TestJob => self.check_test_job(key).await,
                    WatchKind::PluginTask { plugin } => self.check_plugin_task(key, &plugin).await,
                };
                match outcome {
                    Outcome::Keep(key) => {
                        self.watched.insert(id, key);
                    }
                    Outcome::Remove => {
                        self.watched.remove(&id);
                        tracing::debug!(key = %id, "watch removed");
                    }
                }
            }
            self.checkpoint();
        }
        .instrument(span)
        .await
    }

    fn drain_inbox(&mut self) {
        let mut added = 0;
        while let Ok(key) = self.inbox.try_recv() {
            self.watched.insert(key.id(), key);
            added += 1;
        }
        if added > 0 {
            tracing::debug!(added, total = self.watched.len(), "watch keys added");
        }
    }

    fn checkpoint(&mut self) {
        let pending = pending_keys(&self.watched);
        if self.saved.as_ref() == Some(&pending) {
            return;
        }
        match write_checkpoint(&self.deps.store, &self.cluster, &pending) {
            Ok(()) => self.saved = Some(pending),
            Err(e) => tracing::warn!(cluster = %self.cluster, error = %e, "watch checkpoint failed"),
        }
    }

    /// `None` when every attempt failed; applications are skipped this tick
    async fn fetch_snapshot(&self) -> Option<Vec<AppSnapshot>> {
        for attempt in 1..=self.config.retry_limit {
            match self.deps.health.fetch_snapshot().await {
                Ok(snapshot) => return Some(snapshot),
                Err(e) => tracing::warn!(attempt, error = %e, "health snapshot failed"),
            }
        }
        None
    }

    async fn emit(&self, event: &EventInfo) -> bool {
        for attempt in 1..=self.config.retry_limit {
            match self.deps.sink.emit(event).await {
                Ok(()) => return true,
                Err(e) => tracing::warn!(attempt, event = event.name(), error = %e, "emit failed"),
            }
        }
        false
    }

    async fn check_app(&self, key: WatchKey, snapshot: Option<&[AppSnapshot]>) -> WatchKey {
        let Some(app) = snapshot
            .unwrap_or_default()
            .iter()
            .find(|a| a.name == key.name && a.namespace == key.namespace)
        else {
            return key;
        };
        if app.health == HealthStatus::Progressing {
            return key;
        }
        if app.sync == SyncStatus::Synced {
            self.check_synced_app(key, app).await
        } else {
            self.check_drifted_app(key, app).await
        }
    }

    /// A synced application reports its current state on every tick
    async fn check_synced_app(&self, mut key: WatchKey, app: &AppSnapshot) -> WatchKey {
        let revision = match self.deps.driver.get_current_revision(&key.name).await {
            Ok(revision) => revision,
            Err(e) => {
                tracing::warn!(app = %key.name, error = %e, "revision lookup failed");
                return key;
            }
        };
        let Some(resources) = self.resources(&key).await else {
            return key;
        };
        key.health = app.health;
        key.sync = app.sync;
        let event = application_event(&key, app, app.health, resources, revision);
        if self.emit(&event).await {
            key.generated_completion_event = true;
            tracing::info!(app = %key.name, health = %app.health, "application event emitted");
        }
        key
    }

    /// Out of sync: report a finished operation once, then report drift
    /// whenever health or sync changes. Drift reports leave the completion
    /// flag as it was.
    async fn check_drifted_app(&self, mut key: WatchKey, app: &AppSnapshot) -> WatchKey {
        let Some(resources) = self.resources(&key).await else {
            return key;
        };

        let mut completion = None;
        if !key.generated_completion_event {
            let operation = match self.deps.driver.get_operation_success(&key.name).await {
                Ok(operation) => operation,
                Err(e) => {
                    tracing::warn!(app = %key.name, error = %e, "operation lookup failed");
                    return key;
                }
            };
            if !operation.completed {
                return key;
            }
            let health = if operation.succeeded {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unknown
            };
            completion = Some(application_event(
                &key,
                app,
                health,
                resources.clone(),
                operation.revision,
            ));
        }

        let unchanged = key.health == app.health && key.sync == app.sync;
        key.health = app.health;
        key.sync = app.sync;

        match completion {
            Some(event) => {
                if self.emit(&event).await {
                    key.generated_completion_event = true;
                    tracing::info!(app = %key.name, "operation completion emitted");
                }
            }
            None if unchanged => {}
            None => {
                let event = application_event(&key, app, app.health, resources, String::new());
                if self.emit(&event).await {
                    tracing::info!(app = %key.name, health = %app.health, sync = %app.sync, "drift emitted");
                }
            }
        }
        key
    }

    async fn resources(&self, key: &WatchKey) -> Option<Vec<ResourceStatus>> {
        match self.deps.driver.get_app_resource_statuses(&key.name).await {
            Ok(resources) => Some(resources),
            Err(e) => {
                tracing::warn!(app = %key.name, error = %e, "resource status lookup failed");
                None
            }
        }
    }

    async fn check_test_job(&self, mut key: WatchKey) -> Outcome {
        if !key.generated_completion_event {
            let status = match self.deps.jobs.get_job_status(&key.name, &key.namespace).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(job = %key.name, error = %e, "job status failed");
                    return Outcome::Keep(key);
                }
            };
            if !status.is_done() {
                return Outcome::Keep(key);
            }
            let logs = match self
                .deps
                .jobs
                .get_logs(&key.namespace, &job_selector(&key.name))
                .await
            {
                Ok(logs) => logs,
                Err(e) => {
                    tracing::warn!(job = %key.name, error = %e, "job logs unavailable, retrying next tick");
                    return Outcome::Keep(key);
                }
            };
            let event = EventInfo::Test(TestEvent::for_key(&key, status.is_successful(), logs));
            if !self.emit(&event).await {
                return Outcome::Keep(key);
            }
            key.generated_completion_event = true;
            tracing::info!(job = %key.name, successful = status.is_successful(), "test event emitted");
        }

        for attempt in 1..=self.config.retry_limit {
            match self
                .deps
                .jobs
                .delete_job(&key.name, &key.namespace, JOB_KIND)
                .await
            {
                Ok(()) => return Outcome::Remove,
                Err(e) => tracing::warn!(job = %key.name, attempt, error = %e, "job cleanup failed"),
            }
        }
        Outcome::Keep(key)
    }

    async fn check_plugin_task(&self, key: WatchKey, plugin: &str) -> Outcome {
        if key.generated_completion_event {
            return Outcome::Remove;
        }
        let handler = match self.deps.plugins.get(plugin) {
            Ok(handler) => handler,
            Err(e) => {
                tracing::warn!(plugin, task = %key.name, error = %e, "plugin unavailable");
                return Outcome::Keep(key);
            }
        };
        let event = match handler.check_status(&key).await {
            Ok(Some(event)) => event,
            Ok(None) => return Outcome::Keep(key),
            Err(e) => {
                tracing::warn!(plugin, task = %key.name, error = %e, "plugin status check failed");
                return Outcome::Keep(key);
            }
        };
        if self.emit(&event).await {
            tracing::info!(plugin, task = %key.name, "plugin task event emitted");
            Outcome::Remove
        } else {
            Outcome::Keep(key)
        }
    }
}

fn application_event(
    key: &WatchKey,
    app: &AppSnapshot,
    health: HealthStatus,
    resources: Vec<ResourceStatus>,
    revision_hash: String,
) -> EventInfo {
    EventInfo::Application(ApplicationEvent {
        meta: EventMetadata::from(key),
        health,
        sync: app.sync,
        resources,
        app_name: key.name.clone(),
        app_namespace: key.namespace.clone(),
        operation: app.operation.clone(),
        project: app.project.clone(),
        repo: app.repo.clone(),
        revision_hash,
    })
}

#[cfg(test)]
#[path = "ticker_tests.rs"]
mod tests;
