// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, and the agent loops.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use keel_adapters::{
    HttpDriver, HttpEventSink, MetricsHealthSource, Plugins, TracedDeploymentDriver,
    TracedEventSink, TracedHealthSource, TracedJobSource,
};
use keel_core::{IdGen, UuidIdGen};
use keel_definition::PipelineDef;
use keel_engine::reconcile::{self, ReconcileDeps};
use keel_engine::{AgentDeps, CommandOutcome, CommandProcessor, Processed, ReconcileHandle};
use keel_storage::{DurableStore, KvStore, StoreError};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::server::{Handler, Intakes};

/// Request handler with the daemon's concrete store and ids
pub type DaemonHandler = Handler<KvStore, UuidIdGen>;

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    /// Handler cloned into every connection
    pub handler: DaemonHandler,
    /// Fires on SIGTERM/SIGINT or a `Shutdown` request; stops every loop
    pub cancel: CancellationToken,
    reconcilers: Vec<ReconcileHandle>,
    agents: Vec<JoinHandle<()>>,
}

impl DaemonState {
    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");
        self.cancel.cancel();

        // Agents finish their current delivery; tickers save a checkpoint
        for agent in self.agents.drain(..) {
            if let Err(e) = agent.await {
                warn!("Agent task failed: {}", e);
            }
        }
        for handle in self.reconcilers.drain(..) {
            handle.forwarder.abort();
            if let Err(e) = handle.ticker.await {
                warn!("Reconciler task failed: {}", e);
            }
        }

        for (path, what) in [
            (&self.config.socket_path, "socket"),
            (&self.config.lock_path, "PID"),
            (&self.config.version_path, "version"),
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove {} file: {}", what, e);
                }
            }
        }

        // Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Config not found at {0}: {1}")]
    ConfigNotFound(PathBuf, std::io::Error),

    #[error("Invalid config at {0}: {1}")]
    InvalidConfig(PathBuf, toml::de::Error),

    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pipeline definition error: {0}")]
    Definition(#[from] keel_definition::ParseError),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create directories
    for path in [&config.lock_path, &config.socket_path, &config.wal_path] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // 2. Acquire lock file FIRST - prevents races
    let lock_file = File::create(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    use std::io::Write;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // Write version file
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 3. Load definitions BEFORE binding socket (fail fast, don't accept connections if invalid)
    let definitions = load_definitions(config.settings.pipelines_dir.as_deref())?;

    // 4. Replay the store
    let store = KvStore::open(&config.wal_path)?;

    // 5. Set up adapters (wrapped with tracing for observability)
    let settings = &config.settings;
    let http_driver = HttpDriver::new(&settings.driver_url);
    let driver = TracedDeploymentDriver::new(http_driver.clone());
    let jobs = TracedJobSource::new(http_driver);
    let sink = TracedEventSink::new(HttpEventSink::new(&settings.sink_url));
    let health = TracedHealthSource::new(MetricsHealthSource::new(settings.metrics_url.as_str()));
    let plugins = Arc::new(Plugins::new());

    // 6. Start a reconciler per cluster, then an agent per org and cluster
    let cancel = CancellationToken::new();
    let mut reconcilers = Vec::new();
    let mut intakes = Intakes::new();
    for cluster in settings.cluster_names() {
        let handle = reconcile::spawn(
            &cluster,
            ReconcileDeps {
                health: health.clone(),
                jobs: jobs.clone(),
                sink: sink.clone(),
                driver: driver.clone(),
                plugins: Arc::clone(&plugins),
                store: store.clone(),
            },
            settings.reconcile,
            cancel.clone(),
        );
        intakes.insert(cluster, handle.intake.clone());
        reconcilers.push(handle);
    }

    let mut agents = Vec::new();
    for target in &settings.clusters {
        let Some(intake) = intakes.get(&target.name) else {
            continue;
        };
        let processor = CommandProcessor::new(
            &target.org,
            &target.name,
            AgentDeps {
                driver: driver.clone(),
                sink: sink.clone(),
                plugins: Arc::clone(&plugins),
                store: store.clone(),
                id_gen: UuidIdGen,
            },
            intake.clone(),
            settings.reconcile.retry_limit,
        );
        agents.push(tokio::spawn(run_agent(
            processor,
            settings.agent_poll_interval,
            cancel.clone(),
        )));
    }

    info!(
        "Loaded state: {} pipelines, {} clusters, {} agents",
        definitions.len(),
        reconcilers.len(),
        agents.len()
    );

    let handler = Handler::new(
        store,
        UuidIdGen,
        settings.notifications,
        definitions,
        intakes,
        cancel.clone(),
    );

    // 7. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = match UnixListener::bind(&config.socket_path) {
        Ok(listener) => listener,
        Err(e) => {
            cancel.cancel();
            return Err(LifecycleError::BindFailed(config.socket_path.clone(), e));
        }
    };

    info!("Daemon started for config: {}", config.config_path.display());

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        handler,
        cancel,
        reconcilers,
        agents,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    // Remove socket if we created it
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }

    // Remove version file
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }

    // Remove PID/lock file
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Load pipeline definitions, keyed by pipeline name
pub fn load_definitions(
    dir: Option<&Path>,
) -> Result<HashMap<String, PipelineDef>, LifecycleError> {
    let Some(dir) = dir else {
        return Ok(HashMap::new());
    };
    if !dir.exists() {
        warn!("Pipeline directory {} does not exist", dir.display());
        return Ok(HashMap::new());
    }
    Ok(keel_definition::load_dir(dir)?
        .into_iter()
        .map(|definition| (definition.name.clone(), definition))
        .collect())
}

/// Drive one cluster's queue until cancelled.
///
/// Work is taken back to back; an idle queue or a command sent back for
/// retry pauses the loop for `poll`.
pub async fn run_agent<D, E, S, I>(
    agent: CommandProcessor<D, E, S, I>,
    poll: Duration,
    cancel: CancellationToken,
) where
    D: keel_adapters::DeploymentDriver,
    E: keel_adapters::EventSink,
    S: DurableStore,
    I: IdGen,
{
    loop {
        let pause = match agent.process_next().await {
            Ok(Processed::Idle) => true,
            Ok(Processed::Command {
                outcome: CommandOutcome::Retried,
                ..
            }) => true,
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "agent step failed");
                true
            }
        };

        if !pause {
            if cancel.is_cancelled() {
                break;
            }
            continue;
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(poll) => {}
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
