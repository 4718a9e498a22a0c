// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation loop: polls watched entities until they complete
//!
//! Two tasks joined by a bounded channel. The forwarder buffers incoming
//! watch keys until a batch ends, then feeds them to the ticker. The ticker
//! owns the watch map and polls every entry on a fixed interval.

mod checkpoint;
mod forwarder;
mod ticker;

pub use checkpoint::{load_checkpoint, save_checkpoint};
pub use forwarder::run_forwarder;
pub use ticker::Ticker;

use keel_adapters::Plugins;
use keel_core::WatchMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// Attempts per external call before the tick moves on
    pub retry_limit: u32,
    /// Keys the forwarder may hand over before it blocks
    pub channel_capacity: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            retry_limit: 3,
            channel_capacity: 100,
        }
    }
}

/// Adapters the ticker polls and reports through
pub struct ReconcileDeps<H, J, E, D, S> {
    pub health: H,
    pub jobs: J,
    pub sink: E,
    pub driver: D,
    pub plugins: Arc<Plugins>,
    pub store: S,
}

/// Running loop for one cluster
pub struct ReconcileHandle {
    pub intake: mpsc::Sender<WatchMessage>,
    pub forwarder: JoinHandle<()>,
    pub ticker: JoinHandle<()>,
}

/// Spawn the forwarder and ticker for `cluster`.
///
/// The ticker resumes from the cluster's checkpoint and stops when `cancel`
/// fires; the forwarder stops once every intake sender is dropped.
pub fn spawn<H, J, E, D, S>(
    cluster: &str,
    deps: ReconcileDeps<H, J, E, D, S>,
    config: ReconcileConfig,
    cancel: CancellationToken,
) -> ReconcileHandle
where
    H: keel_adapters::HealthSource,
    J: keel_adapters::JobSource,
    E: keel_adapters::EventSink,
    D: keel_adapters::DeploymentDriver,
    S: keel_storage::DurableStore,
{
    let (intake, intake_rx) = mpsc::channel(config.channel_capacity);
    let (keys_tx, keys_rx) = mpsc::channel(config.channel_capacity);

    let forwarder = tokio::spawn(run_forwarder(intake_rx, keys_tx));
    let mut ticker = Ticker::new(cluster, deps, config, keys_rx);
    if let Err(e) = ticker.restore() {
        tracing::warn!(cluster, error = %e, "watch checkpoint not restored");
    }
    let ticker = tokio::spawn(async move { ticker.run(cancel).await });

    ReconcileHandle {
        intake,
        forwarder,
        ticker,
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
