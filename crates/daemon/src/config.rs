// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: `keel.toml` and the state paths derived from it

use std::path::{Path, PathBuf};
use std::time::Duration;

use keel_engine::{ReconcileConfig, WaitPolicy};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::lifecycle::LifecycleError;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "KEEL_CONFIG";

/// Environment variable overriding the socket directory
pub const SOCKET_DIR_ENV: &str = "KEEL_SOCKET_DIR";

/// Config file used when neither the environment nor the arguments name one
pub const DEFAULT_CONFIG_FILE: &str = "keel.toml";

/// A cluster this daemon runs an agent and a reconciler for
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClusterTarget {
    pub org: String,
    pub name: String,
}

/// Contents of `keel.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Metrics endpoint scraped for application health
    pub metrics_url: String,
    /// Where completion and failure events are posted
    pub sink_url: String,
    /// Deployment driver sidecar
    pub driver_url: String,
    /// Directory of pipeline definitions, relative to the config file
    #[serde(default)]
    pub pipelines_dir: Option<PathBuf>,
    /// Pause between agent polls of an idle queue
    #[serde(default = "default_agent_poll", with = "humantime_serde")]
    pub agent_poll_interval: Duration,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub notifications: WaitPolicy,
    #[serde(default)]
    pub clusters: Vec<ClusterTarget>,
}

fn default_agent_poll() -> Duration {
    Duration::from_secs(1)
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Distinct cluster names, in declaration order
    pub fn cluster_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for target in &self.clusters {
            if !names.contains(&target.name) {
                names.push(target.name.clone());
            }
        }
        names
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical path of the config file
    pub config_path: PathBuf,
    pub settings: Settings,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the store WAL
    pub wal_path: PathBuf,
}

impl Config {
    /// Config file named by `KEEL_CONFIG`, else by the first argument, else `keel.toml`
    pub fn locate(args: &[String]) -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        args.get(1)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load the config file and derive state paths from its location
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let canonical = path
            .canonicalize()
            .map_err(|e| LifecycleError::ConfigNotFound(path.to_path_buf(), e))?;
        let content = std::fs::read_to_string(&canonical)?;
        let mut settings = Settings::parse(&content)
            .map_err(|e| LifecycleError::InvalidConfig(canonical.clone(), e))?;

        if let (Some(dir), Some(base)) = (&settings.pipelines_dir, canonical.parent()) {
            if dir.is_relative() {
                settings.pipelines_dir = Some(base.join(dir));
            }
        }

        let hash = config_hash(&canonical);
        let state_dir = state_dir()?.join(&hash);
        Ok(Self::with_paths(canonical, settings, &state_dir, &socket_dir()?, &hash))
    }

    /// Lay out state files under `state_dir`, and the socket under `socket_dir`
    pub fn with_paths(
        config_path: PathBuf,
        settings: Settings,
        state_dir: &Path,
        socket_dir: &Path,
        name: &str,
    ) -> Self {
        Self {
            config_path,
            settings,
            socket_path: socket_dir.join(format!("{}.sock", name)),
            lock_path: state_dir.join("keeld.pid"),
            version_path: state_dir.join("keeld.version"),
            log_path: state_dir.join("keeld.log"),
            wal_path: state_dir.join("store").join("store.wal"),
        }
    }
}

/// State directory for keel: `$XDG_STATE_HOME/keel`, else `~/.local/state/keel`
fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("keel"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/keel"))
}

/// Socket directory, kept short for SUN_LEN
fn socket_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var(SOCKET_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    Ok(PathBuf::from("/tmp/keel"))
}

/// First 16 hex chars of the SHA-256 of the config path
fn config_hash(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let result = hasher.finalize();
    result[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
