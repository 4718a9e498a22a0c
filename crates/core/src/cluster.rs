// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster records and the no-deploy gate

use serde::{Deserialize, Serialize};

/// What an operator-applied deployment pause covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDeployScope {
    /// Every command for the cluster is held back
    Cluster,
    /// Only commands targeting this namespace are held back
    Namespace(String),
}

/// Deployment pause applied to a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoDeploy {
    pub scope: NoDeployScope,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub requested_by: String,
}

impl NoDeploy {
    pub fn whole_cluster(reason: impl Into<String>, requested_by: impl Into<String>) -> Self {
        Self {
            scope: NoDeployScope::Cluster,
            reason: reason.into(),
            requested_by: requested_by.into(),
        }
    }

    pub fn namespace(
        namespace: impl Into<String>,
        reason: impl Into<String>,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            scope: NoDeployScope::Namespace(namespace.into()),
            reason: reason.into(),
            requested_by: requested_by.into(),
        }
    }

    /// Build from an optional namespace; `None` or empty means the whole cluster
    pub fn for_scope(
        namespace: Option<&str>,
        reason: impl Into<String>,
        requested_by: impl Into<String>,
    ) -> Self {
        match namespace {
            Some(ns) if !ns.is_empty() => Self::namespace(ns, reason, requested_by),
            _ => Self::whole_cluster(reason, requested_by),
        }
    }

    pub fn is_whole_cluster(&self) -> bool {
        matches!(self.scope, NoDeployScope::Cluster)
    }

    /// Whether a command targeting `namespace` is withheld
    pub fn blocks(&self, namespace: &str) -> bool {
        match &self.scope {
            NoDeployScope::Cluster => true,
            NoDeployScope::Namespace(ns) => ns == namespace,
        }
    }
}

/// A registered deployment target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_deploy: Option<NoDeploy>,
}

impl ClusterRecord {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            no_deploy: None,
        }
    }

    /// True when all command delivery is paused
    pub fn is_paused(&self) -> bool {
        self.no_deploy.as_ref().is_some_and(NoDeploy::is_whole_cluster)
    }

    /// True when a command for `namespace` must stay queued
    pub fn blocks_namespace(&self, namespace: &str) -> bool {
        self.no_deploy.as_ref().is_some_and(|gate| gate.blocks(namespace))
    }
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod tests;
