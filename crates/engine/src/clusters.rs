// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registered clusters and their no-deploy gates

use crate::records::{decode, decode_opt, encode};
use crate::EngineError;
use keel_core::{keys, ClusterRecord, NoDeploy};
use keel_storage::{DurableStore, Transaction};

#[derive(Clone)]
pub struct ClusterRegistry<S> {
    store: S,
}

impl<S: DurableStore> ClusterRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn create(&self, org: &str, record: &ClusterRecord) -> Result<(), EngineError> {
        let key = keys::cluster(org, &record.name);
        let watched = self.store.watch(&key)?;
        if watched.value.is_some() {
            return Err(EngineError::ClusterExists {
                org: org.to_string(),
                cluster: record.name.clone(),
            });
        }
        self.store
            .exec(Transaction::after(&watched).set(key.clone(), encode(&key, record)?))?;
        tracing::info!(org, cluster = %record.name, "cluster registered");
        Ok(())
    }

    pub fn find(&self, org: &str, cluster: &str) -> Result<Option<ClusterRecord>, EngineError> {
        let key = keys::cluster(org, cluster);
        decode_opt(&key, self.store.get(&key)?)
    }

    /// Like [`find`](Self::find), but a missing cluster is a bad request
    pub fn get(&self, org: &str, cluster: &str) -> Result<ClusterRecord, EngineError> {
        self.find(org, cluster)?
            .ok_or_else(|| not_found(org, cluster))
    }

    pub fn list(&self, org: &str) -> Result<Vec<ClusterRecord>, EngineError> {
        let mut records = Vec::new();
        for key in self.store.keys_with_prefix(&keys::cluster_prefix(org))? {
            if let Some(value) = self.store.get(&key)? {
                records.push(decode(&key, value)?);
            }
        }
        Ok(records)
    }

    pub fn delete(&self, org: &str, cluster: &str) -> Result<(), EngineError> {
        let key = keys::cluster(org, cluster);
        let watched = self.store.watch(&key)?;
        if watched.value.is_none() {
            return Err(not_found(org, cluster));
        }
        self.store.exec(Transaction::after(&watched).delete(key))?;
        tracing::info!(org, cluster, "cluster removed");
        Ok(())
    }

    pub fn set_no_deploy(
        &self,
        org: &str,
        cluster: &str,
        gate: NoDeploy,
    ) -> Result<ClusterRecord, EngineError> {
        tracing::info!(org, cluster, scope = ?gate.scope, reason = %gate.reason, "no-deploy set");
        self.update(org, cluster, |record| record.no_deploy = Some(gate))
    }

    pub fn clear_no_deploy(&self, org: &str, cluster: &str) -> Result<ClusterRecord, EngineError> {
        tracing::info!(org, cluster, "no-deploy cleared");
        self.update(org, cluster, |record| record.no_deploy = None)
    }

    /// Read-modify-write guarded by the record's version
    fn update(
        &self,
        org: &str,
        cluster: &str,
        change: impl FnOnce(&mut ClusterRecord),
    ) -> Result<ClusterRecord, EngineError> {
        let key = keys::cluster(org, cluster);
        let watched = self.store.watch(&key)?;
        let mut record: ClusterRecord = match watched.value.clone() {
            Some(value) => decode(&key, value)?,
            None => return Err(not_found(org, cluster)),
        };
        change(&mut record);
        self.store
            .exec(Transaction::after(&watched).set(key.clone(), encode(&key, &record)?))?;
        Ok(record)
    }
}

fn not_found(org: &str, cluster: &str) -> EngineError {
    EngineError::ClusterNotFound {
        org: org.to_string(),
        cluster: cluster.to_string(),
    }
}

#[cfg(test)]
#[path = "clusters_tests.rs"]
mod tests;
