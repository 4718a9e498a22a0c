// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized store contents built from WAL replay

use crate::op::StoreOp;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// In-memory view of every key, with a version counter per key
#[derive(Debug, Default)]
pub struct MaterializedStore {
    values: HashMap<String, Value>,
    lists: HashMap<String, VecDeque<Value>>,
    versions: HashMap<String, u64>,
}

impl MaterializedStore {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn list(&self, key: &str) -> Option<&VecDeque<Value>> {
        self.lists.get(key)
    }

    pub fn list_len(&self, key: &str) -> usize {
        self.lists.get(key).map_or(0, VecDeque::len)
    }

    /// Version of a key; 0 for keys that were never written
    pub fn version(&self, key: &str) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }

    /// Single-value keys starting with `prefix`, sorted
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Apply a mutation. Every mutation bumps the key's version.
    pub fn apply(&mut self, op: &StoreOp) {
        match op {
            StoreOp::Set { key, value } => {
                self.values.insert(key.clone(), value.clone());
            }
            StoreOp::Delete { key } => {
                self.values.remove(key);
                self.lists.remove(key);
            }
            StoreOp::PushFront { key, value } => {
                self.lists
                    .entry(key.clone())
                    .or_default()
                    .push_front(value.clone());
            }
            StoreOp::PushBack { key, value } => {
                self.lists
                    .entry(key.clone())
                    .or_default()
                    .push_back(value.clone());
            }
            StoreOp::PopFront { key } => {
                if let Some(list) = self.lists.get_mut(key) {
                    list.pop_front();
                    if list.is_empty() {
                        self.lists.remove(key);
                    }
                }
            }
            StoreOp::SetIndex { key, index, value } => {
                if let Some(slot) = self.lists.get_mut(key).and_then(|l| l.get_mut(*index)) {
                    *slot = value.clone();
                }
            }
        }
        *self.versions.entry(op.key().to_string()).or_insert(0) += 1;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
