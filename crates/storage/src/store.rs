// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key-value store
//!
//! Single-value keys support optimistic transactions: read with
//! [`DurableStore::watch`], then [`DurableStore::exec`] a transaction guarded
//! by the observed version. List primitives are applied directly and carry
//! no isolation.

use crate::op::StoreOp;
use crate::state::MaterializedStore;
use crate::wal::{Wal, WalError};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction interrupted: {0} changed since it was watched")]
    TransactionInterrupted(String),
    #[error("index {index} out of range for list {key}")]
    IndexOutOfRange { key: String, index: usize },
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
}

impl StoreError {
    /// Conflicts are safe to retry from the read
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::TransactionInterrupted(_))
    }
}

/// A value read together with the version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Watched {
    pub key: String,
    pub value: Option<Value>,
    pub version: u64,
}

/// Writes applied only if every guarded key is still at its watched version
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    guards: Vec<(String, u64)>,
    ops: Vec<StoreOp>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transaction guarded by a prior watch
    pub fn after(watched: &Watched) -> Self {
        Self::new().guard(watched)
    }

    pub fn guard(mut self, watched: &Watched) -> Self {
        self.guards.push((watched.key.clone(), watched.version));
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.ops.push(StoreOp::Set {
            key: key.into(),
            value,
        });
        self
    }

    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.ops.push(StoreOp::Delete { key: key.into() });
        self
    }
}

/// Storage seam used by the queue, audit log and reconciler
pub trait DurableStore: Clone + Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Read a value and its version for a later [`DurableStore::exec`]
    fn watch(&self, key: &str) -> Result<Watched, StoreError>;

    fn exec(&self, txn: Transaction) -> Result<(), StoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Single-value keys starting with `prefix`
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    fn push_front(&self, key: &str, value: Value) -> Result<(), StoreError>;

    fn push_back(&self, key: &str, value: Value) -> Result<(), StoreError>;

    fn pop_front(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn head(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set_index(&self, key: &str, index: usize, value: Value) -> Result<(), StoreError>;

    /// Replace the head of a list
    fn set_head(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.set_index(key, 0, value)
    }

    /// Items `start..=stop`, clamped to the list length
    fn range(&self, key: &str, start: usize, stop: usize) -> Result<Vec<Value>, StoreError>;

    fn len(&self, key: &str) -> Result<usize, StoreError>;
}

struct Inner {
    state: MaterializedStore,
    wal: Option<Wal>,
}

impl Inner {
    /// Log then apply; a WAL failure leaves the state untouched
    fn commit(&mut self, ops: &[StoreOp]) -> Result<(), StoreError> {
        if let Some(wal) = self.wal.as_mut() {
            for op in ops {
                wal.append(op)?;
            }
        }
        for op in ops {
            self.state.apply(op);
        }
        Ok(())
    }
}

/// WAL-backed store; clones share the same state
#[derive(Clone)]
pub struct KvStore {
    inner: Arc<Mutex<Inner>>,
}

impl KvStore {
    /// Volatile store for tests
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: MaterializedStore::default(),
                wal: None,
            })),
        }
    }

    /// Replay the WAL at `path` and keep appending to it
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut state = MaterializedStore::default();
        for op in Wal::replay(path)? {
            state.apply(&op);
        }
        let wal = Wal::open(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                wal: Some(wal),
            })),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DurableStore for KvStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock().state.get(key).cloned())
    }

    fn watch(&self, key: &str) -> Result<Watched, StoreError> {
        let inner = self.lock();
        Ok(Watched {
            key: key.to_string(),
            value: inner.state.get(key).cloned(),
            version: inner.state.version(key),
        })
    }

    fn exec(&self, txn: Transaction) -> Result<(), StoreError> {
        let mut inner = self.lock();
        for (key, version) in &txn.guards {
            if inner.state.version(key) != *version {
                return Err(StoreError::TransactionInterrupted(key.clone()));
            }
        }
        inner.commit(&txn.ops)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.lock().commit(&[StoreOp::Set {
            key: key.to_string(),
            value,
        }])
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock().commit(&[StoreOp::Delete {
            key: key.to_string(),
        }])
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.lock().state.keys_with_prefix(prefix))
    }

    fn push_front(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.lock().commit(&[StoreOp::PushFront {
            key: key.to_string(),
            value,
        }])
    }

    fn push_back(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.lock().commit(&[StoreOp::PushBack {
            key: key.to_string(),
            value,
        }])
    }

    fn pop_front(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut inner = self.lock();
        let head = inner.state.list(key).and_then(|l| l.front().cloned());
        if head.is_some() {
            inner.commit(&[StoreOp::PopFront {
                key: key.to_string(),
            }])?;
        }
        Ok(head)
    }

    fn head(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .lock()
            .state
            .list(key)
            .and_then(|l| l.front().cloned()))
    }

    fn set_index(&self, key: &str, index: usize, value: Value) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if index >= inner.state.list_len(key) {
            return Err(StoreError::IndexOutOfRange {
                key: key.to_string(),
                index,
            });
        }
        inner.commit(&[StoreOp::SetIndex {
            key: key.to_string(),
            index,
            value,
        }])
    }

    fn range(&self, key: &str, start: usize, stop: usize) -> Result<Vec<Value>, StoreError> {
        let inner = self.lock();
        let Some(list) = inner.state.list(key) else {
            return Ok(Vec::new());
        };
        if start > stop {
            return Ok(Vec::new());
        }
        Ok(list
            .iter()
            .skip(start)
            .take(stop - start + 1)
            .cloned()
            .collect())
    }

    fn len(&self, key: &str) -> Result<usize, StoreError> {
        Ok(self.lock().state.list_len(key))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
