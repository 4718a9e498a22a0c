// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store mutations, as recorded in the write-ahead log

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreOp {
    Set { key: String, value: Value },
    /// Removes both the single value and the list stored under the key
    Delete { key: String },
    PushFront { key: String, value: Value },
    PushBack { key: String, value: Value },
    PopFront { key: String },
    SetIndex { key: String, index: usize, value: Value },
}

impl StoreOp {
    pub fn key(&self) -> &str {
        match self {
            StoreOp::Set { key, .. }
            | StoreOp::Delete { key }
            | StoreOp::PushFront { key, .. }
            | StoreOp::PushBack { key, .. }
            | StoreOp::PopFront { key }
            | StoreOp::SetIndex { key, .. } => key,
        }
    }
}
