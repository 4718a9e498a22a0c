// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed access to JSON records in the durable store

use crate::EngineError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub(crate) fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, EngineError> {
    serde_json::from_value(value).map_err(|e| EngineError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn encode<T: Serialize>(key: &str, record: &T) -> Result<Value, EngineError> {
    serde_json::to_value(record).map_err(|e| EngineError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn decode_opt<T: DeserializeOwned>(
    key: &str,
    value: Option<Value>,
) -> Result<Option<T>, EngineError> {
    value.map(|v| decode(key, v)).transpose()
}

pub(crate) fn decode_all<T: DeserializeOwned>(
    key: &str,
    values: Vec<Value>,
) -> Result<Vec<T>, EngineError> {
    values.into_iter().map(|v| decode(key, v)).collect()
}
