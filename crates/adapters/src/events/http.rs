// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event sink posting JSON to the pipeline engine's intake endpoint

use super::{EventSink, SinkError};
use crate::http::{self, HttpError};
use async_trait::async_trait;
use keel_core::EventInfo;

#[derive(Clone, Debug)]
pub struct HttpEventSink {
    url: String,
}

impl HttpEventSink {
    /// `base` is the engine address; events go to `{base}/client/generateEvent`
    pub fn new(base: &str) -> Self {
        Self {
            url: format!("{}/client/generateEvent", base.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn emit(&self, event: &EventInfo) -> Result<(), SinkError> {
        let body =
            serde_json::to_string(event).map_err(|e| SinkError::Rejected(e.to_string()))?;
        http::post_json(self.url.clone(), body)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                HttpError::Status(code) if code < 500 => SinkError::Rejected(format!("HTTP status {code}")),
                other => SinkError::Delivery(other.to_string()),
            })
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
