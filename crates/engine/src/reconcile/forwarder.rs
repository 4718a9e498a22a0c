// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch intake for watch keys

use keel_core::{WatchKey, WatchMessage};
use tokio::sync::mpsc;

/// Buffer keys until `EndOfBatch`, then hand them to the ticker in order.
///
/// Blocks while the ticker's channel is full. Returns when the intake
/// closes or the ticker goes away; keys of an unterminated batch are dropped.
pub async fn run_forwarder(mut intake: mpsc::Receiver<WatchMessage>, out: mpsc::Sender<WatchKey>) {
    let mut batch = Vec::new();
    while let Some(message) = intake.recv().await {
        match message {
            WatchMessage::Key(key) => batch.push(key),
            WatchMessage::EndOfBatch => {
                tracing::debug!(keys = batch.len(), "forwarding watch batch");
                for key in batch.drain(..) {
                    if out.send(key).await.is_err() {
                        tracing::warn!("ticker gone, forwarder stopping");
                        return;
                    }
                }
            }
        }
    }
    if !batch.is_empty() {
        tracing::warn!(keys = batch.len(), "intake closed mid-batch");
    }
}

#[cfg(test)]
#[path = "forwarder_tests.rs"]
mod tests;
