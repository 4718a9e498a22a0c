// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol between keeld and its clients
//!
//! Every message is a 4-byte big-endian length followed by that many bytes
//! of JSON. A connection carries one request and one response.

use std::time::Duration;

use keel_core::{
    ClusterRecord, CommandPacket, Delivery, Log, Notification, NotificationRequest, PipelineRun,
    PipelineStatus, WatchKey,
};
use keel_engine::{PipelineRef, QueueDepth};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reported in `Hello` responses
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Read and write timeout for a single message
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single message body
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Timeout")]
    Timeout,
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Message too large: {0} bytes")]
    MessageTooLarge(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Ping,
    Hello {
        version: String,
    },
    Status,
    Shutdown,

    CreateCluster {
        org: String,
        cluster: ClusterRecord,
    },
    GetCluster {
        org: String,
        cluster: String,
    },
    ListClusters {
        org: String,
    },
    DeleteCluster {
        org: String,
        cluster: String,
    },
    /// Pause deployments and wait for the agent to apply the freeze
    SetNoDeploy {
        org: String,
        cluster: String,
        #[serde(default)]
        namespace: Option<String>,
        #[serde(default)]
        reason: String,
        #[serde(default)]
        requested_by: String,
    },
    ClearNoDeploy {
        org: String,
        cluster: String,
        #[serde(default)]
        namespace: Option<String>,
    },

    EnqueueCommand {
        org: String,
        cluster: String,
        packet: CommandPacket,
    },
    EnqueueNotification {
        org: String,
        cluster: String,
        request: NotificationRequest,
    },
    Peek {
        org: String,
        cluster: String,
    },
    Ack {
        org: String,
        cluster: String,
    },
    AckNotification {
        org: String,
        cluster: String,
    },
    Retry {
        org: String,
        cluster: String,
    },
    QueueDepth {
        org: String,
        cluster: String,
    },
    PostNotification {
        request_id: String,
        notification: Notification,
    },
    AwaitNotification {
        request_id: String,
    },

    /// Hand keys to a cluster's reconciler as one batch
    SubmitWatch {
        cluster: String,
        keys: Vec<WatchKey>,
    },

    PipelineStatus {
        pipeline: PipelineRef,
        /// Run to report on; the latest run when absent
        #[serde(default)]
        uvn: Option<String>,
    },
    CancelPipeline {
        pipeline: PipelineRef,
    },
    RunHistory {
        pipeline: PipelineRef,
        count: usize,
    },
    StepLogs {
        pipeline: PipelineRef,
        step: String,
        #[serde(default)]
        page: usize,
    },
}

/// Daemon response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Pong,
    Hello {
        version: String,
    },
    Status {
        uptime_secs: u64,
        clusters: Vec<String>,
        pipelines: usize,
    },
    ShuttingDown,
    Error {
        message: String,
        /// The request named something that does not exist or cannot apply
        #[serde(default)]
        bad_request: bool,
    },

    Cluster {
        cluster: Option<ClusterRecord>,
    },
    Clusters {
        clusters: Vec<ClusterRecord>,
    },
    RequestId {
        request_id: String,
    },
    Delivery {
        delivery: Option<Delivery>,
    },
    Depth {
        depth: QueueDepth,
    },
    Notification {
        notification: Notification,
    },

    PipelineStatus {
        status: PipelineStatus,
    },
    Cancelled {
        uvn: Option<String>,
    },
    Runs {
        runs: Vec<PipelineRun>,
    },
    Logs {
        logs: Vec<Log>,
    },
}

/// Serialize to JSON, without the length prefix
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write one length-prefixed message
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(data.len()));
    }
    let len = u32::try_from(data.len()).map_err(|_| ProtocolError::MessageTooLarge(data.len()))?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed message
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).await?;
    Ok(data)
}

pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let data = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&data)
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
