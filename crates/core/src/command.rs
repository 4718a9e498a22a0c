// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands and notifications delivered to a cluster's execution agent

use crate::watch::WatchKind;
use serde::{Deserialize, Serialize};

/// Retry count at which a command is handed out as its final try
pub const FINAL_TRY_THRESHOLD: u32 = 5;

/// Who a command belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    pub org: String,
    pub team: String,
    pub pipeline: String,
    pub pipeline_uvn: String,
    pub step: String,
    #[serde(default)]
    pub final_try: bool,
}

/// What a deploy payload describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployKind {
    /// The step's application manifest
    App,
    /// Supporting manifests deployed alongside the application
    Manifest,
    /// A test job manifest
    Test,
    /// A task handed to a named plugin
    Plugin(String),
}

/// Fully qualified reference to a single cluster resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGvk {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

/// Instruction for an execution agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommandEvent {
    Deploy {
        meta: CommandMetadata,
        kind: DeployKind,
        #[serde(default)]
        revision_hash: String,
        payload: String,
    },
    DeployAndWatch {
        meta: CommandMetadata,
        kind: DeployKind,
        #[serde(default)]
        revision_hash: String,
        payload: String,
        watch: WatchKind,
        #[serde(default)]
        test_number: i32,
    },
    DeleteByConfig {
        meta: CommandMetadata,
        payload: String,
    },
    DeleteByGvk {
        meta: CommandMetadata,
        resource: ResourceGvk,
    },
    RollbackAndWatch {
        meta: CommandMetadata,
        app_name: String,
        revision_hash: String,
        watch: WatchKind,
    },
    SelectiveSync {
        meta: CommandMetadata,
        app_name: String,
        revision_hash: String,
        resources: Vec<ResourceGvk>,
    },
    DeployNamedApp {
        meta: CommandMetadata,
        app_name: String,
    },
    DeployNamedAppAndWatch {
        meta: CommandMetadata,
        app_name: String,
        watch: WatchKind,
    },
}

impl CommandEvent {
    pub fn metadata(&self) -> &CommandMetadata {
        match self {
            CommandEvent::Deploy { meta, .. }
            | CommandEvent::DeployAndWatch { meta, .. }
            | CommandEvent::DeleteByConfig { meta, .. }
            | CommandEvent::DeleteByGvk { meta, .. }
            | CommandEvent::RollbackAndWatch { meta, .. }
            | CommandEvent::SelectiveSync { meta, .. }
            | CommandEvent::DeployNamedApp { meta, .. }
            | CommandEvent::DeployNamedAppAndWatch { meta, .. } => meta,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut CommandMetadata {
        match self {
            CommandEvent::Deploy { meta, .. }
            | CommandEvent::DeployAndWatch { meta, .. }
            | CommandEvent::DeleteByConfig { meta, .. }
            | CommandEvent::DeleteByGvk { meta, .. }
            | CommandEvent::RollbackAndWatch { meta, .. }
            | CommandEvent::SelectiveSync { meta, .. }
            | CommandEvent::DeployNamedApp { meta, .. }
            | CommandEvent::DeployNamedAppAndWatch { meta, .. } => meta,
        }
    }

    /// Variant name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            CommandEvent::Deploy { .. } => "deploy",
            CommandEvent::DeployAndWatch { .. } => "deploy_and_watch",
            CommandEvent::DeleteByConfig { .. } => "delete_by_config",
            CommandEvent::DeleteByGvk { .. } => "delete_by_gvk",
            CommandEvent::RollbackAndWatch { .. } => "rollback_and_watch",
            CommandEvent::SelectiveSync { .. } => "selective_sync",
            CommandEvent::DeployNamedApp { .. } => "deploy_named_app",
            CommandEvent::DeployNamedAppAndWatch { .. } => "deploy_named_app_and_watch",
        }
    }
}

/// A queued command plus its delivery bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPacket {
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub namespace: String,
    pub command: CommandEvent,
}

impl CommandPacket {
    pub fn new(namespace: impl Into<String>, command: CommandEvent) -> Self {
        Self {
            retry_count: 0,
            namespace: namespace.into(),
            command,
        }
    }

    pub fn is_final_try(&self) -> bool {
        self.retry_count >= FINAL_TRY_THRESHOLD
    }

    pub fn bump_retry(&mut self) {
        self.retry_count = self.retry_count.saturating_add(1);
    }

    /// The packet as handed to an agent, with `final_try` derived from the retry count
    pub fn delivery(&self) -> CommandPacket {
        let mut packet = self.clone();
        packet.command.metadata_mut().final_try = self.is_final_try();
        packet
    }
}

/// Administrative request handled ahead of any command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationRequest {
    MarkNoDeploy {
        cluster: String,
        #[serde(default)]
        namespace: Option<String>,
        apply: bool,
    },
    Label {
        team: String,
        pipeline: String,
        resources: Vec<ResourceGvk>,
    },
    Aggregate {
        cluster: String,
        #[serde(default)]
        namespace: Option<String>,
    },
    DeleteByLabel {
        team: String,
        pipeline: String,
        namespace: String,
    },
}

impl NotificationRequest {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationRequest::MarkNoDeploy { .. } => "mark_no_deploy",
            NotificationRequest::Label { .. } => "label",
            NotificationRequest::Aggregate { .. } => "aggregate",
            NotificationRequest::DeleteByLabel { .. } => "delete_by_label",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPacket {
    pub request_id: String,
    pub request: NotificationRequest,
}

/// Body stored for a notification that never reported back
pub const RESULT_NOT_FOUND: &str = "error: the request response could not be found";

/// Outcome an agent posts for a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub successful: bool,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl Notification {
    pub fn ok(body: serde_json::Value) -> Self {
        Self {
            successful: true,
            body,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            successful: false,
            body: serde_json::Value::String(message.into()),
        }
    }

    pub fn not_found() -> Self {
        Self::failed(RESULT_NOT_FOUND)
    }
}

/// What `peek` hands an agent: a notification always wins over a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "packet", rename_all = "snake_case")]
pub enum Delivery {
    Notification(NotificationPacket),
    Command(CommandPacket),
}

/// Label attached to resources owned by a pipeline, used to find stale ones
pub fn audit_label(team: &str, pipeline: &str) -> String {
    format!("{team}-{pipeline}-stale")
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
