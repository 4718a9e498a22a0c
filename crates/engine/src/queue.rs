// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-cluster command and notification queues
//!
//! Each (org, cluster) pair has two FIFO lists in the store: commands, and
//! notifications that always take priority. List operations carry no
//! isolation, so delivery is at-least-once; agents must tolerate repeats.

use crate::clusters::ClusterRegistry;
use crate::records::{decode, decode_opt, encode};
use crate::EngineError;
use keel_core::{keys, CommandPacket, Delivery, IdGen, NotificationPacket, NotificationRequest};
use keel_storage::DurableStore;
use serde::de::DeserializeOwned;

/// Queue depth for one cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QueueDepth {
    pub commands: usize,
    pub notifications: usize,
}

#[derive(Clone)]
pub struct CommandQueue<S, I> {
    store: S,
    clusters: ClusterRegistry<S>,
    id_gen: I,
}

impl<S: DurableStore, I: IdGen> CommandQueue<S, I> {
    pub fn new(store: S, id_gen: I) -> Self {
        Self {
            clusters: ClusterRegistry::new(store.clone()),
            store,
            id_gen,
        }
    }

    pub fn enqueue(
        &self,
        org: &str,
        cluster: &str,
        packet: &CommandPacket,
    ) -> Result<(), EngineError> {
        self.clusters.get(org, cluster)?;
        let key = keys::commands(org, cluster);
        self.store.push_back(&key, encode(&key, packet)?)?;
        tracing::info!(
            org,
            cluster,
            command = packet.command.name(),
            namespace = %packet.namespace,
            step = %packet.command.metadata().step,
            "command enqueued"
        );
        Ok(())
    }

    /// Queue a notification and return the request id its result is posted under
    pub fn enqueue_notification(
        &self,
        org: &str,
        cluster: &str,
        request: NotificationRequest,
    ) -> Result<String, EngineError> {
        self.clusters.get(org, cluster)?;
        let packet = NotificationPacket {
            request_id: self.id_gen.request_id(),
            request,
        };
        let key = keys::notifications(org, cluster);
        self.store.push_back(&key, encode(&key, &packet)?)?;
        tracing::info!(
            org,
            cluster,
            request_id = %packet.request_id,
            request = packet.request.name(),
            "notification enqueued"
        );
        Ok(packet.request_id)
    }

    /// Next delivery for the cluster's agent, without removing it.
    ///
    /// Notifications are never gated. Commands are withheld while the cluster
    /// is paused, or while the head command's namespace is paused; a withheld
    /// head stays in place. Heads that no longer decode are logged and dropped.
    pub fn peek(&self, org: &str, cluster: &str) -> Result<Option<Delivery>, EngineError> {
        let record = self.clusters.get(org, cluster)?;

        let key = keys::notifications(org, cluster);
        if let Some(packet) = self.decodable_head::<NotificationPacket>(&key)? {
            return Ok(Some(Delivery::Notification(packet)));
        }

        if record.is_paused() {
            tracing::debug!(org, cluster, "cluster paused, withholding commands");
            return Ok(None);
        }

        let key = keys::commands(org, cluster);
        let Some(packet) = self.decodable_head::<CommandPacket>(&key)? else {
            return Ok(None);
        };
        if record.blocks_namespace(&packet.namespace) {
            tracing::debug!(org, cluster, namespace = %packet.namespace, "namespace paused, withholding head");
            return Ok(None);
        }
        Ok(Some(Delivery::Command(packet.delivery())))
    }

    /// Remove the head command; returns it if there was one
    pub fn ack_head(&self, org: &str, cluster: &str) -> Result<Option<CommandPacket>, EngineError> {
        let key = keys::commands(org, cluster);
        let packet: Option<CommandPacket> = decode_opt(&key, self.store.pop_front(&key)?)?;
        if let Some(packet) = &packet {
            tracing::info!(org, cluster, command = packet.command.name(), "command acked");
        }
        Ok(packet)
    }

    pub fn ack_notification_head(
        &self,
        org: &str,
        cluster: &str,
    ) -> Result<Option<NotificationPacket>, EngineError> {
        let key = keys::notifications(org, cluster);
        let packet: Option<NotificationPacket> = decode_opt(&key, self.store.pop_front(&key)?)?;
        if let Some(packet) = &packet {
            tracing::info!(org, cluster, request_id = %packet.request_id, "notification acked");
        }
        Ok(packet)
    }

    /// Count one more failed attempt against the head command, in place
    pub fn retry_head(
        &self,
        org: &str,
        cluster: &str,
    ) -> Result<Option<CommandPacket>, EngineError> {
        let key = keys::commands(org, cluster);
        let Some(mut packet) = decode_opt::<CommandPacket>(&key, self.store.head(&key)?)? else {
            return Ok(None);
        };
        packet.bump_retry();
        self.store.set_head(&key, encode(&key, &packet)?)?;
        tracing::warn!(
            org,
            cluster,
            command = packet.command.name(),
            retry_count = packet.retry_count,
            final_try = packet.is_final_try(),
            "command returned for retry"
        );
        Ok(Some(packet))
    }

    /// First entry of `key` that decodes, popping any that do not
    fn decodable_head<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, EngineError> {
        while let Some(value) = self.store.head(key)? {
            match decode(key, value) {
                Ok(packet) => return Ok(Some(packet)),
                Err(e) => {
                    tracing::warn!(key, error = %e, "dropping undecodable queue entry");
                    self.store.pop_front(key)?;
                }
            }
        }
        Ok(None)
    }

    pub fn depth(&self, org: &str, cluster: &str) -> Result<QueueDepth, EngineError> {
        Ok(QueueDepth {
            commands: self.store.len(&keys::commands(org, cluster))?,
            notifications: self.store.len(&keys::notifications(org, cluster))?,
        })
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
