// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn meta() -> CommandMetadata {
    CommandMetadata {
        org: "acme".into(),
        team: "web".into(),
        pipeline: "shop".into(),
        pipeline_uvn: "run-1".into(),
        step: "deploy-eu".into(),
        final_try: false,
    }
}

fn deploy() -> CommandEvent {
    CommandEvent::Deploy {
        meta: meta(),
        kind: DeployKind::App,
        revision_hash: "abc".into(),
        payload: "kind: Application".into(),
    }
}

#[parameterized(
    fresh = { 0, false },
    four = { 4, false },
    five = { 5, true },
    many = { 12, true },
)]
fn final_try_starts_at_threshold(retries: u32, expected: bool) {
    let mut packet = CommandPacket::new("default", deploy());
    packet.retry_count = retries;
    assert_eq!(packet.is_final_try(), expected);
    assert_eq!(packet.delivery().command.metadata().final_try, expected);
}

#[test]
fn delivery_leaves_stored_command_untouched() {
    let mut packet = CommandPacket::new("default", deploy());
    packet.retry_count = FINAL_TRY_THRESHOLD;
    let _ = packet.delivery();
    assert!(!packet.command.metadata().final_try);
}

#[test]
fn bump_retry_increments() {
    let mut packet = CommandPacket::new("default", deploy());
    packet.bump_retry();
    packet.bump_retry();
    assert_eq!(packet.retry_count, 2);
}

#[test]
fn command_json_is_tagged_by_type() {
    let json = serde_json::to_value(deploy()).unwrap();
    assert_eq!(json["type"], "Deploy");
    assert_eq!(json["meta"]["step"], "deploy-eu");
}

#[test]
fn plugin_kind_survives_json() {
    let command = CommandEvent::DeployAndWatch {
        meta: meta(),
        kind: DeployKind::Plugin("lambda".into()),
        revision_hash: String::new(),
        payload: "{}".into(),
        watch: WatchKind::PluginTask {
            plugin: "lambda".into(),
        },
        test_number: 0,
    };
    let json = serde_json::to_string(&command).unwrap();
    let back: CommandEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, command);
    assert_eq!(back.name(), "deploy_and_watch");
}

#[test]
fn metadata_mut_reaches_every_variant() {
    let mut command = CommandEvent::DeleteByGvk {
        meta: meta(),
        resource: ResourceGvk::default(),
    };
    command.metadata_mut().step = "other".into();
    assert_eq!(command.metadata().step, "other");
}

#[test]
fn not_found_notification_is_unsuccessful() {
    let n = Notification::not_found();
    assert!(!n.successful);
    assert_eq!(n.body, serde_json::Value::String(RESULT_NOT_FOUND.into()));
}

#[test]
fn delivery_is_adjacently_tagged() {
    let delivery = Delivery::Notification(NotificationPacket {
        request_id: "req-1".into(),
        request: NotificationRequest::Aggregate {
            cluster: "prod".into(),
            namespace: None,
        },
    });
    let json = serde_json::to_value(&delivery).unwrap();
    assert_eq!(json["kind"], "notification");
    assert_eq!(json["packet"]["request"]["type"], "Aggregate");
}

#[test]
fn audit_label_format() {
    assert_eq!(audit_label("web", "shop"), "web-shop-stale");
}
