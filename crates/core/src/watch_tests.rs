// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn meta(step: &str) -> CommandMetadata {
    CommandMetadata {
        org: "acme".into(),
        team: "web".into(),
        pipeline: "shop".into(),
        pipeline_uvn: "run-1".into(),
        step: step.into(),
        final_try: false,
    }
}

#[test]
fn new_key_starts_missing_and_out_of_sync() {
    let key = WatchKey::new(WatchKind::App, &meta("eu"), "shop-eu", "default");
    assert_eq!(key.health, HealthStatus::Missing);
    assert_eq!(key.sync, SyncStatus::OutOfSync);
    assert!(!key.generated_completion_event);
}

#[test]
fn identity_ignores_uvn_and_state() {
    let mut a = WatchKey::new(WatchKind::App, &meta("eu"), "shop-eu", "default");
    let mut b = a.clone();
    b.pipeline_uvn = "run-2".into();
    b.generated_completion_event = true;
    a.health = HealthStatus::Healthy;
    assert_eq!(a.id(), b.id());
}

#[test]
fn identity_distinguishes_steps() {
    let a = WatchKey::new(WatchKind::App, &meta("eu"), "shop", "default");
    let b = WatchKey::new(WatchKind::App, &meta("us"), "shop", "default");
    assert_ne!(a.id(), b.id());
}

#[test]
fn only_apps_are_long_lived() {
    assert!(!WatchKind::App.is_one_shot());
    assert!(WatchKind::TestJob.is_one_shot());
    assert!(WatchKind::PluginTask {
        plugin: "lambda".into()
    }
    .is_one_shot());
}

#[test]
fn watch_id_display() {
    let key = WatchKey::new(WatchKind::TestJob, &meta("eu"), "smoke", "qa");
    assert_eq!(key.id().to_string(), "web/shop/eu/qa/smoke");
}
