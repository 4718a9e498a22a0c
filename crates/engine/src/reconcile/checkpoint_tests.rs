// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use keel_core::{CommandMetadata, WatchKind};
use keel_storage::KvStore;

fn key(name: &str, emitted: bool) -> WatchKey {
    let mut key = WatchKey::new(WatchKind::TestJob, &CommandMetadata::default(), name, "tests");
    key.generated_completion_event = emitted;
    key
}

#[test]
fn skips_keys_that_already_emitted() {
    let store = KvStore::in_memory();
    let watched: HashMap<_, _> = [key("pending", false), key("done", true)]
        .into_iter()
        .map(|k| (k.id(), k))
        .collect();

    assert_eq!(save_checkpoint(&store, "east", &watched).unwrap(), 1);
    let restored = load_checkpoint(&store, "east").unwrap();
    assert_eq!(restored.len(), 1);
    assert!(restored.values().all(|k| k.name == "pending"));
}

#[test]
fn checkpoints_are_per_cluster() {
    let store = KvStore::in_memory();
    let watched: HashMap<_, _> = [key("a", false)].into_iter().map(|k| (k.id(), k)).collect();
    save_checkpoint(&store, "east", &watched).unwrap();

    assert!(load_checkpoint(&store, "west").unwrap().is_empty());
    assert_eq!(load_checkpoint(&store, "east").unwrap().len(), 1);
}

#[test]
fn undecodable_entries_are_skipped() {
    let store = KvStore::in_memory();
    let watched: HashMap<_, _> = [key("a", false)].into_iter().map(|k| (k.id(), k)).collect();
    save_checkpoint(&store, "east", &watched).unwrap();

    let key = keys::watch_checkpoint("east");
    let mut saved = match store.get(&key).unwrap() {
        Some(Value::Array(entries)) => entries,
        other => panic!("unexpected checkpoint: {:?}", other),
    };
    saved.insert(0, serde_json::json!({ "kind": "future_kind", "name": "x" }));
    store.set(&key, Value::Array(saved)).unwrap();

    let restored = load_checkpoint(&store, "east").unwrap();
    assert_eq!(restored.len(), 1);
    assert!(restored.values().all(|k| k.name == "a"));
}

#[test]
fn pending_keys_are_in_id_order() {
    let watched: HashMap<_, _> = [key("b", false), key("a", false), key("c", true)]
        .into_iter()
        .map(|k| (k.id(), k))
        .collect();

    let names: Vec<_> = pending_keys(&watched).into_iter().map(|k| k.name).collect();
    assert_eq!(names, vec!["a", "b"]);
}
