// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn transaction_commits_when_unchanged() {
    let store = KvStore::in_memory();
    store.set("cluster", json!({"paused": false})).unwrap();

    let watched = store.watch("cluster").unwrap();
    store
        .exec(Transaction::after(&watched).set("cluster", json!({"paused": true})))
        .unwrap();

    assert_eq!(store.get("cluster").unwrap(), Some(json!({"paused": true})));
}

#[test]
fn transaction_interrupted_by_concurrent_write() {
    let store = KvStore::in_memory();
    store.set("cluster", json!(1)).unwrap();

    let watched = store.watch("cluster").unwrap();
    store.set("cluster", json!(2)).unwrap();

    let err = store
        .exec(Transaction::after(&watched).set("cluster", json!(3)))
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(store.get("cluster").unwrap(), Some(json!(2)));
}

#[test]
fn watching_missing_key_guards_creation() {
    let store = KvStore::in_memory();
    let watched = store.watch("new").unwrap();
    assert_eq!(watched.value, None);
    assert_eq!(watched.version, 0);

    store.set("new", json!("racer")).unwrap();
    assert!(store
        .exec(Transaction::after(&watched).set("new", json!("mine")))
        .is_err());
}

#[test]
fn pop_front_on_empty_list_is_none() {
    let store = KvStore::in_memory();
    assert_eq!(store.pop_front("q").unwrap(), None);
    assert_eq!(store.head("q").unwrap(), None);
}

#[test]
fn list_primitives() {
    let store = KvStore::in_memory();
    store.push_back("q", json!(1)).unwrap();
    store.push_back("q", json!(2)).unwrap();
    store.push_front("q", json!(0)).unwrap();

    assert_eq!(store.len("q").unwrap(), 3);
    assert_eq!(store.head("q").unwrap(), Some(json!(0)));
    assert_eq!(store.range("q", 1, 10).unwrap(), vec![json!(1), json!(2)]);
    assert_eq!(store.range("q", 5, 9).unwrap(), Vec::<Value>::new());

    store.set_head("q", json!("zero")).unwrap();
    assert_eq!(store.pop_front("q").unwrap(), Some(json!("zero")));
    assert_eq!(store.len("q").unwrap(), 2);
}

#[test]
fn set_index_out_of_range() {
    let store = KvStore::in_memory();
    let err = store.set_head("q", json!(1)).unwrap_err();
    assert!(matches!(err, StoreError::IndexOutOfRange { index: 0, .. }));
}

#[test]
fn reopen_replays_wal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.wal");

    {
        let store = KvStore::open(&path).unwrap();
        store.set("a", json!("x")).unwrap();
        store.push_back("q", json!(1)).unwrap();
        store.push_back("q", json!(2)).unwrap();
        store.pop_front("q").unwrap();
        store.set_index("q", 0, json!(20)).unwrap();
    }

    let store = KvStore::open(&path).unwrap();
    assert_eq!(store.get("a").unwrap(), Some(json!("x")));
    assert_eq!(store.range("q", 0, 10).unwrap(), vec![json!(20)]);
    // versions survive replay, so stale watches stay stale
    assert_eq!(store.watch("q").unwrap().version, 4);
}

#[test]
fn clones_share_state() {
    let store = KvStore::in_memory();
    let other = store.clone();
    other.set("k", json!(true)).unwrap();
    assert_eq!(store.get("k").unwrap(), Some(json!(true)));
}
