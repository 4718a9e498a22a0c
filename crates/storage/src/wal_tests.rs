// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn wal_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.wal");

    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&StoreOp::Set {
            key: "cluster:acme:prod".to_string(),
            value: json!({"name": "prod"}),
        })
        .unwrap();
        wal.append(&StoreOp::PopFront {
            key: "commands:acme:prod".to_string(),
        })
        .unwrap();
    }

    let ops = Wal::replay(&path).unwrap();
    assert_eq!(ops.len(), 2);
    assert!(matches!(ops[0], StoreOp::Set { .. }));
    assert_eq!(ops[1].key(), "commands:acme:prod");
}

#[test]
fn wal_sequence_continues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.wal");

    {
        let mut wal = Wal::open(&path).unwrap();
        assert_eq!(wal.sequence(), 0);
        wal.append(&StoreOp::Delete {
            key: "x".to_string(),
        })
        .unwrap();
        assert_eq!(wal.sequence(), 1);
    }

    {
        let wal = Wal::open(&path).unwrap();
        assert_eq!(wal.sequence(), 1);
    }
}

#[test]
fn wal_replay_nonexistent() {
    let path = Path::new("/nonexistent/path/wal");
    let ops = Wal::replay(path).unwrap();
    assert!(ops.is_empty());
}

#[test]
fn wal_replay_rejects_corrupt_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.wal");
    std::fs::write(&path, "{not json}\n").unwrap();
    assert!(matches!(Wal::replay(&path), Err(WalError::Json(_))));
}
