// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn uuid_request_ids_are_hyphenated_and_unique() {
    let ids = UuidIdGen;
    let a = ids.request_id();
    let b = ids.request_id();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}

#[test]
fn uuid_run_ids_are_compact() {
    let run = UuidIdGen.run_id();
    assert_eq!(run.len(), 32);
    assert!(!run.contains('-'));
}

#[test]
fn sequential_ids_share_one_counter() {
    let ids = SequentialIdGen::new();
    assert_eq!(ids.request_id(), "req-1");
    assert_eq!(ids.run_id(), "run-2");
    assert_eq!(ids.request_id(), "req-3");
}

#[test]
fn sequential_clones_do_not_repeat_ids() {
    let a = SequentialIdGen::new();
    let b = a.clone();
    assert_eq!(a.request_id(), "req-1");
    assert_eq!(b.request_id(), "req-2");
}
