// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use keel_storage::KvStore;

fn shop() -> PipelineRef {
    PipelineRef::new("acme", "web", "shop")
}

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap()
}

fn runs_with(n: usize) -> PipelineRuns<KvStore> {
    let runs = PipelineRuns::new(KvStore::in_memory());
    for i in 0..n {
        runs.start_run(&shop(), &format!("run-{i}"), vec!["eu".into()], at((i % 60) as u32))
            .unwrap();
    }
    runs
}

#[test]
fn latest_is_most_recent() {
    let runs = runs_with(3);
    assert_eq!(runs.latest(&shop()).unwrap().unwrap().uvn, "run-2");
}

#[test]
fn history_spans_pages() {
    let runs = runs_with(40);
    let history = runs.history(&shop(), 20).unwrap();
    assert_eq!(history.len(), 20);
    assert_eq!(history[0].uvn, "run-39");
    assert_eq!(history[19].uvn, "run-20");

    assert_eq!(runs.history(&shop(), 100).unwrap().len(), 40);
    assert!(runs.history(&shop(), 0).unwrap().is_empty());
}

#[test]
fn record_error_updates_matching_run() {
    let runs = runs_with(20);
    runs.record_error(&shop(), "run-2", "template failed").unwrap();

    let run = runs.find(&shop(), "run-2").unwrap().unwrap();
    assert_eq!(run.errors, vec!["template failed".to_string()]);
    assert!(runs.find(&shop(), "run-3").unwrap().unwrap().errors.is_empty());
}

#[test]
fn record_error_for_unknown_run_is_bad_request() {
    let runs = runs_with(1);
    let err = runs.record_error(&shop(), "nope", "x").unwrap_err();
    assert!(err.is_bad_request());
}
