// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use keel_core::RESULT_NOT_FOUND;
use keel_storage::KvStore;
use serde_json::json;

fn results() -> NotificationResults<KvStore> {
    NotificationResults::new(KvStore::in_memory(), WaitPolicy::default())
}

#[test]
fn take_reads_once() {
    let results = results();
    results
        .post("req-1", &Notification::ok(json!({"labelled": 3})))
        .unwrap();

    let taken = results.take("req-1").unwrap().unwrap();
    assert!(taken.successful);
    assert_eq!(taken.body["labelled"], 3);
    assert!(results.take("req-1").unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn wait_returns_result_posted_during_polling() {
    let results = results();
    let poster = results.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(12)).await;
        poster
            .post("req-1", &Notification::failed("cluster unreachable"))
            .unwrap();
    });

    let notification = results.wait("req-1").await.unwrap();
    assert!(!notification.successful);
    assert_eq!(notification.body, json!("cluster unreachable"));
}

#[tokio::test(start_paused = true)]
async fn wait_times_out_with_not_found() {
    let results = results();
    let started = tokio::time::Instant::now();

    let notification = results.wait("req-missing").await.unwrap();

    assert!(!notification.successful);
    assert_eq!(notification.body, json!(RESULT_NOT_FOUND));
    assert!(started.elapsed() >= Duration::from_secs(65));
}
