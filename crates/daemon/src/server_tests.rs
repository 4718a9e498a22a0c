// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use keel_core::{
    ClusterRecord, CommandEvent, CommandMetadata, CommandPacket, Delivery, Notification,
    SequentialIdGen, WatchKey, WatchKind,
};
use keel_storage::KvStore;
use std::time::Duration;

const SHOP: &str = r#"
name = "shop"
cluster = "eu-1"

[[steps]]
name = "eu"
app_path = "deploy/storefront.yaml"

[[steps]]
name = "us"
app_path = "deploy/storefront.yaml"
dependencies = ["eu"]
"#;

fn quick_policy() -> WaitPolicy {
    WaitPolicy {
        initial_delay: Duration::from_millis(100),
        poll_interval: Duration::from_millis(100),
        max_polls: 5,
    }
}

struct Setup {
    handler: Handler<KvStore, SequentialIdGen>,
    store: KvStore,
    watches: mpsc::Receiver<WatchMessage>,
    shutdown: CancellationToken,
}

fn setup() -> Setup {
    let store = KvStore::in_memory();
    let (tx, watches) = mpsc::channel(16);
    let shutdown = CancellationToken::new();
    let definition = keel_definition::parse_pipeline(SHOP).unwrap();
    let handler = Handler::new(
        store.clone(),
        SequentialIdGen::new(),
        quick_policy(),
        HashMap::from([(definition.name.clone(), definition)]),
        HashMap::from([("eu-1".to_string(), tx)]),
        shutdown.clone(),
    );
    Setup {
        handler,
        store,
        watches,
        shutdown,
    }
}

async fn with_cluster() -> Setup {
    let s = setup();
    let response = s
        .handler
        .handle(Request::CreateCluster {
            org: "acme".into(),
            cluster: ClusterRecord::new("eu-1", "https://eu-1"),
        })
        .await;
    assert_eq!(response, Response::Ok);
    s
}

fn packet() -> CommandPacket {
    CommandPacket::new(
        "apps",
        CommandEvent::DeployNamedApp {
            meta: CommandMetadata::default(),
            app_name: "storefront".into(),
        },
    )
}

fn shop() -> PipelineRef {
    PipelineRef::new("acme", "web", "shop")
}

fn is_bad_request(response: &Response) -> bool {
    matches!(response, Response::Error { bad_request: true, .. })
}

#[tokio::test]
async fn ping_hello_and_status() {
    let s = setup();

    assert_eq!(s.handler.handle(Request::Ping).await, Response::Pong);
    assert_eq!(
        s.handler
            .handle(Request::Hello {
                version: "0.0.0".into()
            })
            .await,
        Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        }
    );
    match s.handler.handle(Request::Status).await {
        Response::Status {
            clusters,
            pipelines,
            ..
        } => {
            assert_eq!(clusters, vec!["eu-1".to_string()]);
            assert_eq!(pipelines, 1);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn shutdown_cancels_the_token() {
    let s = setup();
    assert_eq!(s.handler.handle(Request::Shutdown).await, Response::ShuttingDown);
    assert!(s.shutdown.is_cancelled());
}

// =============================================================================
// Clusters
// =============================================================================

#[tokio::test]
async fn cluster_crud() {
    let s = with_cluster().await;

    let duplicate = s
        .handler
        .handle(Request::CreateCluster {
            org: "acme".into(),
            cluster: ClusterRecord::new("eu-1", "https://elsewhere"),
        })
        .await;
    assert!(is_bad_request(&duplicate));

    let listed = s
        .handler
        .handle(Request::ListClusters { org: "acme".into() })
        .await;
    assert_eq!(
        listed,
        Response::Clusters {
            clusters: vec![ClusterRecord::new("eu-1", "https://eu-1")]
        }
    );

    let deleted = s
        .handler
        .handle(Request::DeleteCluster {
            org: "acme".into(),
            cluster: "eu-1".into(),
        })
        .await;
    assert_eq!(deleted, Response::Ok);

    let found = s
        .handler
        .handle(Request::GetCluster {
            org: "acme".into(),
            cluster: "eu-1".into(),
        })
        .await;
    assert_eq!(found, Response::Cluster { cluster: None });
}

#[tokio::test]
async fn deleting_a_missing_cluster_is_a_bad_request() {
    let s = setup();
    let response = s
        .handler
        .handle(Request::DeleteCluster {
            org: "acme".into(),
            cluster: "nowhere".into(),
        })
        .await;
    assert!(is_bad_request(&response));
}

#[tokio::test(start_paused = true)]
async fn set_no_deploy_waits_for_the_agent() {
    let s = with_cluster().await;
    let handler = s.handler.clone();
    let pending = tokio::spawn(async move {
        handler
            .handle(Request::SetNoDeploy {
                org: "acme".into(),
                cluster: "eu-1".into(),
                namespace: Some("apps".into()),
                reason: "freeze".into(),
                requested_by: "ops".into(),
            })
            .await
    });

    // The agent's side: see the notification, post its result
    tokio::time::sleep(Duration::from_millis(10)).await;
    let peeked = s
        .handler
        .handle(Request::Peek {
            org: "acme".into(),
            cluster: "eu-1".into(),
        })
        .await;
    let Response::Delivery {
        delivery: Some(Delivery::Notification(packet)),
    } = peeked
    else {
        panic!("expected a notification, got {:?}", peeked);
    };
    assert_eq!(
        packet.request,
        NotificationRequest::MarkNoDeploy {
            cluster: "eu-1".into(),
            namespace: Some("apps".into()),
            apply: true,
        }
    );
    s.handler
        .handle(Request::PostNotification {
            request_id: packet.request_id,
            notification: Notification::ok(serde_json::Value::Null),
        })
        .await;

    assert_eq!(
        pending.await.unwrap(),
        Response::Notification {
            notification: Notification::ok(serde_json::Value::Null)
        }
    );
    let record = ClusterRegistry::new(s.store.clone()).get("acme", "eu-1").unwrap();
    assert!(record.blocks_namespace("apps"));
    assert!(!record.is_paused());
}

#[tokio::test(start_paused = true)]
async fn unanswered_no_deploy_reports_not_found() {
    let s = with_cluster().await;
    let response = s
        .handler
        .handle(Request::ClearNoDeploy {
            org: "acme".into(),
            cluster: "eu-1".into(),
            namespace: None,
        })
        .await;
    assert_eq!(
        response,
        Response::Notification {
            notification: Notification::not_found()
        }
    );
}

// =============================================================================
// Queue
// =============================================================================

#[tokio::test]
async fn enqueue_peek_and_ack() {
    let s = with_cluster().await;
    let org = || "acme".to_string();
    let cluster = || "eu-1".to_string();

    let enqueued = s
        .handler
        .handle(Request::EnqueueCommand {
            org: org(),
            cluster: cluster(),
            packet: packet(),
        })
        .await;
    assert_eq!(enqueued, Response::Ok);

    let peeked = s
        .handler
        .handle(Request::Peek {
            org: org(),
            cluster: cluster(),
        })
        .await;
    assert_eq!(
        peeked,
        Response::Delivery {
            delivery: Some(Delivery::Command(packet()))
        }
    );

    s.handler
        .handle(Request::Retry {
            org: org(),
            cluster: cluster(),
        })
        .await;
    let Response::Delivery {
        delivery: Some(Delivery::Command(retried)),
    } = s
        .handler
        .handle(Request::Peek {
            org: org(),
            cluster: cluster(),
        })
        .await
    else {
        panic!("expected the retried command");
    };
    assert_eq!(retried.retry_count, 1);

    s.handler
        .handle(Request::Ack {
            org: org(),
            cluster: cluster(),
        })
        .await;
    let depth = s
        .handler
        .handle(Request::QueueDepth {
            org: org(),
            cluster: cluster(),
        })
        .await;
    assert_eq!(
        depth,
        Response::Depth {
            depth: keel_engine::QueueDepth::default()
        }
    );
}

#[tokio::test]
async fn enqueue_for_an_unknown_cluster_is_a_bad_request() {
    let s = setup();
    let response = s
        .handler
        .handle(Request::EnqueueCommand {
            org: "acme".into(),
            cluster: "eu-1".into(),
            packet: packet(),
        })
        .await;
    assert!(is_bad_request(&response));
}

#[tokio::test(start_paused = true)]
async fn notification_round_trip() {
    let s = with_cluster().await;

    let response = s
        .handler
        .handle(Request::EnqueueNotification {
            org: "acme".into(),
            cluster: "eu-1".into(),
            request: NotificationRequest::Aggregate {
                cluster: "eu-1".into(),
                namespace: None,
            },
        })
        .await;
    let Response::RequestId { request_id } = response else {
        panic!("expected a request id, got {:?}", response);
    };

    let body = serde_json::json!({"healthy": 3});
    s.handler
        .handle(Request::PostNotification {
            request_id: request_id.clone(),
            notification: Notification::ok(body.clone()),
        })
        .await;

    assert_eq!(
        s.handler
            .handle(Request::AwaitNotification { request_id })
            .await,
        Response::Notification {
            notification: Notification::ok(body)
        }
    );
}

// =============================================================================
// Watches
// =============================================================================

#[tokio::test]
async fn submit_watch_sends_one_batch() {
    let mut s = setup();
    let key = WatchKey::new(WatchKind::App, &CommandMetadata::default(), "storefront", "apps");

    let response = s
        .handler
        .handle(Request::SubmitWatch {
            cluster: "eu-1".into(),
            keys: vec![key.clone()],
        })
        .await;

    assert_eq!(response, Response::Ok);
    assert_eq!(s.watches.recv().await, Some(WatchMessage::Key(key)));
    assert_eq!(s.watches.recv().await, Some(WatchMessage::EndOfBatch));
}

#[tokio::test]
async fn submit_watch_without_a_reconciler() {
    let s = setup();
    let response = s
        .handler
        .handle(Request::SubmitWatch {
            cluster: "us-1".into(),
            keys: Vec::new(),
        })
        .await;
    assert!(is_bad_request(&response));
}

#[tokio::test]
async fn submit_watch_to_a_stopped_reconciler() {
    let s = setup();
    drop(s.watches);
    let response = s
        .handler
        .handle(Request::SubmitWatch {
            cluster: "eu-1".into(),
            keys: Vec::new(),
        })
        .await;
    assert!(matches!(
        response,
        Response::Error {
            bad_request: false,
            ..
        }
    ));
}

// =============================================================================
// Pipelines
// =============================================================================

#[tokio::test]
async fn status_uses_the_definition_steps() {
    let s = setup();
    let logs = DeploymentLogs::new(s.store.clone());
    logs.init_step_log(&shop(), "eu", "run-1", "c0ffee").unwrap();

    let response = s
        .handler
        .handle(Request::PipelineStatus {
            pipeline: shop(),
            uvn: None,
        })
        .await;

    let Response::PipelineStatus { status } = response else {
        panic!("expected a status, got {:?}", response);
    };
    assert_eq!(status.progressing_steps, vec!["eu".to_string()]);
    assert!(!status.complete);
}

#[tokio::test]
async fn status_of_an_undefined_pipeline_without_runs() {
    let s = setup();
    let response = s
        .handler
        .handle(Request::PipelineStatus {
            pipeline: PipelineRef::new("acme", "web", "unknown"),
            uvn: None,
        })
        .await;
    assert!(is_bad_request(&response));
}

#[tokio::test]
async fn cancel_then_read_logs_and_history() {
    let s = setup();
    let logs = DeploymentLogs::new(s.store.clone());
    let runs = PipelineRuns::new(s.store.clone());
    runs.start_run(&shop(), "run-1", vec!["eu".into(), "us".into()], chrono::Utc::now())
        .unwrap();
    logs.init_step_log(&shop(), "eu", "run-1", "c0ffee").unwrap();

    let cancelled = s
        .handler
        .handle(Request::CancelPipeline { pipeline: shop() })
        .await;
    assert_eq!(
        cancelled,
        Response::Cancelled {
            uvn: Some("run-1".into())
        }
    );

    let Response::Logs { logs } = s
        .handler
        .handle(Request::StepLogs {
            pipeline: shop(),
            step: "us".into(),
            page: 0,
        })
        .await
    else {
        panic!("expected logs");
    };
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].pipeline_uvn(), "run-1");

    let Response::Runs { runs } = s
        .handler
        .handle(Request::RunHistory {
            pipeline: shop(),
            count: 5,
        })
        .await
    else {
        panic!("expected runs");
    };
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].uvn, "run-1");
}
