// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::http::test_server::serve_once;
use keel_core::{HealthStatus, SyncStatus};

#[tokio::test]
async fn deploy_posts_payload_and_parses_result() {
    let (url, server) = serve_once(
        200,
        r#"{"app_name":"web","namespace":"prod","revision_hash":"abc123"}"#,
    );
    let driver = HttpDriver::new(&url);

    let result = driver
        .deploy(&DeployKind::App, "prod", "kind: Application", "abc123")
        .await
        .unwrap();

    assert_eq!(result.app_name, "web");
    assert_eq!(result.revision_hash, "abc123");
    let (request_line, body) = server.join().unwrap();
    assert!(request_line.starts_with("POST /deploy"));
    let sent: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(sent["kind"], "app");
    assert_eq!(sent["payload"], "kind: Application");
}

#[tokio::test]
async fn resource_statuses_are_read_from_app_path() {
    let (url, server) = serve_once(
        200,
        r#"[{"version":"v1","kind":"Service","name":"web","health":"Degraded","sync":"Synced"}]"#,
    );
    let statuses = HttpDriver::new(&url)
        .get_app_resource_statuses("web")
        .await
        .unwrap();

    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].health, HealthStatus::Degraded);
    assert_eq!(statuses[0].sync, SyncStatus::Synced);
    let (request_line, _) = server.join().unwrap();
    assert!(request_line.starts_with("GET /apps/web/resources"));
}

#[tokio::test]
async fn current_revision_unwraps_field() {
    let (url, server) = serve_once(200, r#"{"revision":"f00d"}"#);
    let revision = HttpDriver::new(&url)
        .get_current_revision("web")
        .await
        .unwrap();
    assert_eq!(revision, "f00d");
    server.join().unwrap();
}

#[tokio::test]
async fn client_error_is_not_retryable() {
    let (url, server) = serve_once(422, "invalid manifest");
    let err = HttpDriver::new(&url).sync("web").await.unwrap_err();
    assert!(matches!(err, DriverError::Rejected { status: 422, .. }));
    assert!(!err.is_retryable());
    server.join().unwrap();
}

#[tokio::test]
async fn server_error_is_retryable() {
    let (url, server) = serve_once(503, "");
    let err = HttpDriver::new(&url)
        .delete_by_label("web-shop-stale", "prod")
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    server.join().unwrap();
}

#[tokio::test]
async fn missing_app_is_not_found() {
    let (url, server) = serve_once(404, "");
    let err = HttpDriver::new(&url)
        .get_operation_success("ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::NotFound(_)));
    server.join().unwrap();
}

#[tokio::test]
async fn garbage_body_is_invalid_response() {
    let (url, server) = serve_once(200, "<html>");
    let err = HttpDriver::new(&url).sync("web").await.unwrap_err();
    assert!(matches!(err, DriverError::InvalidResponse(_)));
    server.join().unwrap();
}

#[tokio::test]
async fn job_status_reads_counts() {
    let (url, server) = serve_once(200, r#"{"succeeded":1,"failed":0,"expected":1}"#);
    let status = HttpDriver::new(&url)
        .get_job_status("smoke", "prod")
        .await
        .unwrap();
    assert!(status.is_done());
    let (request_line, _) = server.join().unwrap();
    assert!(request_line.starts_with("GET /jobs/prod/smoke"));
}

#[tokio::test]
async fn delete_job_passes_kind() {
    let (url, server) = serve_once(200, "");
    HttpDriver::new(&url)
        .delete_job("smoke", "prod", crate::jobs::JOB_KIND)
        .await
        .unwrap();
    let (request_line, _) = server.join().unwrap();
    assert!(request_line.starts_with("DELETE /jobs/prod/smoke?kind=Job"));
}
