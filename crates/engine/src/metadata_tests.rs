// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use keel_core::{DeploymentLog, StepData};
use keel_storage::KvStore;

fn shop() -> PipelineRef {
    PipelineRef::new("acme", "web", "shop")
}

fn manifest(path: &str) -> String {
    format!(
        "apiVersion: argoproj.io/v1alpha1\n\
         kind: Application\n\
         spec:\n  source:\n    repoURL: https://git.example.com/shop\n    path: {path}\n"
    )
}

/// eu -> us, plus an independent ap
fn graph() -> PipelineGraph {
    PipelineGraph::build(vec![
        StepData::new("eu"),
        StepData::new("ap"),
        StepData::new("us").depends_on(&["eu"]),
    ])
    .unwrap()
}

fn deployed(store: &KvStore, step: &str, revision: &str) {
    let log = DeploymentLog {
        revision_hash: revision.into(),
        ..DeploymentLog::start("v1", "abc")
    };
    AuditLog::new(store.clone())
        .append_log(&shop(), step, &log.into())
        .unwrap();
}

#[test]
fn manifest_source_defaults_revision_to_main() {
    let coords = source_from_manifest(&manifest("apps/web")).unwrap();
    assert_eq!(coords.repo_url, "https://git.example.com/shop");
    assert_eq!(coords.path, "apps/web");
    assert_eq!(coords.target_revision, "main");

    let pinned = source_from_manifest(
        "spec:\n  source:\n    repoURL: r\n    targetRevision: v2\n    path: p\n",
    )
    .unwrap();
    assert_eq!(pinned.target_revision, "v2");
}

#[test]
fn manifest_without_source_is_invalid() {
    let err = source_from_manifest("kind: Application\n").unwrap_err();
    assert!(matches!(err, EngineError::InvalidManifest(_)));
}

#[test]
fn assert_source_reports_changes_only() {
    let handler = MetadataHandler::new(KvStore::in_memory());
    assert!(handler.assert_source(&shop(), "eu", &manifest("apps/web")).unwrap());
    assert!(!handler.assert_source(&shop(), "eu", &manifest("apps/web")).unwrap());
    assert!(handler.assert_source(&shop(), "eu", &manifest("apps/api")).unwrap());
    assert_eq!(
        handler.get(&shop(), "eu").unwrap().source.unwrap().path,
        "apps/api"
    );
}

#[test]
fn revision_lock_follows_preceding_sibling() {
    let store = KvStore::in_memory();
    let handler = MetadataHandler::new(store.clone());
    handler.assert_source(&shop(), "eu", &manifest("apps/web")).unwrap();
    handler.assert_source(&shop(), "us", &manifest("apps/web")).unwrap();
    deployed(&store, "eu", "rev-eu");

    let lock = handler.revision_lock(&shop(), &graph(), "us").unwrap();
    assert_eq!(lock.as_deref(), Some("rev-eu"));
}

#[test]
fn no_lock_without_shared_source() {
    let store = KvStore::in_memory();
    let handler = MetadataHandler::new(store.clone());
    handler.assert_source(&shop(), "eu", &manifest("apps/web")).unwrap();
    handler.assert_source(&shop(), "us", &manifest("apps/api")).unwrap();
    deployed(&store, "eu", "rev-eu");

    assert!(handler.revision_lock(&shop(), &graph(), "us").unwrap().is_none());
    assert!(handler.revision_lock(&shop(), &graph(), "eu").unwrap().is_none());
}

#[test]
fn empty_revision_is_no_lock() {
    let store = KvStore::in_memory();
    let handler = MetadataHandler::new(store.clone());
    handler.assert_source(&shop(), "eu", &manifest("apps/web")).unwrap();
    handler.assert_source(&shop(), "us", &manifest("apps/web")).unwrap();
    deployed(&store, "eu", "");

    assert!(handler.revision_lock(&shop(), &graph(), "us").unwrap().is_none());
}

#[test]
fn same_source_lists_other_steps() {
    let handler = MetadataHandler::new(KvStore::in_memory());
    handler.assert_source(&shop(), "eu", &manifest("apps/web")).unwrap();
    handler.assert_source(&shop(), "us", &manifest("apps/web")).unwrap();
    handler.assert_source(&shop(), "ap", &manifest("apps/api")).unwrap();

    let same = handler.steps_with_same_source(&shop(), &graph(), "eu").unwrap();
    assert_eq!(same, vec!["us".to_string()]);
}
