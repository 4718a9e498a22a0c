// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn coords(path: &str) -> SourceCoordinates {
    SourceCoordinates {
        repo_url: "https://git.example.com/shop".into(),
        path: path.into(),
        ..SourceCoordinates::default()
    }
}

#[test]
fn default_revision_is_main() {
    assert_eq!(SourceCoordinates::default().target_revision, "main");
    let parsed: SourceCoordinates = serde_json::from_str(r#"{"repo_url":"r"}"#).unwrap();
    assert_eq!(parsed.target_revision, "main");
}

#[test]
fn unknown_metadata_never_matches() {
    let known = StepMetadata {
        source: Some(coords("apps/web")),
    };
    let unknown = StepMetadata::default();
    assert!(!known.shares_source_with(&unknown));
    assert!(!unknown.shares_source_with(&unknown));
}

#[test]
fn matching_requires_every_field() {
    let a = StepMetadata {
        source: Some(coords("apps/web")),
    };
    let b = StepMetadata {
        source: Some(coords("apps/web")),
    };
    let c = StepMetadata {
        source: Some(coords("apps/api")),
    };
    assert!(a.shares_source_with(&b));
    assert!(!a.shares_source_with(&c));
}
