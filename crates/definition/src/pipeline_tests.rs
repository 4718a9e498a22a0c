// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use keel_core::TestDef;

#[yare::parameterized(
    simple = { "shop", true },
    dotted = { "shop.v2", true },
    mixed = { "eu-west_1", true },
    digit_first = { "1st", true },
    leading_dash = { "-shop", false },
    leading_dot = { ".shop", false },
    space = { "my shop", false },
    slash = { "team/shop", false },
    empty = { "", false },
)]
fn name_validation(name: &str, valid: bool) {
    assert_eq!(is_valid_name(name), valid);
}

#[test]
fn invalid_step_name_is_reported_with_its_field() {
    let err = PipelineDef::new(
        "shop".into(),
        "eu-1".into(),
        false,
        vec![StepData::new("eu west")],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ParseError::InvalidName { field, name } if field == "steps.name" && name == "eu west"
    ));
}

#[test]
fn invalid_test_name_is_rejected() {
    let mut step = StepData::new("eu");
    step.tests.push(TestDef {
        name: "smoke test".into(),
        path: "tests/smoke.yaml".into(),
        before: false,
    });
    let err = PipelineDef::new("shop".into(), "eu-1".into(), false, vec![step]).unwrap_err();
    assert!(matches!(err, ParseError::InvalidName { field, .. } if field == "steps.eu.tests.name"));
}

#[test]
fn reserved_root_step_is_rejected() {
    let err = PipelineDef::new(
        "shop".into(),
        "eu-1".into(),
        false,
        vec![StepData::new("ROOT")],
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::Graph(_)));
}

#[test]
fn clusters_are_distinct() {
    let mut us = StepData::new("us").depends_on(&["eu"]);
    us.cluster = "us-1".into();
    let pipeline = PipelineDef::new(
        "shop".into(),
        "eu-1".into(),
        false,
        vec![StepData::new("eu"), us, StepData::new("ap")],
    )
    .unwrap();
    assert_eq!(pipeline.clusters(), vec!["eu-1", "us-1"]);
}
