// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

fn diamond() -> PipelineGraph {
    PipelineGraph::build(vec![
        StepData::new("build"),
        StepData::new("eu").depends_on(&["build"]),
        StepData::new("us").depends_on(&["build"]),
        StepData::new("global").depends_on(&["eu", "us"]),
    ])
    .unwrap()
}

#[test]
fn independent_steps_hang_off_root() {
    let graph = PipelineGraph::build(vec![StepData::new("a"), StepData::new("b")]).unwrap();
    assert_eq!(graph.parents("a"), [ROOT_STEP.to_string()]);
    assert_eq!(graph.children(ROOT_STEP), ["a".to_string(), "b".to_string()]);
}

#[test]
fn diamond_orders_join_last() {
    assert_eq!(diamond().ordered_steps(), ["build", "eu", "us", "global"]);
}

#[test]
fn join_waits_for_slow_branch() {
    // "late" is reachable from root directly and via a longer chain
    let graph = PipelineGraph::build(vec![
        StepData::new("a"),
        StepData::new("b").depends_on(&["a"]),
        StepData::new("c").depends_on(&["b"]),
        StepData::new("late").depends_on(&["a", "c"]),
    ])
    .unwrap();
    assert_eq!(graph.ordered_steps(), ["a", "b", "c", "late"]);
}

#[test]
fn ties_break_by_declaration_order() {
    let graph = PipelineGraph::build(vec![
        StepData::new("z"),
        StepData::new("a"),
        StepData::new("m").depends_on(&["z"]),
    ])
    .unwrap();
    assert_eq!(graph.ordered_steps(), ["z", "a", "m"]);
}

#[parameterized(
    duplicate = { vec![StepData::new("a"), StepData::new("a")], GraphError::DuplicateStep("a".into()) },
    reserved = { vec![StepData::new(ROOT_STEP)], GraphError::ReservedName(ROOT_STEP.into()) },
    unknown = {
        vec![StepData::new("a").depends_on(&["ghost"])],
        GraphError::UnknownDependency { step: "a".into(), dependency: "ghost".into() }
    },
    cycle = {
        vec![
            StepData::new("a"),
            StepData::new("b").depends_on(&["a", "c"]),
            StepData::new("c").depends_on(&["b"]),
        ],
        GraphError::Cycle("b".into())
    },
    self_loop = {
        vec![StepData::new("a").depends_on(&["a"])],
        GraphError::Cycle("a".into())
    },
)]
fn build_rejects_invalid_graphs(steps: Vec<StepData>, expected: GraphError) {
    assert_eq!(PipelineGraph::build(steps).unwrap_err(), expected);
}

#[parameterized(
    first_root_child = { "build", vec![] },
    fan_out_sibling = { "us", vec!["build", "eu"] },
    join = { "global", vec!["build", "eu", "us"] },
    unknown = { "nope", vec![] },
)]
fn preceding_steps_follow_breadth_first_order(step: &str, expected: Vec<&str>) {
    assert_eq!(diamond().preceding_steps(step), expected);
}

#[test]
fn preceding_steps_include_earlier_root_siblings() {
    let graph = PipelineGraph::build(vec![StepData::new("a"), StepData::new("b")]).unwrap();
    assert_eq!(graph.preceding_steps("b"), ["a"]);
    assert!(graph.preceding_steps("a").is_empty());
}

#[test]
fn step_lookup() {
    let graph = diamond();
    assert_eq!(graph.step("eu").map(|s| s.name.as_str()), Some("eu"));
    assert!(graph.step(ROOT_STEP).is_none());
    assert_eq!(graph.step_names().len(), 4);
}

/// Random DAG: step `i` may only depend on steps declared before it
fn arb_dag() -> impl Strategy<Value = Vec<StepData>> {
    (1usize..12)
        .prop_flat_map(|n| proptest::collection::vec(proptest::collection::vec(any::<bool>(), n), n))
        .prop_map(|matrix| {
            matrix
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    let mut step = StepData::new(format!("s{i}"));
                    step.dependencies = (0..i).filter(|j| row[*j]).map(|j| format!("s{j}")).collect();
                    step
                })
                .collect()
        })
}

proptest! {
    #[test]
    fn ordering_respects_dependencies(steps in arb_dag()) {
        let graph = PipelineGraph::build(steps.clone()).unwrap();
        let order = graph.ordered_steps();
        prop_assert_eq!(order.len(), steps.len());

        let position: HashMap<&str, usize> =
            order.iter().enumerate().map(|(i, s)| (s.as_str(), i)).collect();
        for step in &steps {
            for dep in &step.dependencies {
                prop_assert!(position[dep.as_str()] < position[step.name.as_str()]);
            }
        }
    }

    #[test]
    fn preceding_steps_never_contain_the_step(steps in arb_dag()) {
        let graph = PipelineGraph::build(steps.clone()).unwrap();
        for step in &steps {
            prop_assert!(!graph.preceding_steps(&step.name).contains(&step.name));
        }
    }
}
