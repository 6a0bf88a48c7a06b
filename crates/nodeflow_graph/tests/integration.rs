// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end tests driving the public API the way a host application
//! would: build a graph, wire it, evaluate, edit, re-evaluate.

use nodeflow_graph::{ComputeError, Graph, GraphError, NodeId, NodeSpec};
use std::cell::Cell;
use std::rc::Rc;

/// A constant source with a counter tracking how often it recomputed.
fn constant(value: f32, runs: &Rc<Cell<u32>>) -> NodeSpec {
    let runs = Rc::clone(runs);
    NodeSpec::new("constant")
        .with_output::<f32>("out")
        .with_compute(move |_, outputs| {
            runs.set(runs.get() + 1);
            outputs.write("out", value)?;
            Ok(())
        })
}

/// A two-input adder with a recompute counter.
fn adder(runs: &Rc<Cell<u32>>) -> NodeSpec {
    let runs = Rc::clone(runs);
    NodeSpec::new("sum")
        .with_input::<f32>("in1", 0.0)
        .with_input::<f32>("in2", 0.0)
        .with_output::<f32>("out")
        .with_compute(move |inputs, outputs| {
            runs.set(runs.get() + 1);
            let a: f32 = inputs.read("in1")?;
            let b: f32 = inputs.read("in2")?;
            outputs.write("out", a + b)?;
            Ok(())
        })
}

struct SumScenario {
    graph: Graph,
    a: NodeId,
    b: NodeId,
    c: NodeId,
    a_runs: Rc<Cell<u32>>,
    b_runs: Rc<Cell<u32>>,
    c_runs: Rc<Cell<u32>>,
}

/// A emits 3, B emits 4, C sums them: A.out -> C.in1, B.out -> C.in2.
fn sum_scenario() -> SumScenario {
    let a_runs = Rc::new(Cell::new(0));
    let b_runs = Rc::new(Cell::new(0));
    let c_runs = Rc::new(Cell::new(0));

    let mut graph = Graph::new("sum");
    let a = graph.add_node(constant(3.0, &a_runs));
    let b = graph.add_node(constant(4.0, &b_runs));
    let c = graph.add_node(adder(&c_runs));
    graph.connect(a, "out", c, "in1").unwrap();
    graph.connect(b, "out", c, "in2").unwrap();

    SumScenario {
        graph,
        a,
        b,
        c,
        a_runs,
        b_runs,
        c_runs,
    }
}

#[test]
fn test_evaluate_all_visits_every_node_once_in_order() {
    let runs = Rc::new(Cell::new(0));
    let mut graph = Graph::new("diamond");
    let top = graph.add_node(constant(1.0, &runs));
    let left = graph.add_node(adder(&runs));
    let right = graph.add_node(adder(&runs));
    let bottom = graph.add_node(adder(&runs));
    graph.connect(top, "out", left, "in1").unwrap();
    graph.connect(top, "out", right, "in1").unwrap();
    graph.connect(left, "out", bottom, "in1").unwrap();
    graph.connect(right, "out", bottom, "in2").unwrap();

    let report = graph.evaluate_all().unwrap();
    assert_eq!(report.computed.len(), 4);
    assert!(report.skipped.is_empty());

    // Every producer appears before its consumers.
    let position =
        |id: NodeId| report.computed.iter().position(|n| *n == id).unwrap();
    assert!(position(top) < position(left));
    assert!(position(top) < position(right));
    assert!(position(left) < position(bottom));
    assert!(position(right) < position(bottom));
}

#[test]
fn test_second_dirty_pass_recomputes_nothing() {
    let scenario = sum_scenario();
    let mut graph = scenario.graph;

    graph.evaluate_dirty().unwrap();
    let before = (
        scenario.a_runs.get(),
        scenario.b_runs.get(),
        scenario.c_runs.get(),
    );
    assert_eq!(before, (1, 1, 1));

    let report = graph.evaluate_dirty().unwrap();
    assert!(report.computed.is_empty());
    assert_eq!(
        (
            scenario.a_runs.get(),
            scenario.b_runs.get(),
            scenario.c_runs.get()
        ),
        before
    );
}

#[test]
fn test_type_mismatch_leaves_link_set_unchanged() {
    let runs = Rc::new(Cell::new(0));
    let mut graph = Graph::new("mismatch");
    let float_src = graph.add_node(constant(1.0, &runs));
    let int_sink = graph.add_node(NodeSpec::new("int sink").with_input::<i32>("in", 7));
    let float_sink = graph.add_node(adder(&runs));
    graph.connect(float_src, "out", float_sink, "in1").unwrap();
    let links_before = graph.link_count();

    let err = graph.connect(float_src, "out", int_sink, "in").unwrap_err();
    assert!(matches!(err, GraphError::TypeMismatch { .. }));
    assert_eq!(graph.link_count(), links_before);
    assert_eq!(graph.input_value::<i32>(int_sink, "in").unwrap(), 7);
}

#[test]
fn test_disconnect_reads_default_not_stale_data() {
    let scenario = sum_scenario();
    let mut graph = scenario.graph;
    graph.evaluate_all().unwrap();
    assert_eq!(graph.input_value::<f32>(scenario.c, "in2").unwrap(), 4.0);

    graph.disconnect_port(scenario.c, "in2").unwrap();
    assert_eq!(graph.input_value::<f32>(scenario.c, "in2").unwrap(), 0.0);

    graph.evaluate_dirty().unwrap();
    assert_eq!(graph.output_value::<f32>(scenario.c, "out").unwrap(), 3.0);
}

#[test]
fn test_cycle_fails_and_preserves_dirty_flags() {
    let runs = Rc::new(Cell::new(0));
    let mut graph = Graph::new("cyclic");
    let a = graph.add_node(adder(&runs));
    let b = graph.add_node(adder(&runs));
    graph.evaluate_all().unwrap();

    graph.connect(a, "out", b, "in1").unwrap();
    graph.connect(b, "out", a, "in1").unwrap();
    let flags_before: Vec<bool> = graph.nodes().map(|n| n.is_dirty()).collect();
    let runs_before = runs.get();

    for result in [
        graph.execution_order().map(|_| ()),
        graph.evaluate_all().map(|_| ()),
        graph.evaluate_dirty().map(|_| ()),
    ] {
        assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
    }

    let flags_after: Vec<bool> = graph.nodes().map(|n| n.is_dirty()).collect();
    assert_eq!(flags_before, flags_after);
    assert_eq!(runs.get(), runs_before);
}

#[test]
fn test_incremental_recompute_touches_only_affected_nodes() {
    let scenario = sum_scenario();
    let mut graph = scenario.graph;

    graph.evaluate_all().unwrap();
    assert_eq!(graph.output_value::<f32>(scenario.c, "out").unwrap(), 7.0);

    // Dirty only A: the pass must recompute A and C, not B.
    graph.mark_dirty(scenario.a).unwrap();
    let report = graph.evaluate_dirty().unwrap();
    assert_eq!(report.computed, vec![scenario.a, scenario.c]);
    assert_eq!(report.skipped, vec![scenario.b]);

    assert_eq!(graph.output_value::<f32>(scenario.c, "out").unwrap(), 7.0);
    assert_eq!(scenario.a_runs.get(), 2);
    assert_eq!(scenario.b_runs.get(), 1);
    assert_eq!(scenario.c_runs.get(), 2);
}

#[test]
fn test_removing_producer_reverts_consumer_to_default() {
    let scenario = sum_scenario();
    let mut graph = scenario.graph;
    graph.evaluate_all().unwrap();

    graph.remove_node(scenario.b).unwrap();
    assert!(graph.node(scenario.c).unwrap().is_dirty());
    assert_eq!(graph.input_value::<f32>(scenario.c, "in2").unwrap(), 0.0);
    assert_eq!(graph.link_count(), 1);

    graph.evaluate_dirty().unwrap();
    assert_eq!(graph.output_value::<f32>(scenario.c, "out").unwrap(), 3.0);
}

#[test]
fn test_replace_on_connect_rewires_single_input() {
    let scenario = sum_scenario();
    let mut graph = scenario.graph;
    graph.evaluate_all().unwrap();

    // Rewire C.in2 from B to A; the old link must disappear.
    graph.connect(scenario.a, "out", scenario.c, "in2").unwrap();
    assert_eq!(graph.link_count(), 2);
    assert!(graph
        .links()
        .all(|link| link.from_node != scenario.b));

    graph.evaluate_dirty().unwrap();
    assert_eq!(graph.output_value::<f32>(scenario.c, "out").unwrap(), 6.0);
}

#[test]
fn test_evaluate_from_propagates_downstream_only() {
    let scenario = sum_scenario();
    let mut graph = scenario.graph;
    graph.evaluate_all().unwrap();

    let report = graph.evaluate_from(scenario.b).unwrap();
    assert_eq!(report.computed, vec![scenario.b, scenario.c]);
    assert_eq!(report.skipped, vec![scenario.a]);
}

#[test]
fn test_edit_default_then_incremental_pass() {
    let runs = Rc::new(Cell::new(0));
    let c_runs = Rc::new(Cell::new(0));
    let mut graph = Graph::new("edit");
    let a = graph.add_node(constant(3.0, &runs));
    let c = graph.add_node(adder(&c_runs));
    graph.connect(a, "out", c, "in1").unwrap();
    graph.evaluate_all().unwrap();
    assert_eq!(graph.output_value::<f32>(c, "out").unwrap(), 3.0);

    // Only the edited node and its consumers recompute.
    graph.set_input_default(c, "in2", 10.0f32).unwrap();
    let report = graph.evaluate_dirty().unwrap();
    assert_eq!(report.computed, vec![c]);
    assert_eq!(graph.output_value::<f32>(c, "out").unwrap(), 13.0);
}

#[test]
fn test_failures_are_collected_and_independent_branches_progress() {
    let runs = Rc::new(Cell::new(0));
    let mut graph = Graph::new("faulty");
    let broken = graph.add_node(
        NodeSpec::new("broken")
            .with_output::<f32>("out")
            .with_compute(|_, _| Err(ComputeError::new("sensor offline"))),
    );
    let healthy = graph.add_node(constant(2.0, &runs));
    let healthy_sink = graph.add_node(adder(&runs));
    graph.connect(healthy, "out", healthy_sink, "in1").unwrap();

    let report = graph.evaluate_all().unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, broken);
    assert_eq!(report.failures[0].1.message(), "sensor offline");

    // The healthy branch still made progress.
    assert_eq!(
        graph.output_value::<f32>(healthy_sink, "out").unwrap(),
        2.0
    );
    assert!(graph.node(broken).unwrap().is_dirty());
}

#[test]
fn test_reading_unwritten_output_is_empty() {
    let mut graph = Graph::new("empty");
    let silent = graph.add_node(NodeSpec::new("silent").with_output::<f32>("out"));
    assert!(matches!(
        graph.output_value::<f32>(silent, "out"),
        Err(GraphError::Empty { .. })
    ));

    // A consumer connected to it reads Empty too, not the fallback.
    let sink = graph.add_node(NodeSpec::new("sink").with_input::<f32>("in", 1.0));
    graph.connect(silent, "out", sink, "in").unwrap();
    graph.evaluate_all().unwrap();
    assert!(matches!(
        graph.input_value::<f32>(sink, "in"),
        Err(GraphError::Empty { .. })
    ));
}

#[test]
fn test_heterogeneous_port_types_flow_through() {
    #[derive(Clone, Debug, PartialEq)]
    struct Sample {
        label: String,
        weight: f32,
    }

    let mut graph = Graph::new("hetero");
    let src = graph.add_node(
        NodeSpec::new("make sample")
            .with_output::<Sample>("sample")
            .with_compute(|_, outputs| {
                outputs.write(
                    "sample",
                    Sample {
                        label: "ore".to_string(),
                        weight: 1.25,
                    },
                )?;
                Ok(())
            }),
    );
    let dst = graph.add_node(
        NodeSpec::new("weigh")
            .with_input::<Sample>(
                "sample",
                Sample {
                    label: String::new(),
                    weight: 0.0,
                },
            )
            .with_output::<f32>("weight")
            .with_compute(|inputs, outputs| {
                let sample: Sample = inputs.read("sample")?;
                outputs.write("weight", sample.weight)?;
                Ok(())
            }),
    );
    graph.connect(src, "sample", dst, "sample").unwrap();
    graph.evaluate_all().unwrap();
    assert_eq!(graph.output_value::<f32>(dst, "weight").unwrap(), 1.25);
}
