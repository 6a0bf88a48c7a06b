// SPDX-License-Identifier: MIT OR Apache-2.0
//! Calculator pipeline built on the nodeflow graph engine.
//!
//! Wires constant values, a vector summation, an adder, and a printer
//! into a small graph, evaluates it, then edits one value and runs an
//! incremental pass that recomputes only the affected chain.

use nodeflow_graph::{Graph, NodeRegistry, NodeSpec, NodeTemplate, PassReport};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// A simple 2D vector, to show ports carrying arbitrary user types.
#[derive(Debug, Clone, Copy, Default)]
struct Vec2 {
    x: f32,
    y: f32,
}

/// Node emitting a constant float.
fn value_node(value: f32) -> NodeSpec {
    NodeSpec::new("value")
        .with_output::<f32>("value")
        .with_compute(move |_, outputs| {
            outputs.write("value", value)?;
            Ok(())
        })
}

/// Node emitting a constant vector.
fn vec2_node(x: f32, y: f32) -> NodeSpec {
    NodeSpec::new("vec2")
        .with_output::<Vec2>("value")
        .with_compute(move |_, outputs| {
            outputs.write("value", Vec2 { x, y })?;
            Ok(())
        })
}

/// Templates shared by every calculator instance.
fn build_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(NodeTemplate::new("add", "Add", "math", || {
        NodeSpec::new("add")
            .with_input::<f32>("a", 0.0)
            .with_input::<f32>("b", 0.0)
            .with_output::<f32>("a + b")
            .with_compute(|inputs, outputs| {
                let a: f32 = inputs.read("a")?;
                let b: f32 = inputs.read("b")?;
                outputs.write("a + b", a + b)?;
                Ok(())
            })
    }));

    registry.register(NodeTemplate::new("sum_vec", "Sum Components", "math", || {
        NodeSpec::new("sum_vec")
            .with_input::<Vec2>("vec", Vec2::default())
            .with_output::<f32>("sum")
            .with_compute(|inputs, outputs| {
                let vec: Vec2 = inputs.read("vec")?;
                outputs.write("sum", vec.x + vec.y)?;
                Ok(())
            })
    }));

    registry.register(NodeTemplate::new("print", "Print", "io", || {
        NodeSpec::new("print")
            .with_input::<f32>("in", 0.0)
            .with_compute(|inputs, _| {
                let value: f32 = inputs.read("in")?;
                println!("PRINTING: {value}");
                Ok(())
            })
    }));

    registry
}

fn log_report(stage: &str, report: &PassReport) {
    tracing::info!(
        stage,
        computed = report.computed.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        "pass finished"
    );
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let registry = build_registry();
    let mut graph = Graph::new("calculator");

    let vec = graph.add_node(vec2_node(1.0, 2.0));
    let value = graph.add_node(value_node(4.0));
    let sum_vec = graph.add_node(registry.spawn("sum_vec").ok_or("unknown template: sum_vec")?);
    let add = graph.add_node(registry.spawn("add").ok_or("unknown template: add")?);
    let print = graph.add_node(registry.spawn("print").ok_or("unknown template: print")?);

    graph.connect(vec, "value", sum_vec, "vec")?;
    graph.connect(sum_vec, "sum", add, "a")?;
    graph.connect(value, "value", add, "b")?;
    graph.connect(add, "a + b", print, "in")?;

    let report = graph.evaluate_all()?.into_result()?;
    log_report("full", &report);
    tracing::info!("a + b = {}", graph.output_value::<f32>(add, "a + b")?);

    // Re-dirty one constant: only its downstream chain recomputes.
    let report = graph.evaluate_from(value)?.into_result()?;
    log_report("incremental", &report);

    println!("{}", graph.to_dot());
    Ok(())
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("nodeflow_calc=debug".parse().unwrap())
        .add_directive("nodeflow_graph=debug".parse().unwrap());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting calculator demo v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("calculator failed: {e}");
        std::process::exit(1);
    }
}
