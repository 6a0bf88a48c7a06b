// SPDX-License-Identifier: MIT OR Apache-2.0
//! Diagnostic renderings of the graph structure.
//!
//! These produce text for the caller to display or save; the engine
//! itself never touches the filesystem.

use crate::graph::Graph;
use std::fmt::Write;

impl Graph {
    /// Render the graph as a Graphviz digraph.
    ///
    /// Convert with e.g. `dot export.dot -Tsvg > output.svg`.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph root {{");
        let _ = writeln!(out, "label=\"{}\";", self.name());
        let _ = writeln!(out, "labelloc=\"t\";");
        let _ = writeln!(out, "rankdir=TD;");
        let _ = writeln!(out, "ranksep=0.5;");
        let _ = writeln!(out, "node [shape=record];");
        for node in self.nodes() {
            let _ = writeln!(out, "n{} [label=\"{}\"];", node.id(), node.label());
        }
        for (from, targets) in self.connectivity_downstream() {
            for to in targets {
                let _ = writeln!(out, "n{from} -> n{to};");
            }
        }
        out.push_str("}\n");
        out
    }

    /// Render the graph as a Mermaid flowchart.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "---");
        let _ = writeln!(out, "title: {}", self.name());
        let _ = writeln!(out, "---");
        let _ = writeln!(out, "flowchart LR");
        for node in self.nodes() {
            let _ = writeln!(out, "    n{}([{}])", node.id(), node.label());
        }
        for (from, targets) in self.connectivity_downstream() {
            for to in targets {
                let _ = writeln!(out, "    n{from} --> n{to}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::Graph;
    use crate::node::NodeSpec;

    fn wired_graph() -> Graph {
        let mut graph = Graph::new("demo");
        let a = graph.add_node(NodeSpec::new("source").with_output::<f32>("value"));
        let b = graph.add_node(NodeSpec::new("target").with_input::<f32>("in", 0.0));
        graph.connect(a, "value", b, "in").unwrap();
        graph
    }

    #[test]
    fn test_dot_lists_nodes_and_edges() {
        let dot = wired_graph().to_dot();
        assert!(dot.starts_with("digraph root {"));
        assert!(dot.contains("label=\"demo\";"));
        assert!(dot.contains("n0 [label=\"source\"];"));
        assert!(dot.contains("n1 [label=\"target\"];"));
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_mermaid_flowchart_shape() {
        let mermaid = wired_graph().to_mermaid();
        assert!(mermaid.contains("title: demo"));
        assert!(mermaid.contains("flowchart LR"));
        assert!(mermaid.contains("n0([source])"));
        assert!(mermaid.contains("n0 --> n1"));
    }
}
