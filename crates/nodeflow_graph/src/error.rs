// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for graph mutation and evaluation.

use crate::link::LinkId;
use crate::node::NodeId;
use crate::port::PortDirection;

/// Error returned by fallible graph operations.
///
/// Structural errors are reported before any mutation happens, so a failed
/// call leaves the graph unchanged.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node id does not exist in the graph.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Port label does not exist on the node.
    #[error("port '{port}' not found on node {node}")]
    PortNotFound {
        /// Node that was searched.
        node: NodeId,
        /// Requested port label.
        port: String,
    },

    /// Link id does not exist in the graph.
    #[error("link not found: {0}")]
    LinkNotFound(LinkId),

    /// Port has the wrong direction for the requested operation.
    #[error("port '{port}' is an {actual} port, expected an {expected} port")]
    DirectionMismatch {
        /// Offending port label.
        port: String,
        /// Direction the operation requires.
        expected: PortDirection,
        /// Direction the port actually has.
        actual: PortDirection,
    },

    /// Type tags of the two sides differ.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type the consumer side carries or the caller requested.
        expected: &'static str,
        /// Type that was actually present.
        found: &'static str,
    },

    /// Traversal found a back-edge; evaluation cannot proceed.
    #[error("cycle detected involving nodes [{}]", join_ids(.nodes))]
    CycleDetected {
        /// Ids of the nodes participating in the cycle.
        nodes: Vec<NodeId>,
    },

    /// Reading a data slot that was never written.
    #[error("no value written yet ({type_name})")]
    Empty {
        /// Type the empty slot is tagged with.
        type_name: &'static str,
    },

    /// A node's compute callback reported failure.
    #[error("compute failed on node {node}: {source}")]
    Compute {
        /// Node whose callback failed.
        node: NodeId,
        /// The callback's error.
        source: ComputeError,
    },
}

/// Failure reported by a node's compute callback.
///
/// The payload is opaque to the engine; it is recorded in the pass report
/// and the node stays dirty so it is retried on the next pass.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ComputeError {
    message: String,
}

impl ComputeError {
    /// Create a compute error carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The callback-supplied message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ComputeError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ComputeError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<GraphError> for ComputeError {
    fn from(err: GraphError) -> Self {
        Self::new(err.to_string())
    }
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_nodes() {
        let err = GraphError::CycleDetected {
            nodes: vec![NodeId(0), NodeId(2)],
        };
        assert_eq!(err.to_string(), "cycle detected involving nodes [0, 2]");
    }

    #[test]
    fn test_compute_error_from_graph_error() {
        let err = GraphError::NodeNotFound(NodeId(7));
        let compute: ComputeError = err.into();
        assert_eq!(compute.message(), "node not found: 7");
    }
}
