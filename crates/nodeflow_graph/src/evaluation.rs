// SPDX-License-Identifier: MIT OR Apache-2.0
//! Execution ordering and evaluation passes.
//!
//! Evaluation is pull-based and synchronous: a pass computes a topological
//! order over the whole node set, then walks it once on the calling
//! thread. Cycle detection fails the pass before any node runs; per-node
//! compute failures do not abort it.

use crate::error::{ComputeError, GraphError};
use crate::graph::Graph;
use crate::node::{Evaluation, NodeId};
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// Traversal mark. A node encountered while still in progress closes a
/// cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Summary of one evaluation pass.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Nodes whose callbacks ran, in execution order.
    pub computed: Vec<NodeId>,
    /// Nodes visited clean and skipped.
    pub skipped: Vec<NodeId>,
    /// Per-node compute failures. Failed nodes stay dirty and are retried
    /// on the next pass.
    pub failures: Vec<(NodeId, ComputeError)>,
}

impl PassReport {
    /// True when no node failed during the pass.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert the report into an error carrying the first recorded
    /// failure, for callers that treat any failure as fatal.
    pub fn into_result(self) -> Result<Self, GraphError> {
        match self.failures.first() {
            Some((node, err)) => Err(GraphError::Compute {
                node: *node,
                source: err.clone(),
            }),
            None => Ok(self),
        }
    }
}

impl Graph {
    /// Topological order of all nodes, following links from producers to
    /// consumers.
    ///
    /// Iterative depth-first traversal with a three-color mark. Nodes with
    /// no ordering constraint between them come out in ascending id order,
    /// so the result is deterministic. Fails with
    /// [`GraphError::CycleDetected`] naming the nodes on the cycle, before
    /// anything is mutated.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut ids: Vec<NodeId> = self.node_ids().collect();
        ids.sort_unstable();

        // Downstream adjacency with children sorted descending: roots are
        // also walked descending, so the reversed postorder below yields
        // ascending ids among unordered nodes.
        let mut downstream: HashMap<NodeId, Vec<NodeId>> =
            ids.iter().map(|id| (*id, Vec::new())).collect();
        for link in self.links() {
            if let Some(children) = downstream.get_mut(&link.from_node) {
                children.push(link.to_node);
            }
        }
        for children in downstream.values_mut() {
            children.sort_unstable_by(|a, b| b.cmp(a));
            children.dedup();
        }

        let mut marks: HashMap<NodeId, Mark> =
            ids.iter().map(|id| (*id, Mark::Unvisited)).collect();
        let mut order: Vec<NodeId> = Vec::with_capacity(ids.len());
        let mut stack: Vec<(NodeId, usize)> = Vec::new();

        for &root in ids.iter().rev() {
            if marks.get(&root) != Some(&Mark::Unvisited) {
                continue;
            }
            marks.insert(root, Mark::InProgress);
            stack.push((root, 0));

            while let Some(&(id, next)) = stack.last() {
                let children = downstream.get(&id).map_or(&[][..], Vec::as_slice);
                if next < children.len() {
                    if let Some(frame) = stack.last_mut() {
                        frame.1 += 1;
                    }
                    let child = children[next];
                    match marks.get(&child).copied().unwrap_or(Mark::Done) {
                        Mark::Unvisited => {
                            marks.insert(child, Mark::InProgress);
                            stack.push((child, 0));
                        }
                        Mark::InProgress => {
                            let start = stack
                                .iter()
                                .position(|(node, _)| *node == child)
                                .unwrap_or(0);
                            let nodes: Vec<NodeId> =
                                stack[start..].iter().map(|(node, _)| *node).collect();
                            warn!(graph = self.name(), ?nodes, "cycle detected");
                            return Err(GraphError::CycleDetected { nodes });
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks.insert(id, Mark::Done);
                    order.push(id);
                    stack.pop();
                }
            }
        }

        order.reverse();
        Ok(order)
    }

    /// Evaluate every node in topological order, regardless of dirty
    /// state.
    ///
    /// Fails fast with [`GraphError::CycleDetected`] before any node runs
    /// and before any dirty flag changes. Compute failures are collected
    /// per node and do not abort the pass.
    pub fn evaluate_all(&mut self) -> Result<PassReport, GraphError> {
        let order = self.execution_order()?;
        debug!(graph = self.name(), nodes = order.len(), "full evaluation pass");
        for id in &order {
            if let Some(node) = self.node_mut(*id) {
                node.mark_dirty();
            }
        }
        Ok(self.run_pass(&order))
    }

    /// Evaluate only dirty nodes, plus the nodes their recomputation
    /// dirties, in topological order.
    ///
    /// After a node successfully recomputes, every node fed by one of its
    /// outputs is marked dirty; the order guarantees those consumers are
    /// visited later in the same pass. Each affected node therefore
    /// recomputes exactly once per pass, and untouched subgraphs are
    /// skipped entirely.
    pub fn evaluate_dirty(&mut self) -> Result<PassReport, GraphError> {
        let order = self.execution_order()?;
        debug!(graph = self.name(), nodes = order.len(), "dirty evaluation pass");
        Ok(self.run_pass(&order))
    }

    /// Mark one node dirty and run a dirty pass, so an edit to that node
    /// propagates to everything downstream of it.
    pub fn evaluate_from(&mut self, id: NodeId) -> Result<PassReport, GraphError> {
        self.mark_dirty(id)?;
        self.evaluate_dirty()
    }

    // Walks `order` once. Dirty propagation happens here and only here:
    // a successful recompute marks the node's direct consumers dirty.
    fn run_pass(&mut self, order: &[NodeId]) -> PassReport {
        let mut report = PassReport::default();
        for &id in order {
            let Some(node) = self.node_mut(id) else {
                continue;
            };
            match node.evaluate() {
                Ok(Evaluation::Skipped) => report.skipped.push(id),
                Ok(Evaluation::Computed) => {
                    report.computed.push(id);
                    let consumers: Vec<NodeId> = self
                        .links()
                        .filter(|link| link.from_node == id)
                        .map(|link| link.to_node)
                        .collect();
                    for consumer in consumers {
                        if let Some(node) = self.node_mut(consumer) {
                            node.mark_dirty();
                        }
                    }
                }
                Err(err) => {
                    error!(node = %id, %err, "compute failed, node stays dirty");
                    report.failures.push((id, err));
                }
            }
        }
        report
    }
}
