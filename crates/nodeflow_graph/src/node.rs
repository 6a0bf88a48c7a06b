// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions and the compute callback contract.

use crate::error::ComputeError;
use crate::port::{Inputs, Outputs, Port, PortDirection};
use std::any::Any;
use std::fmt;

/// Unique identifier for a node within a graph.
///
/// Ids are allocated by the graph from a monotonic counter and may be
/// reused after the node holding them is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute callback: reads the node's inputs, writes its outputs.
///
/// Must be deterministic for fixed inputs; the dirty flag assumes a clean
/// node's outputs are still valid.
pub type ComputeFn = Box<dyn FnMut(&Inputs, &mut Outputs) -> Result<(), ComputeError>>;

/// Outcome of a single node evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// The node was clean; nothing ran.
    Skipped,
    /// The callback ran and the dirty flag was cleared.
    Computed,
}

/// Blueprint for a node: label, ports, and compute callback.
///
/// The default callback is a no-op that leaves outputs untouched, which
/// suits nodes whose outputs are written elsewhere or never read.
pub struct NodeSpec {
    label: String,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
    compute: ComputeFn,
}

impl NodeSpec {
    /// Start a spec with the given display label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            compute: Box::new(|_, _| Ok(())),
        }
    }

    /// Append an input port with a fallback value.
    pub fn with_input<T: Any>(mut self, label: impl Into<String>, default: T) -> Self {
        self.inputs.push(Port::input::<T>(label, default));
        self
    }

    /// Append an output port.
    pub fn with_output<T: Any>(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(Port::output::<T>(label));
        self
    }

    /// Set the compute callback.
    pub fn with_compute(
        mut self,
        compute: impl FnMut(&Inputs, &mut Outputs) -> Result<(), ComputeError> + 'static,
    ) -> Self {
        self.compute = Box::new(compute);
        self
    }
}

/// A node instance owned by a graph.
///
/// Nodes start dirty so the first evaluation pass computes them.
pub struct Node {
    id: NodeId,
    label: String,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
    dirty: bool,
    compute: ComputeFn,
}

impl Node {
    pub(crate) fn from_spec(id: NodeId, spec: NodeSpec) -> Self {
        let NodeSpec {
            label,
            mut inputs,
            mut outputs,
            compute,
        } = spec;
        for port in inputs.iter_mut().chain(outputs.iter_mut()) {
            port.set_owner(id);
        }
        Self {
            id,
            label,
            inputs,
            outputs,
            dirty: true,
            compute,
        }
    }

    /// Node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether cached outputs are stale and must be recomputed before
    /// being trusted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the cached outputs as stale. Idempotent.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Input ports in declaration order.
    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    /// Output ports in declaration order.
    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    /// Find an input port by label.
    pub fn input(&self, label: &str) -> Option<&Port> {
        self.inputs.iter().find(|port| port.label() == label)
    }

    /// Find an output port by label.
    pub fn output(&self, label: &str) -> Option<&Port> {
        self.outputs.iter().find(|port| port.label() == label)
    }

    pub(crate) fn input_mut(&mut self, label: &str) -> Option<&mut Port> {
        self.inputs.iter_mut().find(|port| port.label() == label)
    }

    /// Number of ports in the given direction.
    pub fn port_count(&self, direction: PortDirection) -> usize {
        match direction {
            PortDirection::Input => self.inputs.len(),
            PortDirection::Output => self.outputs.len(),
        }
    }

    /// Run the compute callback if the node is dirty.
    ///
    /// A clean node is skipped without running anything; this is the sole
    /// memoization signal of the engine. A failing callback leaves the
    /// node dirty so it is retried on the next pass, never silently marked
    /// clean.
    pub fn evaluate(&mut self) -> Result<Evaluation, ComputeError> {
        if !self.dirty {
            return Ok(Evaluation::Skipped);
        }
        let inputs = Inputs::new(self.id, &self.inputs);
        let mut outputs = Outputs::new(self.id, &mut self.outputs);
        (self.compute)(&inputs, &mut outputs)?;
        self.dirty = false;
        Ok(Evaluation::Computed)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("dirty", &self.dirty)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}
