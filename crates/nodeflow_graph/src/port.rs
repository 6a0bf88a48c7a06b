// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions and the data-sharing contract between them.
//!
//! An output port owns its [`TypedData`] slot; input ports connected to it
//! hold a non-owning reference to that same slot. Only the owning node's
//! compute callback ever writes the slot, consumers only read, which keeps
//! a single-threaded evaluation pass race-free without locking.

use crate::data::TypedData;
use crate::error::GraphError;
use crate::node::NodeId;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    /// The port consumes data from a connected output.
    Input,
    /// The port produces data and owns the backing slot.
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Storage side of a port.
enum Slot {
    /// Owned data slot, written by the node's compute callback.
    Output(Rc<RefCell<TypedData>>),
    /// Reference to the connected output's slot, plus a fallback value
    /// used while disconnected.
    Input {
        source: Option<Weak<RefCell<TypedData>>>,
        fallback: TypedData,
    },
}

/// A named, directional endpoint on a node.
pub struct Port {
    label: String,
    owner: Option<NodeId>,
    slot: Slot,
}

impl Port {
    /// Create an input port with the fallback value read while the port is
    /// disconnected.
    pub fn input<T: Any>(label: impl Into<String>, default: T) -> Self {
        Self {
            label: label.into(),
            owner: None,
            slot: Slot::Input {
                source: None,
                fallback: TypedData::of(default),
            },
        }
    }

    /// Create an output port owning an empty data slot tagged with `T`.
    pub fn output<T: Any>(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            owner: None,
            slot: Slot::Output(Rc::new(RefCell::new(TypedData::empty::<T>()))),
        }
    }

    /// Port label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Node this port belongs to, assigned when the node joins a graph.
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, id: NodeId) {
        self.owner = Some(id);
    }

    /// Port direction.
    pub fn direction(&self) -> PortDirection {
        match self.slot {
            Slot::Output(_) => PortDirection::Output,
            Slot::Input { .. } => PortDirection::Input,
        }
    }

    /// Name of the concrete type this port carries.
    pub fn data_type_name(&self) -> &'static str {
        match &self.slot {
            Slot::Output(data) => data.borrow().type_name(),
            Slot::Input { fallback, .. } => fallback.type_name(),
        }
    }

    /// True iff both ports carry the same concrete type.
    pub fn is_same_type(&self, other: &Port) -> bool {
        self.type_id() == other.type_id()
    }

    fn type_id(&self) -> TypeId {
        match &self.slot {
            Slot::Output(data) => data.borrow().type_id(),
            Slot::Input { fallback, .. } => fallback.type_id(),
        }
    }

    /// Whether an input port currently references a live output slot.
    /// Output ports do not track their consumers and always report false.
    pub fn is_connected(&self) -> bool {
        match &self.slot {
            Slot::Input { source, .. } => source
                .as_ref()
                .is_some_and(|source| source.upgrade().is_some()),
            Slot::Output(_) => false,
        }
    }

    pub(crate) fn shared_data(&self) -> Option<Rc<RefCell<TypedData>>> {
        match &self.slot {
            Slot::Output(data) => Some(Rc::clone(data)),
            Slot::Input { .. } => None,
        }
    }

    pub(crate) fn bind(&mut self, new_source: Weak<RefCell<TypedData>>) {
        if let Slot::Input { source, .. } = &mut self.slot {
            *source = Some(new_source);
        }
    }

    pub(crate) fn unbind(&mut self) {
        if let Slot::Input { source, .. } = &mut self.slot {
            *source = None;
        }
    }

    pub(crate) fn read_value<T: Any + Clone>(&self) -> Result<T, GraphError> {
        match &self.slot {
            Slot::Input { source, fallback } => {
                if let Some(data) = source.as_ref().and_then(Weak::upgrade) {
                    return data.borrow().get::<T>().cloned();
                }
                fallback.get::<T>().cloned()
            }
            Slot::Output(data) => data.borrow().get::<T>().cloned(),
        }
    }

    pub(crate) fn write_value<T: Any>(&mut self, value: T) -> Result<(), GraphError> {
        match &mut self.slot {
            Slot::Output(data) => data.borrow_mut().set(value),
            Slot::Input { .. } => Err(GraphError::DirectionMismatch {
                port: self.label.clone(),
                expected: PortDirection::Output,
                actual: PortDirection::Input,
            }),
        }
    }

    pub(crate) fn set_fallback<T: Any>(&mut self, value: T) -> Result<(), GraphError> {
        match &mut self.slot {
            Slot::Input { fallback, .. } => fallback.set(value),
            Slot::Output(_) => Err(GraphError::DirectionMismatch {
                port: self.label.clone(),
                expected: PortDirection::Input,
                actual: PortDirection::Output,
            }),
        }
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("label", &self.label)
            .field("direction", &self.direction())
            .field("type", &self.data_type_name())
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Read access to a node's input ports, handed to compute callbacks.
///
/// Restricting the callback to this view is what enforces the rule that a
/// node reads only its own inputs.
pub struct Inputs<'a> {
    node: NodeId,
    ports: &'a [Port],
}

impl<'a> Inputs<'a> {
    pub(crate) fn new(node: NodeId, ports: &'a [Port]) -> Self {
        Self { node, ports }
    }

    fn port(&self, label: &str) -> Result<&Port, GraphError> {
        self.ports
            .iter()
            .find(|port| port.label() == label)
            .ok_or_else(|| GraphError::PortNotFound {
                node: self.node,
                port: label.to_string(),
            })
    }

    /// Read the effective value of an input port: the connected output's
    /// value when connected, the declared fallback otherwise.
    pub fn read<T: Any + Clone>(&self, label: &str) -> Result<T, GraphError> {
        self.port(label)?.read_value::<T>()
    }

    /// Whether the named input is currently fed by an output port.
    pub fn is_connected(&self, label: &str) -> Result<bool, GraphError> {
        Ok(self.port(label)?.is_connected())
    }

    /// Number of input ports.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// True when the node has no input ports.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

/// Write access to a node's output ports, handed to compute callbacks.
pub struct Outputs<'a> {
    node: NodeId,
    ports: &'a mut [Port],
}

impl<'a> Outputs<'a> {
    pub(crate) fn new(node: NodeId, ports: &'a mut [Port]) -> Self {
        Self { node, ports }
    }

    /// Write a value into the named output port's owned slot.
    pub fn write<T: Any>(&mut self, label: &str, value: T) -> Result<(), GraphError> {
        let node = self.node;
        let port = self
            .ports
            .iter_mut()
            .find(|port| port.label() == label)
            .ok_or_else(|| GraphError::PortNotFound {
                node,
                port: label.to_string(),
            })?;
        port.write_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_input_reads_fallback() {
        let port = Port::input::<f32>("x", 1.5);
        assert!(!port.is_connected());
        assert_eq!(port.read_value::<f32>().unwrap(), 1.5);
    }

    #[test]
    fn test_bound_input_reads_shared_slot() {
        let mut out = Port::output::<f32>("o");
        let mut input = Port::input::<f32>("i", 0.0);
        let data = out.shared_data().unwrap();
        input.bind(Rc::downgrade(&data));

        out.write_value(3.25f32).unwrap();
        assert!(input.is_connected());
        assert_eq!(input.read_value::<f32>().unwrap(), 3.25);

        input.unbind();
        assert_eq!(input.read_value::<f32>().unwrap(), 0.0);
    }

    #[test]
    fn test_dangling_source_falls_back() {
        let mut input = Port::input::<f32>("i", 2.0);
        {
            let out = Port::output::<f32>("o");
            let data = out.shared_data().unwrap();
            input.bind(Rc::downgrade(&data));
        }
        assert!(!input.is_connected());
        assert_eq!(input.read_value::<f32>().unwrap(), 2.0);
    }

    #[test]
    fn test_write_to_input_rejected() {
        let mut port = Port::input::<f32>("x", 0.0);
        assert!(matches!(
            port.write_value(1.0f32),
            Err(GraphError::DirectionMismatch { .. })
        ));
    }

    #[test]
    fn test_views_address_ports_by_label() {
        let inputs = vec![Port::input::<i32>("a", 1), Port::input::<i32>("b", 2)];
        let mut outputs = vec![Port::output::<i32>("sum")];

        let view = Inputs::new(NodeId(0), &inputs);
        assert_eq!(view.read::<i32>("b").unwrap(), 2);
        assert!(matches!(
            view.read::<i32>("missing"),
            Err(GraphError::PortNotFound { .. })
        ));

        let mut out_view = Outputs::new(NodeId(0), &mut outputs);
        out_view.write("sum", 3i32).unwrap();
        assert_eq!(outputs[0].read_value::<i32>().unwrap(), 3);
    }
}
