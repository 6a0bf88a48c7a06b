// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) records connecting an output port to an input port.

use crate::node::NodeId;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed edge from an output port to an input port.
///
/// Immutable once created. Equality is the endpoint 4-tuple, so two links
/// with distinct ids but identical endpoints compare equal.
#[derive(Debug, Clone)]
pub struct Link {
    /// Unique link ID.
    pub id: LinkId,
    /// Source node.
    pub from_node: NodeId,
    /// Label of the source output port.
    pub from_port: String,
    /// Destination node.
    pub to_node: NodeId,
    /// Label of the destination input port.
    pub to_port: String,
}

impl Link {
    /// Create a new link record.
    pub fn new(
        from_node: NodeId,
        from_port: impl Into<String>,
        to_node: NodeId,
        to_port: impl Into<String>,
    ) -> Self {
        Self {
            id: LinkId::new(),
            from_node,
            from_port: from_port.into(),
            to_node,
            to_port: to_port.into(),
        }
    }

    /// Check if this link touches a specific node.
    pub fn involves_node(&self, node: NodeId) -> bool {
        self.from_node == node || self.to_node == node
    }

    /// Check if this link feeds the given input port.
    pub fn is_into_port(&self, node: NodeId, port: &str) -> bool {
        self.to_node == node && self.to_port == port
    }

    /// Check if this link starts at the given output port.
    pub fn is_from_port(&self, node: NodeId, port: &str) -> bool {
        self.from_node == node && self.from_port == port
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.from_node == other.from_node
            && self.from_port == other.from_port
            && self.to_node == other.to_node
            && self.to_port == other.to_port
    }
}

impl Eq for Link {}
