// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph structure: node and link bookkeeping, connections, id allocation.
//!
//! The graph is the only actor allowed to create or destroy nodes and
//! links. Removal paths sever incident links before a node is dropped, so
//! no input port is ever left referencing freed data.

use crate::error::GraphError;
use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId, NodeSpec};
use crate::port::PortDirection;
use indexmap::IndexMap;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use tracing::{debug, warn};

/// A dataflow graph of nodes connected by typed links.
#[derive(Debug)]
pub struct Graph {
    name: String,
    nodes: IndexMap<NodeId, Node>,
    links: IndexMap<LinkId, Link>,
    next_id: u64,
    released: BTreeSet<NodeId>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
            next_id: 0,
            released: BTreeSet::new(),
        }
    }

    /// Graph name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a node built from `spec`, assigning the next available id.
    ///
    /// The smallest released id is reused before the counter advances.
    /// The node starts dirty.
    pub fn add_node(&mut self, spec: NodeSpec) -> NodeId {
        let id = self.allocate_id();
        let node = Node::from_spec(id, spec);
        debug!(node = %id, label = node.label(), "adding node");
        self.nodes.insert(id, node);
        id
    }

    fn allocate_id(&mut self) -> NodeId {
        if let Some(id) = self.released.pop_first() {
            return id;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Whether `id` is free for use, i.e. not held by a live node.
    pub fn is_node_id_available(&self, id: NodeId) -> bool {
        !self.nodes.contains_key(&id)
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by id.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Iterate all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate all node ids.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate all links.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get a link by id.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Flag a node's cached outputs as stale.
    pub fn mark_dirty(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound(id))?
            .mark_dirty();
        Ok(())
    }

    /// Remove a node and every link incident to it.
    ///
    /// Inputs that were reading from the removed node's outputs revert to
    /// their fallback values and their owning nodes are marked dirty,
    /// since their effective input changed. The released id becomes
    /// available for reuse.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let incident: Vec<LinkId> = self
            .links
            .values()
            .filter(|link| link.involves_node(id))
            .map(|link| link.id)
            .collect();
        for link_id in incident {
            let Some(link) = self.links.swap_remove(&link_id) else {
                continue;
            };
            if link.from_node == id {
                self.sever_destination(&link);
            }
        }
        debug!(node = %id, "removing node");
        self.nodes.swap_remove(&id);
        self.released.insert(id);
        Ok(())
    }

    // Clears the destination input and re-dirties its node, after `link`
    // has already been removed from the link set.
    fn sever_destination(&mut self, link: &Link) {
        if let Some(node) = self.nodes.get_mut(&link.to_node) {
            if let Some(port) = node.input_mut(&link.to_port) {
                port.unbind();
            }
            node.mark_dirty();
        }
    }

    /// Drop every node and link and reset the id allocator.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.next_id = 0;
        self.released.clear();
    }

    /// Connect an output port to an input port.
    ///
    /// All validation happens before any mutation; a failed call leaves
    /// the graph unchanged. An input port already fed by another output
    /// has that link removed first (replace semantics, not fan-in). The
    /// destination node is marked dirty since its effective input changed.
    pub fn connect(
        &mut self,
        src: NodeId,
        src_port: &str,
        dst: NodeId,
        dst_port: &str,
    ) -> Result<LinkId, GraphError> {
        let src_node = self.nodes.get(&src).ok_or(GraphError::NodeNotFound(src))?;
        let dst_node = self.nodes.get(&dst).ok_or(GraphError::NodeNotFound(dst))?;

        let out_port = match src_node.output(src_port) {
            Some(port) => port,
            None if src_node.input(src_port).is_some() => {
                warn!(node = %src, port = src_port, "rejecting connection from an input port");
                return Err(GraphError::DirectionMismatch {
                    port: src_port.to_string(),
                    expected: PortDirection::Output,
                    actual: PortDirection::Input,
                });
            }
            None => {
                return Err(GraphError::PortNotFound {
                    node: src,
                    port: src_port.to_string(),
                })
            }
        };
        let in_port = match dst_node.input(dst_port) {
            Some(port) => port,
            None if dst_node.output(dst_port).is_some() => {
                warn!(node = %dst, port = dst_port, "rejecting connection into an output port");
                return Err(GraphError::DirectionMismatch {
                    port: dst_port.to_string(),
                    expected: PortDirection::Input,
                    actual: PortDirection::Output,
                });
            }
            None => {
                return Err(GraphError::PortNotFound {
                    node: dst,
                    port: dst_port.to_string(),
                })
            }
        };

        if !out_port.is_same_type(in_port) {
            warn!(
                from = %src,
                to = %dst,
                expected = in_port.data_type_name(),
                found = out_port.data_type_name(),
                "rejecting connection between incompatible port types"
            );
            return Err(GraphError::TypeMismatch {
                expected: in_port.data_type_name(),
                found: out_port.data_type_name(),
            });
        }

        let Some(data) = out_port.shared_data() else {
            return Err(GraphError::DirectionMismatch {
                port: src_port.to_string(),
                expected: PortDirection::Output,
                actual: PortDirection::Input,
            });
        };

        // Replace semantics: at most one link may feed an input port.
        let replaced: Vec<LinkId> = self
            .links
            .values()
            .filter(|link| link.is_into_port(dst, dst_port))
            .map(|link| link.id)
            .collect();
        for link_id in replaced {
            debug!(link = %link_id, "replacing existing link into input port");
            self.links.swap_remove(&link_id);
        }

        let link = Link::new(src, src_port, dst, dst_port);
        let link_id = link.id;
        debug!(
            link = %link_id,
            from = %src, from_port = src_port,
            to = %dst, to_port = dst_port,
            "connecting"
        );
        self.links.insert(link_id, link);

        if let Some(node) = self.nodes.get_mut(&dst) {
            if let Some(port) = node.input_mut(dst_port) {
                port.bind(Rc::downgrade(&data));
            }
            node.mark_dirty();
        }
        Ok(link_id)
    }

    /// Remove a link by id, reverting the destination input to its
    /// fallback value and marking the destination node dirty.
    pub fn disconnect(&mut self, link_id: LinkId) -> Result<Link, GraphError> {
        let link = self
            .links
            .swap_remove(&link_id)
            .ok_or(GraphError::LinkNotFound(link_id))?;
        debug!(link = %link_id, from = %link.from_node, to = %link.to_node, "disconnecting");
        self.sever_destination(&link);
        Ok(link)
    }

    /// Remove every link touching the named port on node `id`.
    ///
    /// For an input port this is at most one link; for an output port all
    /// fan-out links are removed. Returns the number of links removed.
    pub fn disconnect_port(&mut self, id: NodeId, port: &str) -> Result<usize, GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        let matching: Vec<LinkId> = if node.input(port).is_some() {
            self.links
                .values()
                .filter(|link| link.is_into_port(id, port))
                .map(|link| link.id)
                .collect()
        } else if node.output(port).is_some() {
            self.links
                .values()
                .filter(|link| link.is_from_port(id, port))
                .map(|link| link.id)
                .collect()
        } else {
            return Err(GraphError::PortNotFound {
                node: id,
                port: port.to_string(),
            });
        };
        let count = matching.len();
        for link_id in matching {
            let Some(link) = self.links.swap_remove(&link_id) else {
                continue;
            };
            debug!(link = %link_id, "disconnecting port");
            self.sever_destination(&link);
        }
        Ok(count)
    }

    /// Read the effective value seen by an input port: the connected
    /// output's value when connected, the fallback otherwise.
    pub fn input_value<T: Any + Clone>(&self, id: NodeId, port: &str) -> Result<T, GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        let port_ref = node.input(port).ok_or_else(|| GraphError::PortNotFound {
            node: id,
            port: port.to_string(),
        })?;
        port_ref.read_value::<T>()
    }

    /// Read the value last written to an output port.
    pub fn output_value<T: Any + Clone>(&self, id: NodeId, port: &str) -> Result<T, GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        let port_ref = node.output(port).ok_or_else(|| GraphError::PortNotFound {
            node: id,
            port: port.to_string(),
        })?;
        port_ref.read_value::<T>()
    }

    /// Replace the fallback value of an input port and mark the node
    /// dirty, since its effective input may have changed.
    pub fn set_input_default<T: Any>(
        &mut self,
        id: NodeId,
        port: &str,
        value: T,
    ) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        if node.input(port).is_none() {
            if node.output(port).is_some() {
                return Err(GraphError::DirectionMismatch {
                    port: port.to_string(),
                    expected: PortDirection::Input,
                    actual: PortDirection::Output,
                });
            }
            return Err(GraphError::PortNotFound {
                node: id,
                port: port.to_string(),
            });
        }
        if let Some(port_ref) = node.input_mut(port) {
            port_ref.set_fallback(value)?;
        }
        node.mark_dirty();
        Ok(())
    }

    /// Which nodes consume each node's outputs. Every node appears in the
    /// map, including those with no consumers.
    pub fn connectivity_downstream(&self) -> BTreeMap<NodeId, Vec<NodeId>> {
        let mut map: BTreeMap<NodeId, Vec<NodeId>> =
            self.nodes.keys().map(|id| (*id, Vec::new())).collect();
        for link in self.links.values() {
            if let Some(targets) = map.get_mut(&link.from_node) {
                targets.push(link.to_node);
            }
        }
        for targets in map.values_mut() {
            targets.sort_unstable();
            targets.dedup();
        }
        map
    }

    /// Which nodes feed each node's inputs. Every node appears in the
    /// map, including those with no producers.
    pub fn connectivity_upstream(&self) -> BTreeMap<NodeId, Vec<NodeId>> {
        let mut map: BTreeMap<NodeId, Vec<NodeId>> =
            self.nodes.keys().map(|id| (*id, Vec::new())).collect();
        for link in self.links.values() {
            if let Some(sources) = map.get_mut(&link.to_node) {
                sources.push(link.from_node);
            }
        }
        for sources in map.values_mut() {
            sources.sort_unstable();
            sources.dedup();
        }
        map
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("untitled")
    }
}
