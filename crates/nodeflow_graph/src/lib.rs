// SPDX-License-Identifier: MIT OR Apache-2.0
//! Incremental dataflow graph engine.
//!
//! This crate provides a pull-based node graph model built on:
//! - Type-erased data slots shared between connected ports
//! - Typed input/output ports with connection validation
//! - A dirty-propagation protocol deciding what must recompute
//! - Topological scheduling with cycle detection
//!
//! ## Architecture
//!
//! Callers build a [`Graph`] of nodes described by [`NodeSpec`]s, wire
//! output ports to input ports with [`Graph::connect`], and pull results
//! with [`Graph::evaluate_dirty`] or [`Graph::evaluate_all`]. Only nodes
//! whose inputs changed since their last successful run recompute; the
//! rest are skipped. Evaluation is single-threaded and synchronous, and
//! each pass either completes, fails fast on a detected cycle, or
//! completes with a per-node failure report.

pub mod data;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod graph;
pub mod link;
pub mod node;
pub mod port;
pub mod registry;

pub use data::TypedData;
pub use error::{ComputeError, GraphError};
pub use evaluation::PassReport;
pub use graph::Graph;
pub use link::{Link, LinkId};
pub use node::{ComputeFn, Evaluation, Node, NodeId, NodeSpec};
pub use port::{Inputs, Outputs, Port, PortDirection};
pub use registry::{NodeFactory, NodeRegistry, NodeTemplate};
