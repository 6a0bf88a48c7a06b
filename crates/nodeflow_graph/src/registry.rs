// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of reusable node templates.
//!
//! Hosts register a factory per node kind and instantiate nodes by
//! template id, grouped by free-form category strings.

use crate::node::NodeSpec;
use indexmap::IndexMap;

/// Factory producing a fresh spec for each instantiated node.
pub type NodeFactory = Box<dyn Fn() -> NodeSpec>;

/// A named, categorized node blueprint.
pub struct NodeTemplate {
    /// Unique template id.
    pub id: String,
    /// Display label for instantiated nodes.
    pub label: String,
    /// Free-form grouping used by hosts to organize templates.
    pub category: String,
    factory: NodeFactory,
}

impl NodeTemplate {
    /// Create a template with the given factory.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        category: impl Into<String>,
        factory: impl Fn() -> NodeSpec + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category: category.into(),
            factory: Box::new(factory),
        }
    }

    /// Build a fresh spec from this template.
    pub fn spawn(&self) -> NodeSpec {
        (self.factory)()
    }
}

/// Registry of available node templates.
#[derive(Default)]
pub struct NodeRegistry {
    templates: IndexMap<String, NodeTemplate>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            templates: IndexMap::new(),
        }
    }

    /// Register a template, replacing any previous one with the same id.
    pub fn register(&mut self, template: NodeTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Get a template by id.
    pub fn get(&self, id: &str) -> Option<&NodeTemplate> {
        self.templates.get(id)
    }

    /// Iterate all templates in registration order.
    pub fn templates(&self) -> impl Iterator<Item = &NodeTemplate> {
        self.templates.values()
    }

    /// Iterate templates in the given category.
    pub fn templates_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a NodeTemplate> {
        self.templates
            .values()
            .filter(move |template| template.category == category)
    }

    /// Build a spec from the template `id`, if registered.
    pub fn spawn(&self, id: &str) -> Option<NodeSpec> {
        self.get(id).map(NodeTemplate::spawn)
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when no template is registered.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
