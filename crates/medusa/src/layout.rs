//! Layout orchestration.
//!
//! `Layout::generate` owns the whole pipeline: registry construction, stems,
//! the scale search, the optional collapsing pre-pass (followed by a full
//! re-run of stems and scale, since topology changed), leaf ordering and node
//! allocation. Every pass runs over local state and the `Layout` value only
//! exists once all of them have succeeded, so a failed pass never leaves a
//! partially-updated layout behind.

use crate::allocation::{self, Allocation};
use crate::collapse;
use crate::error::{Error, Result};
use crate::node::{
    self, Connection, DataNode, LayoutNode, NodeId, NodeKind, NodeRegistry, breadth_first_ids,
    root_ids,
};
use crate::positioning::Positioning;
use crate::scale::Scale;
use crate::settings::LayoutSettings;
use crate::stem;
use serde::Serialize;

/// Connection descriptor for a sub-layout: the node outside the subset that
/// the subset hangs off, rendered as a shortcut edge of fixed length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortcutOrigin {
    pub origin: NodeId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub settings: LayoutSettings,
    /// Final id-keyed node map: positions, scaled stems, parent/children ids.
    pub registry: NodeRegistry,
    /// Flat left-to-right leaf order.
    pub leaf_order: Vec<NodeId>,
    pub connections: Vec<Connection>,
    pub scale: Scale,
    pub allocation: Allocation,
}

impl Layout {
    /// Lays out a full profile tree.
    pub fn generate(nodes: &[impl DataNode], settings: LayoutSettings) -> Result<Layout> {
        let registry = node::build_registry(nodes, None)?;
        Self::run_pipeline(registry, settings)
    }

    /// Lays out a subset of a larger tree. The subset's top node may name
    /// `shortcut.origin` as its parent; a shortcut node standing in for that
    /// external origin is placed above the subset and connected by an edge of
    /// fixed `shortcut_length`.
    pub fn generate_sub(
        nodes: &[impl DataNode],
        shortcut: ShortcutOrigin,
        settings: LayoutSettings,
    ) -> Result<Layout> {
        let mut registry = node::build_registry(nodes, Some(&shortcut.origin))?;
        if registry.contains_key(&shortcut.origin) {
            return Err(Error::DuplicateId {
                id: shortcut.origin,
            });
        }

        let roots = root_ids(&registry);
        let mut shortcut_node = LayoutNode::new(
            shortcut.origin.clone(),
            NodeKind::Shortcut {
                target: shortcut.origin.clone(),
            },
            0.0,
            0.0,
        );
        shortcut_node.children = roots.clone();
        registry.insert(shortcut.origin.clone(), shortcut_node);
        for root in roots {
            registry[&root].parent = Some(shortcut.origin.clone());
        }

        Self::run_pipeline(registry, settings)
    }

    fn run_pipeline(mut registry: NodeRegistry, settings: LayoutSettings) -> Result<Layout> {
        settings.validate()?;

        stem::build_stems(&mut registry, &settings)?;
        let mut scale = Scale::compute(&registry, &settings)?;

        if settings.collapse_nodes {
            registry = collapse::collapse(&registry, scale.size_independent_scale());
            stem::build_stems(&mut registry, &settings)?;
            scale = Scale::compute(&registry, &settings)?;
        }

        stem::apply_scale(&mut registry, &scale, &settings)?;
        let positioning = Positioning::compute(&registry);
        let allocation =
            allocation::allocate(&mut registry, &positioning.order, &scale, &settings)?;
        let connections = build_connections(&mut registry);

        tracing::debug!(
            nodes = registry.len(),
            leaves = positioning.order.len(),
            "layout generated"
        );
        Ok(Layout {
            settings,
            registry,
            leaf_order: positioning.order,
            connections,
            scale,
            allocation,
        })
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.registry.get(id)
    }
}

/// Fills every node's inbound connection from the scaled stems and returns
/// the flat list, parents before children.
fn build_connections(registry: &mut NodeRegistry) -> Vec<Connection> {
    let mut connections = Vec::with_capacity(registry.len().saturating_sub(1));
    for id in breadth_first_ids(registry) {
        let Some(parent_id) = registry[&id].parent.clone() else {
            continue;
        };
        let connection = Connection {
            origin: parent_id.clone(),
            target: id.clone(),
            origin_radius: stem::scaled_radius(registry, &parent_id),
            target_radius: stem::scaled_radius(registry, &id),
            visible_length: stem::scaled_line_length(registry, &id),
        };
        registry[&id].inbound = Some(connection.clone());
        connections.push(connection);
    }
    connections
}
