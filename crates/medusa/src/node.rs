//! Layout node model and registry.
//!
//! Nodes reference each other by id through a registry owned by the layout,
//! never by direct links. Collapsing replaces whole subtrees, and id
//! indirection keeps that a map edit instead of a pointer-graph surgery.

use crate::error::{Error, Result, ensure_non_negative};
use crate::stem::Stem;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// Input contract for one node of the profile tree.
pub trait DataNode {
    fn id(&self) -> &str;
    /// `None` marks a root.
    fn parent_id(&self) -> Option<&str>;
    /// Ordered children ids.
    fn child_ids(&self) -> &[NodeId];
    /// Cumulative asynchronous-pending duration on the inbound edge. Must be
    /// finite and non-negative.
    fn between_time(&self) -> f64;
    /// Cumulative synchronous-execution duration of the node itself. Must be
    /// finite and non-negative.
    fn within_time(&self) -> f64;
}

/// Concrete serde-friendly [`DataNode`] implementation, used by the CLI and
/// anywhere a profile tree arrives as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileNode {
    pub id: NodeId,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    pub between_time: f64,
    pub within_time: f64,
}

impl DataNode for ProfileNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn child_ids(&self) -> &[NodeId] {
        &self.children
    }

    fn between_time(&self) -> f64 {
        self.between_time
    }

    fn within_time(&self) -> f64 {
        self.within_time
    }
}

/// Closed set of node roles. Placement and drawing logic switch exhaustively
/// on this instead of inspecting ids or runtime shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeKind {
    /// A real input node.
    Aggregate,
    /// Two or more merged nodes. `members` lists the original constituent
    /// ids; durations are their sums.
    Collapsed { members: Vec<NodeId> },
    /// Sub-layout back-reference to a node outside the laid-out subset.
    Shortcut { target: NodeId },
}

impl NodeKind {
    pub fn is_collapsed(&self) -> bool {
        matches!(self, NodeKind::Collapsed { .. })
    }

    pub fn is_shortcut(&self) -> bool {
        matches!(self, NodeKind::Shortcut { .. })
    }
}

/// Final placement of one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Proportional share of the 1D perimeter space, relative to the whole
    /// tree (root = 1).
    pub units: f64,
    /// 1D offset of the node's block center along the boundary segments.
    /// Zero for nodes that never occupy the perimeter.
    pub offset: f64,
}

/// One drawable edge, with the radii and visible line length the renderer
/// needs precomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub origin: NodeId,
    pub target: NodeId,
    pub origin_radius: f64,
    pub target_radius: f64,
    pub visible_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub between: f64,
    pub within: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stem: Option<Stem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbound: Option<Connection>,
}

impl LayoutNode {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, between: f64, within: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            parent: None,
            children: Vec::new(),
            between,
            within,
            stem: None,
            position: None,
            inbound: None,
        }
    }

    pub fn total_time(&self) -> f64 {
        self.between + self.within
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Id-keyed node registry. Insertion-ordered so iteration is deterministic.
pub type NodeRegistry = IndexMap<NodeId, LayoutNode>;

/// Builds the registry from the input contract.
///
/// `external_origin` supports sub-layouts: a parent id equal to it is
/// accepted even though the parent is not part of the subset, and the node is
/// kept as a root for the caller to attach to a shortcut node.
pub fn build_registry(
    nodes: &[impl DataNode],
    external_origin: Option<&str>,
) -> Result<NodeRegistry> {
    let mut registry = NodeRegistry::with_capacity(nodes.len());

    for data in nodes {
        let id = data.id().to_string();
        ensure_non_negative(&id, "between time", data.between_time())?;
        ensure_non_negative(&id, "within time", data.within_time())?;

        let mut node = LayoutNode::new(
            id.clone(),
            NodeKind::Aggregate,
            data.between_time(),
            data.within_time(),
        );
        node.parent = data.parent_id().map(str::to_string);
        node.children = data.child_ids().to_vec();

        if registry.insert(id.clone(), node).is_some() {
            return Err(Error::DuplicateId { id });
        }
    }

    // Parent links must resolve inside the subset (or to the declared
    // external origin, which becomes a root here).
    let mut detach = Vec::new();
    for (id, node) in registry.iter() {
        if let Some(parent) = &node.parent {
            if Some(parent.as_str()) == external_origin {
                detach.push(id.clone());
            } else if !registry.contains_key(parent) {
                return Err(Error::UnknownParent {
                    node: id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        for child in &node.children {
            if !registry.contains_key(child) {
                return Err(Error::MissingNode { id: child.clone() });
            }
        }
    }
    for id in detach {
        registry[&id].parent = None;
    }

    // Every node must be reachable from a root through the children lists.
    // This also rejects cyclic parent chains.
    let mut visited = rustc_hash::FxHashSet::default();
    let mut queue: Vec<NodeId> = registry
        .values()
        .filter(|n| n.is_root())
        .map(|n| n.id.clone())
        .collect();
    while let Some(id) = queue.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        for child in &registry[&id].children {
            queue.push(child.clone());
        }
    }
    for id in registry.keys() {
        if !visited.contains(id) {
            return Err(Error::Unreachable { id: id.clone() });
        }
    }

    Ok(registry)
}

/// Ids of all root nodes, in registry order.
pub(crate) fn root_ids(registry: &NodeRegistry) -> Vec<NodeId> {
    registry
        .values()
        .filter(|n| n.is_root())
        .map(|n| n.id.clone())
        .collect()
}

/// Ids of all nodes in breadth-first order from the roots. Parents always
/// precede their children.
pub(crate) fn breadth_first_ids(registry: &NodeRegistry) -> Vec<NodeId> {
    let mut out = Vec::with_capacity(registry.len());
    let mut queue: std::collections::VecDeque<NodeId> = root_ids(registry).into();
    while let Some(id) = queue.pop_front() {
        if let Some(node) = registry.get(&id) {
            queue.extend(node.children.iter().cloned());
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, parent: Option<&str>, children: &[&str]) -> ProfileNode {
        ProfileNode {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            children: children.iter().map(|c| c.to_string()).collect(),
            between_time: 1.0,
            within_time: 1.0,
        }
    }

    #[test]
    fn registry_preserves_input_order_and_links() {
        let nodes = vec![
            profile("a", None, &["b", "c"]),
            profile("b", Some("a"), &[]),
            profile("c", Some("a"), &[]),
        ];
        let registry = build_registry(&nodes, None).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry["a"].children, vec!["b", "c"]);
        assert!(registry["b"].is_leaf());
        assert_eq!(breadth_first_ids(&registry), vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let nodes = vec![profile("a", Some("ghost"), &[])];
        assert!(matches!(
            build_registry(&nodes, None),
            Err(Error::UnknownParent { .. })
        ));
    }

    #[test]
    fn external_origin_parent_becomes_root() {
        let nodes = vec![profile("a", Some("outside"), &["b"]), profile("b", Some("a"), &[])];
        let registry = build_registry(&nodes, Some("outside")).unwrap();
        assert!(registry["a"].is_root());
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut bad = profile("a", None, &[]);
        bad.between_time = -1.0;
        assert!(matches!(
            build_registry(&[bad], None),
            Err(Error::InvalidNumber { .. })
        ));
    }

    #[test]
    fn cyclic_children_are_unreachable() {
        // b and c reference each other below a root-less pair.
        let nodes = vec![profile("b", Some("c"), &["c"]), profile("c", Some("b"), &["b"])];
        assert!(matches!(
            build_registry(&nodes, None),
            Err(Error::Unreachable { .. })
        ));
    }
}
