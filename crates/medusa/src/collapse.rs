//! Node collapsing: bounds diagram complexity by merging nodes too small to
//! read at the current scale.
//!
//! Runs as a pre-pass over a cloned registry. Two ordered sweeps: horizontal
//! (consecutive insignificant siblings) then vertical (an insignificant child
//! into its insignificant parent). Running them together produces
//! unpredictable groupings, so they stay separate. Collapsing always precedes
//! a full re-run of stems, scale, positioning and allocation.

use crate::node::{LayoutNode, NodeId, NodeKind, NodeRegistry, root_ids};
use std::collections::VecDeque;

/// Device-independent pixel size below which a node is insignificant.
pub const COLLAPSE_THRESHOLD_PX: f64 = 10.0;

/// Collapsing never reduces the registry below this many nodes.
pub const MINIMUM_NODES: usize = 3;

/// Merges insignificant nodes and returns the reduced registry. Stems and
/// positions are cleared; the caller reruns the pipeline over the result.
/// `size_independent_scale` comes from the scale pass so merge decisions do
/// not vary with the render surface.
pub fn collapse(registry: &NodeRegistry, size_independent_scale: f64) -> NodeRegistry {
    let mut out = registry.clone();
    for node in out.values_mut() {
        node.stem = None;
        node.position = None;
        node.inbound = None;
    }

    let before = out.len();
    collapse_horizontally(&mut out, size_independent_scale);
    collapse_vertically(&mut out, size_independent_scale);
    tracing::debug!(
        removed = before - out.len(),
        remaining = out.len(),
        "node collapsing complete"
    );
    out
}

fn below_threshold(node: &LayoutNode, size_independent_scale: f64) -> bool {
    node.total_time() * size_independent_scale < COLLAPSE_THRESHOLD_PX
}

fn is_collapsible(node: &LayoutNode, size_independent_scale: f64) -> bool {
    !node.kind.is_shortcut()
        && (node.kind.is_collapsed() || below_threshold(node, size_independent_scale))
}

/// Merge consecutive collapsible siblings, top-down.
fn collapse_horizontally(out: &mut NodeRegistry, size_independent_scale: f64) {
    let mut queue: VecDeque<NodeId> = root_ids(out).into();
    while let Some(id) = queue.pop_front() {
        let Some(node) = out.get(&id) else { continue };
        let mut children = node.children.clone();
        let mut previous: Option<NodeId> = None;
        let mut i = 0;
        while i < children.len() {
            let child = children[i].clone();
            if is_collapsible(&out[&child], size_independent_scale) {
                if let Some(prev) = previous.take() {
                    if out.len() <= MINIMUM_NODES {
                        break;
                    }
                    let merged = combine_siblings(out, &prev, &child);
                    children[i - 1] = merged.clone();
                    children.remove(i);
                    previous = Some(merged);
                    continue;
                }
                previous = Some(child);
            } else {
                previous = None;
            }
            i += 1;
        }
        if let Some(node) = out.get(&id) {
            queue.extend(node.children.iter().cloned());
        }
    }
}

/// Merge collapsible children into their collapsible parent, top-down,
/// chaining through runs of insignificant descendants. A child keeping a
/// non-collapsible ("long") grandchild in play is never absorbed; that would
/// hide a structurally important descendant behind a merged bubble.
fn collapse_vertically(out: &mut NodeRegistry, size_independent_scale: f64) {
    let mut queue: VecDeque<NodeId> = root_ids(out).into();
    while let Some(id) = queue.pop_front() {
        let Some(node) = out.get(&id) else { continue };
        let mut current = id.clone();
        if is_collapsible(node, size_independent_scale) {
            loop {
                if out.len() <= MINIMUM_NODES {
                    break;
                }
                let children = out[&current].children.clone();
                let candidate = children.into_iter().find(|c| {
                    let child = &out[c];
                    is_collapsible(child, size_independent_scale)
                        && child
                            .children
                            .iter()
                            .all(|gc| is_collapsible(&out[gc], size_independent_scale))
                });
                match candidate {
                    Some(child) => current = combine_into_parent(out, &current, &child),
                    None => break,
                }
            }
        }
        queue.extend(out[&current].children.iter().cloned());
    }
}

/// Flattened constituent list of a node: itself, or its members when it is
/// already a merged node.
fn members_of(node: &LayoutNode) -> Vec<NodeId> {
    match &node.kind {
        NodeKind::Collapsed { members } => members.clone(),
        _ => vec![node.id.clone()],
    }
}

/// Merged ids derive from the sorted constituent ids, so collapsing the same
/// inputs twice yields the same ids.
fn merged_id(members: &[NodeId]) -> NodeId {
    let mut sorted = members.to_vec();
    sorted.sort();
    format!("x{}", sorted.join("-"))
}

fn combine_siblings(out: &mut NodeRegistry, first: &NodeId, second: &NodeId) -> NodeId {
    let a = out.shift_remove(first).expect("first sibling in registry");
    let b = out.shift_remove(second).expect("second sibling in registry");

    let mut members = members_of(&a);
    members.extend(members_of(&b));
    let id = merged_id(&members);

    let mut merged = LayoutNode::new(
        id.clone(),
        NodeKind::Collapsed { members },
        a.between + b.between,
        a.within + b.within,
    );
    merged.parent = a.parent.clone();
    merged.children = a.children.iter().chain(b.children.iter()).cloned().collect();

    if let Some(parent_id) = &merged.parent {
        let siblings = &mut out[parent_id].children;
        if let Some(idx) = siblings.iter().position(|c| c == first) {
            siblings[idx] = id.clone();
        }
        siblings.retain(|c| c != second);
    }
    for child in merged.children.clone() {
        out[&child].parent = Some(id.clone());
    }
    out.insert(id.clone(), merged);
    id
}

fn combine_into_parent(out: &mut NodeRegistry, parent: &NodeId, child: &NodeId) -> NodeId {
    let a = out.shift_remove(parent).expect("parent in registry");
    let b = out.shift_remove(child).expect("child in registry");

    let mut members = members_of(&a);
    members.extend(members_of(&b));
    let id = merged_id(&members);

    let mut merged = LayoutNode::new(
        id.clone(),
        NodeKind::Collapsed { members },
        a.between + b.between,
        a.within + b.within,
    );
    merged.parent = a.parent.clone();
    // The child's children splice in at the child's slot, preserving sibling
    // order.
    merged.children = a
        .children
        .iter()
        .flat_map(|c| {
            if c == child {
                b.children.clone()
            } else {
                vec![c.clone()]
            }
        })
        .collect();

    if let Some(grandparent) = &merged.parent {
        let siblings = &mut out[grandparent].children;
        if let Some(idx) = siblings.iter().position(|c| c == parent) {
            siblings[idx] = id.clone();
        }
    }
    for c in merged.children.clone() {
        out[&c].parent = Some(id.clone());
    }
    out.insert(id.clone(), merged);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_id_is_order_independent() {
        let a = merged_id(&["b".to_string(), "a".to_string(), "c".to_string()]);
        let b = merged_id(&["c".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a, "xa-b-c");
    }
}
