//! Deterministic left-to-right leaf ordering (the clump pyramid).
//!
//! Leaves are placed strictly longest-stem-first. The longest leaf anchors
//! the center; every later leaf goes to whichever side holds fewer leaves so
//! far. Subtrees are kept together by "clumps", created on demand along each
//! leaf's ancestor chain. A clump keeps the slant it was created with, so a
//! subtree that started on the left keeps growing leftward instead of
//! re-evaluating global balance on every insertion.

use crate::node::{NodeId, NodeRegistry};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Center,
    Right,
}

#[derive(Debug)]
enum Entry {
    Leaf(NodeId),
    Clump(usize),
}

#[derive(Debug)]
struct Clump {
    orientation: Side,
    entries: Vec<Entry>,
}

#[derive(Debug, Default)]
struct ClumpPyramid {
    /// Arena of clumps; index 0 is the pyramid root.
    clumps: Vec<Clump>,
    clump_by_node: FxHashMap<NodeId, usize>,
    leaves_on_left: usize,
    leaves_on_right: usize,
    placed: usize,
}

impl ClumpPyramid {
    fn new() -> Self {
        Self {
            clumps: vec![Clump {
                orientation: Side::Center,
                entries: Vec::new(),
            }],
            ..Default::default()
        }
    }

    /// Inserts one leaf given its root-to-parent ancestor chain.
    fn insert(&mut self, leaf: &NodeId, chain: &[NodeId]) {
        let side = if self.placed == 0 {
            Side::Center
        } else if self.leaves_on_left <= self.leaves_on_right {
            Side::Left
        } else {
            Side::Right
        };

        let mut current = 0usize;
        for ancestor in chain {
            current = match self.clump_by_node.get(ancestor) {
                Some(&idx) => idx,
                None => {
                    let idx = self.clumps.len();
                    self.clumps.push(Clump {
                        orientation: side,
                        entries: Vec::new(),
                    });
                    self.push_entry(current, Entry::Clump(idx), side);
                    self.clump_by_node.insert(ancestor.clone(), idx);
                    idx
                }
            };
        }
        self.push_entry(current, Entry::Leaf(leaf.clone()), side);

        match side {
            Side::Left => self.leaves_on_left += 1,
            Side::Right => self.leaves_on_right += 1,
            Side::Center => {}
        }
        self.placed += 1;
    }

    /// A center clump alternates by the inserting leaf's side; a slanted
    /// clump always grows toward its own side.
    fn push_entry(&mut self, into: usize, entry: Entry, leaf_side: Side) {
        let effective = match self.clumps[into].orientation {
            Side::Center => leaf_side,
            fixed => fixed,
        };
        match effective {
            Side::Left => self.clumps[into].entries.insert(0, entry),
            Side::Center | Side::Right => self.clumps[into].entries.push(entry),
        }
    }

    fn flatten(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.placed);
        self.flatten_into(0, &mut out);
        out
    }

    fn flatten_into(&self, clump: usize, out: &mut Vec<NodeId>) {
        for entry in &self.clumps[clump].entries {
            match entry {
                Entry::Leaf(id) => out.push(id.clone()),
                Entry::Clump(idx) => self.flatten_into(*idx, out),
            }
        }
    }
}

/// The flat left-to-right leaf order. Clump structures are discarded once the
/// order exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Positioning {
    pub order: Vec<NodeId>,
}

impl Positioning {
    /// Computes the leaf order. Stems must already be built; the result is
    /// identical regardless of registry iteration order for identical stem
    /// lengths.
    pub fn compute(registry: &NodeRegistry) -> Positioning {
        let mut leaves: Vec<(&NodeId, f64)> = registry
            .iter()
            .filter(|(_, n)| n.is_leaf())
            .map(|(id, n)| {
                let stem = n.stem.as_ref().expect("stems built before positioning");
                (id, stem.lengths.scalable)
            })
            .collect();
        leaves.sort_by(|(a_id, a_len), (b_id, b_len)| {
            b_len.total_cmp(a_len).then_with(|| a_id.cmp(b_id))
        });

        let mut pyramid = ClumpPyramid::new();
        for (id, _) in leaves {
            let chain = &registry[id]
                .stem
                .as_ref()
                .expect("stems built before positioning")
                .ancestors
                .ids;
            pyramid.insert(id, chain);
        }

        Positioning {
            order: pyramid.flatten(),
        }
    }
}
