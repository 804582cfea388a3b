//! Per-node stem accounting.
//!
//! A stem is the accumulated visual length of a node plus all its ancestors:
//! the lines encode between time, the circle diameters encode within time.
//! Stems drive the global scale search, so they are rebuilt whenever topology
//! or scale changes, always top-down because ancestor totals come from the
//! parent's stem.

use crate::error::{Result, ensure_finite};
use crate::node::{NodeId, NodeRegistry, breadth_first_ids};
use crate::scale::Scale;
use crate::settings::LayoutSettings;
use serde::Serialize;

/// A circle's diameter is chosen so its circumference encodes within time at
/// the same pixels-per-duration rate a straight line would.
pub fn own_diameter(within_time: f64) -> f64 {
    2.0 * within_time / std::f64::consts::TAU
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StemAncestors {
    /// Root-to-parent path, nearest ancestor last.
    pub ids: Vec<NodeId>,
    pub total_between: f64,
    pub total_diameter: f64,
}

/// Split of a stem's length into the part that scales with the
/// pixels-per-duration factor and the part that is fixed (label clearance,
/// stroke width, shortcut edges).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StemLengths {
    pub scalable: f64,
    pub absolute: f64,
}

/// Pixel lengths of the node's own line and circle once a scale exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledStem {
    pub own_between: f64,
    pub own_diameter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stem {
    pub own_between: f64,
    pub own_diameter: f64,
    pub ancestors: StemAncestors,
    pub lengths: StemLengths,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaled: Option<ScaledStem>,
}

impl Stem {
    /// Total scalable stem length at the given scale factor. The combined sum
    /// is cached at construction, so repeated queries during the scale search
    /// stay O(1) per distinct scale.
    pub fn total_stem_length(&self, scale: f64) -> f64 {
        scale * self.lengths.scalable
    }
}

/// Builds a stem for every node in the registry, top-down.
pub fn build_stems(registry: &mut NodeRegistry, settings: &LayoutSettings) -> Result<()> {
    for id in breadth_first_ids(registry) {
        let node = &registry[&id];
        let node_own_between = node.between;
        let node_own_diameter = own_diameter(node.within);
        let is_shortcut = node.kind.is_shortcut();

        let (ancestors, parent_absolute, parent_is_shortcut) = match node.parent.clone() {
            Some(parent_id) => {
                let parent = &registry[&parent_id];
                let parent_stem = parent
                    .stem
                    .as_ref()
                    .expect("parent stem exists in breadth-first order");
                let mut ids = parent_stem.ancestors.ids.clone();
                ids.push(parent_id.clone());
                (
                    StemAncestors {
                        ids,
                        total_between: parent_stem.ancestors.total_between
                            + parent_stem.own_between,
                        total_diameter: parent_stem.ancestors.total_diameter
                            + parent_stem.own_diameter,
                    },
                    parent_stem.lengths.absolute,
                    parent.kind.is_shortcut(),
                )
            }
            None => (StemAncestors::default(), 0.0, false),
        };

        // Shortcut nodes are zero-length stubs; a node hanging off one pays
        // for the fixed-length shortcut edge instead of a scaled line.
        let own_fixed = if is_shortcut {
            0.0
        } else if parent_is_shortcut {
            settings.line_fixed_length() + settings.shortcut_length
        } else {
            settings.line_fixed_length()
        };

        let scalable = ancestors.total_between
            + ancestors.total_diameter
            + node_own_between
            + node_own_diameter;
        let absolute = parent_absolute + own_fixed;
        ensure_finite(&id, "stem scalable length", scalable)?;
        ensure_finite(&id, "stem absolute length", absolute)?;

        registry[&id].stem = Some(Stem {
            own_between: node_own_between,
            own_diameter: node_own_diameter,
            ancestors,
            lengths: StemLengths { scalable, absolute },
            scaled: None,
        });
    }
    Ok(())
}

/// Fills every stem's scaled lengths from the chosen scale.
pub fn apply_scale(
    registry: &mut NodeRegistry,
    scale: &Scale,
    settings: &LayoutSettings,
) -> Result<()> {
    for id in breadth_first_ids(registry) {
        let node = &registry[&id];
        let parent_is_shortcut = node
            .parent
            .as_ref()
            .is_some_and(|p| registry[p].kind.is_shortcut());

        let scaled = {
            let stem = node.stem.as_ref().expect("stems built before scaling");
            let own_between = if node.kind.is_shortcut() {
                0.0
            } else if parent_is_shortcut {
                settings.shortcut_length
            } else {
                scale.line_length(stem.own_between)
            };
            ScaledStem {
                own_between: ensure_finite(&id, "scaled between length", own_between)?,
                own_diameter: ensure_finite(
                    &id,
                    "scaled diameter",
                    scale.factor() * stem.own_diameter,
                )?,
            }
        };

        registry[&id]
            .stem
            .as_mut()
            .expect("stems built before scaling")
            .scaled = Some(scaled);
    }
    Ok(())
}

/// Scaled radius of a node's circle, zero until stems are scaled.
pub(crate) fn scaled_radius(registry: &NodeRegistry, id: &str) -> f64 {
    registry
        .get(id)
        .and_then(|n| n.stem.as_ref())
        .and_then(|s| s.scaled)
        .map(|s| s.own_diameter / 2.0)
        .unwrap_or(0.0)
}

/// Scaled length of the line into a node, zero until stems are scaled.
pub(crate) fn scaled_line_length(registry: &NodeRegistry, id: &str) -> f64 {
    registry
        .get(id)
        .and_then(|n| n.stem.as_ref())
        .and_then(|s| s.scaled)
        .map(|s| s.own_between)
        .unwrap_or(0.0)
}
