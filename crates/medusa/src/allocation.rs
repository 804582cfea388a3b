//! Node allocation: proportional 1D space and final 2D placement.
//!
//! Leaves get shares of the canvas boundary first (units), stack into
//! contiguous blocks along three connected boundary segments, and project
//! onto them. Midpoints then sit between their parent and the centroid of
//! their leaves, and finally every leaf is pulled off the perimeter onto the
//! line from its actual parent so that drawn edge lengths match durations.
//! The perimeter only ever decides angle and ordering, never final distance.

use crate::error::{Error, Result, ensure_finite};
use crate::geom::{LineCoordinates, Point, point};
use crate::node::{NodeId, NodeRegistry, Position, breadth_first_ids, root_ids};
use crate::scale::Scale;
use crate::settings::{LayoutSettings, MidpointPlacement};
use crate::stem;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

/// Children may deviate up to a quarter turn from their parent's own heading
/// before the backwards-angle clamp snaps them to the cone edge.
const BACKWARDS_ANGLE_RANGE: f64 = FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Boundary {
    Left,
    Bottom,
    Right,
}

/// One leaf's placement on a segment, in 1D units along the boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceBlock {
    pub node: NodeId,
    pub begin: f64,
    pub end: f64,
}

impl SpaceBlock {
    pub fn center(&self) -> f64 {
        (self.begin + self.end) / 2.0
    }
}

/// One of the three canvas-boundary line pieces leaves project onto.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub boundary: Boundary,
    pub begin: f64,
    pub end: f64,
    pub line: LineCoordinates,
    pub blocks: Vec<SpaceBlock>,
}

impl Segment {
    fn contains(&self, offset: f64) -> bool {
        offset >= self.begin && offset < self.end
    }

    fn translate(&self, offset: f64) -> Point {
        self.line.point_at_length(offset - self.begin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub segments: Vec<Segment>,
    pub total_length: f64,
}

impl Default for Allocation {
    fn default() -> Self {
        Self {
            segments: Vec::new(),
            total_length: 0.0,
        }
    }
}

/// Assigns every node its units and final position. `order` is the
/// positioning pass's flat leaf order; stems must be built and scaled.
pub fn allocate(
    registry: &mut NodeRegistry,
    order: &[NodeId],
    scale: &Scale,
    settings: &LayoutSettings,
) -> Result<Allocation> {
    if registry.is_empty() {
        return Ok(Allocation::default());
    }

    let bfs = breadth_first_ids(registry);
    let roots = root_ids(registry);
    let units = proportional_units(registry, &bfs, &roots)?;
    let mut allocation = boundary_segments(registry, &roots, scale, settings)?;

    // Stack leaf blocks contiguously in positioning order and remember each
    // leaf's projected perimeter point.
    let mut perimeter: FxHashMap<NodeId, Point> = FxHashMap::default();
    let mut offsets: FxHashMap<NodeId, f64> = FxHashMap::default();
    let mut cursor = 0.0;
    for leaf in order {
        let share = units.get(leaf).copied().unwrap_or(0.0);
        let length = ensure_finite(leaf, "block length", share * allocation.total_length)?;
        let block = SpaceBlock {
            node: leaf.clone(),
            begin: cursor,
            end: cursor + length,
        };
        let center = block.center();
        let segment_idx = allocation
            .segments
            .iter()
            .position(|s| s.contains(center))
            .unwrap_or(allocation.segments.len() - 1);
        let segment = &mut allocation.segments[segment_idx];
        let projected = segment.translate(center);
        segment.blocks.push(block);
        perimeter.insert(leaf.clone(), projected);
        offsets.insert(leaf.clone(), center);
        cursor += length;
    }

    // Descendant leaf lists, bottom-up, for centroid computation.
    let mut leaves_of: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for id in bfs.iter().rev() {
        let node = &registry[id];
        let list = if node.is_leaf() {
            vec![id.clone()]
        } else {
            node.children
                .iter()
                .flat_map(|c| leaves_of[c].iter().cloned())
                .collect()
        };
        leaves_of.insert(id.clone(), list);
    }

    let mut positions: FxHashMap<NodeId, Point> = FxHashMap::default();
    let mut inbound_angle: FxHashMap<NodeId, f64> = FxHashMap::default();

    for id in &bfs {
        let node = &registry[id];
        let placed = match node.parent.clone() {
            None => place_root(registry, id, &roots, &perimeter, &leaves_of, settings)?,
            Some(parent_id) => {
                let parent_point = positions[&parent_id];
                let own_radius = stem::scaled_radius(registry, id);
                let parent_radius = stem::scaled_radius(registry, &parent_id);
                let line_length = stem::scaled_line_length(registry, id);

                let target = if node.is_leaf() {
                    perimeter[id]
                } else {
                    leaf_center(id, &leaves_of[id], &perimeter)?
                };

                let line = line_towards(parent_point, target)?;
                let line = match inbound_angle.get(&parent_id) {
                    Some(&reference) => {
                        line.prevent_backwards_angle(reference, BACKWARDS_ANGLE_RANGE)
                    }
                    None => line,
                };
                inbound_angle.insert(id.clone(), line.radians());

                if !node.is_leaf() && settings.midpoint_placement == MidpointPlacement::Spider {
                    point(
                        (parent_point.x + target.x) / 2.0,
                        (parent_point.y + target.y) / 2.0,
                    )
                } else {
                    line.point_at_length(parent_radius + line_length + own_radius)
                }
            }
        };

        ensure_finite(id, "x position", placed.x)?;
        ensure_finite(id, "y position", placed.y)?;
        positions.insert(id.clone(), placed);
    }

    for id in &bfs {
        let p = positions[id];
        registry[id].position = Some(Position {
            x: p.x,
            y: p.y,
            units: units.get(id).copied().unwrap_or(0.0),
            offset: offsets.get(id).copied().unwrap_or(0.0),
        });
    }

    tracing::debug!(
        leaves = order.len(),
        total_length = allocation.total_length,
        "node allocation complete"
    );
    Ok(allocation)
}

/// Splits units depth by depth: each node's share of its parent's units is
/// its longest descendant leaf against the sum over its siblings. The
/// recursive split keeps one subtree's leaf count from distorting an
/// unrelated sibling branch's apparent width.
fn proportional_units(
    registry: &NodeRegistry,
    bfs: &[NodeId],
    roots: &[NodeId],
) -> Result<FxHashMap<NodeId, f64>> {
    let mut longest_leaf: FxHashMap<NodeId, f64> = FxHashMap::default();
    for id in bfs.iter().rev() {
        let node = &registry[id];
        let value = if node.is_leaf() {
            node.stem
                .as_ref()
                .expect("stems built before allocation")
                .lengths
                .scalable
        } else {
            node.children
                .iter()
                .map(|c| longest_leaf[c])
                .fold(0.0, f64::max)
        };
        longest_leaf.insert(id.clone(), value);
    }

    let mut units: FxHashMap<NodeId, f64> = FxHashMap::default();
    let root_total: f64 = roots.iter().map(|r| longest_leaf[r]).sum();
    for root in roots {
        let share = if roots.len() == 1 {
            1.0
        } else if root_total > 0.0 {
            longest_leaf[root] / root_total
        } else {
            1.0 / roots.len() as f64
        };
        units.insert(root.clone(), share);
    }

    for id in bfs {
        let node = &registry[id];
        if node.children.is_empty() {
            continue;
        }
        let parent_units = units[id];
        let total: f64 = node.children.iter().map(|c| longest_leaf[c]).sum();
        for child in &node.children {
            let share = if total > 0.0 {
                longest_leaf[child] / total
            } else {
                // All-zero siblings split evenly rather than divide by zero.
                1.0 / node.children.len() as f64
            };
            units.insert(
                child.clone(),
                ensure_finite(child, "units share", parent_units * share)?,
            );
        }
    }
    Ok(units)
}

/// The three connected boundary segments: down the left edge, across the
/// bottom, up the right edge. The top band stays reserved for the root.
fn boundary_segments(
    registry: &NodeRegistry,
    roots: &[NodeId],
    scale: &Scale,
    settings: &LayoutSettings,
) -> Result<Allocation> {
    let width = settings.svg_width;
    let height = scale.final_svg_height();
    let edge = settings.svg_distance_from_edge;

    let mut reserved = edge;
    if let Some(root_id) = roots.first() {
        let root = &registry[root_id];
        if root.kind.is_shortcut() {
            reserved += settings.shortcut_length;
            if let Some(child) = root.children.first() {
                reserved += 2.0 * stem::scaled_radius(registry, child);
            }
        } else {
            reserved += 2.0 * stem::scaled_radius(registry, root_id);
        }
    }

    let side_length = ensure_finite("canvas", "side segment length", height - edge - reserved)?;
    let bottom_length = ensure_finite("canvas", "bottom segment length", width - 2.0 * edge)?;
    if side_length <= 0.0 || bottom_length <= 0.0 {
        return Err(Error::InvalidNumber {
            node: "canvas".to_string(),
            computation: "boundary segment length".to_string(),
            value: side_length.min(bottom_length),
        });
    }

    let left = LineCoordinates::from_points(edge, reserved, edge, height - edge)?;
    let bottom = LineCoordinates::from_points(edge, height - edge, width - edge, height - edge)?;
    let right = LineCoordinates::from_points(width - edge, height - edge, width - edge, reserved)?;

    let mut segments = Vec::with_capacity(3);
    let mut begin = 0.0;
    for (boundary, line) in [
        (Boundary::Left, left),
        (Boundary::Bottom, bottom),
        (Boundary::Right, right),
    ] {
        let end = begin + line.length();
        segments.push(Segment {
            boundary,
            begin,
            end,
            line,
            blocks: Vec::new(),
        });
        begin = end;
    }

    Ok(Allocation {
        segments,
        total_length: begin,
    })
}

fn place_root(
    registry: &NodeRegistry,
    id: &NodeId,
    roots: &[NodeId],
    perimeter: &FxHashMap<NodeId, Point>,
    leaves_of: &FxHashMap<NodeId, Vec<NodeId>>,
    settings: &LayoutSettings,
) -> Result<Point> {
    if roots.len() == 1 {
        let radius = stem::scaled_radius(registry, id);
        return Ok(point(
            settings.svg_width / 2.0,
            settings.svg_distance_from_edge + radius,
        ));
    }
    // A root-less flat set has no anchor above it. Leaf roots sit where their
    // block projected; grouping roots sit at the centroid of their leaves.
    match perimeter.get(id) {
        Some(p) => Ok(*p),
        None => leaf_center(id, &leaves_of[id], perimeter),
    }
}

fn leaf_center(
    id: &NodeId,
    leaves: &[NodeId],
    perimeter: &FxHashMap<NodeId, Point>,
) -> Result<Point> {
    let count = leaves.len() as f64;
    let (sum_x, sum_y) = leaves.iter().fold((0.0, 0.0), |(x, y), leaf| {
        let p = perimeter[leaf];
        (x + p.x, y + p.y)
    });
    Ok(point(
        ensure_finite(id, "leaf center x", sum_x / count)?,
        ensure_finite(id, "leaf center y", sum_y / count)?,
    ))
}

/// Line from a parent towards a target point. A degenerate zero-length line
/// falls back to pointing straight down so distances can still be laid off.
fn line_towards(from: Point, to: Point) -> Result<LineCoordinates> {
    let line = LineCoordinates::from_points(from.x, from.y, to.x, to.y)?;
    if line.length() == 0.0 {
        return LineCoordinates::from_radians(from.x, from.y, 1.0, FRAC_PI_2);
    }
    Ok(line)
}
