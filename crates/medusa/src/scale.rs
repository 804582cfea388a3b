//! Global scale-factor search.
//!
//! One pixels-per-duration factor must satisfy several space constraints at
//! once. Each constraint becomes a `ScaleWeight`; the smallest weight (the
//! most constraining resource) wins, with one documented exception for the
//! stretched-height variant of the longest stem.

use crate::error::{Error, Result, ensure_finite};
use crate::node::{NodeId, NodeRegistry};
use crate::settings::LayoutSettings;
use crate::stem::Stem;
use serde::Serialize;

/// Triangle-ratio corrections approximating the angle percentile stems are
/// expected to be drawn at when they cross the canvas width.
const Q25_WIDTH_RATIO: f64 = 0.8;
const Q50_WIDTH_RATIO: f64 = 0.71;
const Q75_WIDTH_RATIO: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WeightCategory {
    Longest,
    LongestStretched,
    Shortest,
    Q25,
    Q50,
    Q75,
    DiameterClamp,
    SizeIndependent,
}

/// One space constraint: how many pixels per duration unit would exactly fill
/// `available` after the fixed costs are paid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleWeight {
    pub category: WeightCategory,
    pub node: Option<NodeId>,
    pub available: f64,
    pub absolute: f64,
    pub scalable: f64,
    pub weight: f64,
}

impl ScaleWeight {
    pub fn new(
        category: WeightCategory,
        node: Option<NodeId>,
        available: f64,
        absolute: f64,
        scalable: f64,
    ) -> Self {
        let raw = if scalable == 0.0 && absolute > 0.0 {
            available / absolute
        } else {
            (available - absolute) / scalable
        };
        // Degenerate constraints (a single zero-duration node) fall back to a
        // neutral 1:1 scale instead of poisoning the search.
        let weight = if raw.is_finite() { raw } else { 1.0 };
        Self {
            category,
            node,
            available,
            absolute,
            scalable,
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scale {
    factor: f64,
    final_svg_height: f64,
    size_independent_scale: f64,
    line_fixed: f64,
    chosen: Option<ScaleWeight>,
    weights: Vec<ScaleWeight>,
}

impl Scale {
    /// Runs the most-constraining-resource search over the registry's stems.
    /// Stems must already be built.
    pub fn compute(registry: &NodeRegistry, settings: &LayoutSettings) -> Result<Scale> {
        let line_fixed = settings.line_fixed_length();

        // Leaf stems, ascending by scalable length, ties by id so the search
        // is invariant under input iteration order.
        let mut leaves: Vec<(&NodeId, &Stem)> = registry
            .iter()
            .filter(|(_, n)| n.is_leaf())
            .map(|(id, n)| (id, n.stem.as_ref().expect("stems built before scale")))
            .collect();
        leaves.sort_by(|(a_id, a), (b_id, b)| {
            a.lengths
                .scalable
                .total_cmp(&b.lengths.scalable)
                .then_with(|| a_id.cmp(b_id))
        });

        if leaves.is_empty() {
            return Ok(Scale {
                factor: 1.0,
                final_svg_height: settings.svg_height,
                size_independent_scale: 1.0,
                line_fixed,
                chosen: None,
                weights: Vec::new(),
            });
        }

        let available_width = settings.available_width();
        let available_height = settings.available_height();
        let shortest = leaves[0];
        let longest = leaves[leaves.len() - 1];

        let percentile = |p: f64| {
            let idx = ((leaves.len() - 1) as f64 * p).round() as usize;
            leaves[idx]
        };

        let constrain = |category, (id, stem): (&NodeId, &Stem), available: f64| {
            ScaleWeight::new(
                category,
                Some(id.clone()),
                available,
                stem.lengths.absolute,
                stem.lengths.scalable,
            )
        };

        let mut weights = vec![constrain(WeightCategory::Longest, longest, available_height)];

        let stretch_multiplier = height_stretch_multiplier(longest.1);
        if settings.allow_stretch && stretch_multiplier > 1.0 {
            weights.push(constrain(
                WeightCategory::LongestStretched,
                longest,
                settings.svg_height * stretch_multiplier - 2.0 * settings.svg_distance_from_edge,
            ));
        }
        weights.push(constrain(
            WeightCategory::Shortest,
            shortest,
            available_width / 2.0,
        ));
        weights.push(constrain(
            WeightCategory::Q25,
            percentile(0.25),
            available_width * Q25_WIDTH_RATIO,
        ));
        weights.push(constrain(
            WeightCategory::Q50,
            percentile(0.5),
            available_width * Q50_WIDTH_RATIO,
        ));
        weights.push(constrain(
            WeightCategory::Q75,
            percentile(0.75),
            available_width * Q75_WIDTH_RATIO,
        ));

        // No circle may grow past half the smaller canvas side. A tree with
        // no circles at all has nothing to clamp.
        let mut widest: Option<(&NodeId, f64)> = None;
        for (id, node) in registry.iter() {
            let diameter = node.stem.as_ref().expect("stems built before scale").own_diameter;
            if diameter > 0.0 && widest.is_none_or(|(_, d)| diameter > d) {
                widest = Some((id, diameter));
            }
        }
        if let Some((id, diameter)) = widest {
            weights.push(ScaleWeight::new(
                WeightCategory::DiameterClamp,
                Some(id.clone()),
                available_width.min(available_height) / 2.0,
                0.0,
                diameter,
            ));
        }

        for w in &weights {
            ensure_finite(
                w.node.as_deref().unwrap_or("scale"),
                "scale weight",
                w.weight,
            )?;
        }

        let mut by_smallest: Vec<&ScaleWeight> = weights.iter().collect();
        by_smallest.sort_by(|a, b| a.weight.total_cmp(&b.weight));

        // The height constraint alone should not force a tall, thin diagram
        // when stretching was allowed anyway: if the stretched variant is the
        // very next restriction, prefer it.
        let mut chosen = by_smallest[0];
        if chosen.category == WeightCategory::Longest
            && by_smallest
                .get(1)
                .is_some_and(|w| w.category == WeightCategory::LongestStretched)
        {
            chosen = by_smallest[1];
        }

        let factor = chosen.weight;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(Error::InvalidNumber {
                node: chosen.node.clone().unwrap_or_else(|| "scale".to_string()),
                computation: "scale factor".to_string(),
                value: factor,
            });
        }

        let final_svg_height = if chosen.category == WeightCategory::LongestStretched {
            settings.svg_height * stretch_multiplier
        } else {
            settings.svg_height
        };

        // Collapse decisions must not vary with the render surface, so gate
        // them on a weight computed against a fixed reference height.
        let size_independent = ScaleWeight::new(
            WeightCategory::SizeIndependent,
            Some(longest.0.clone()),
            settings.size_independent_height,
            longest.1.lengths.absolute,
            longest.1.lengths.scalable,
        );

        let chosen = chosen.clone();
        tracing::debug!(
            category = ?chosen.category,
            factor,
            final_svg_height,
            "scale factor chosen"
        );

        Ok(Scale {
            factor,
            final_svg_height,
            size_independent_scale: size_independent.weight,
            line_fixed,
            chosen: Some(chosen),
            weights,
        })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn final_svg_height(&self) -> f64 {
        self.final_svg_height
    }

    pub fn size_independent_scale(&self) -> f64 {
        self.size_independent_scale
    }

    pub fn chosen(&self) -> Option<&ScaleWeight> {
        self.chosen.as_ref()
    }

    pub fn weights(&self) -> &[ScaleWeight] {
        &self.weights
    }

    /// Pixel length of a line encoding `between` duration, fixed costs
    /// included.
    pub fn line_length(&self, between: f64) -> f64 {
        self.factor * between + self.line_fixed
    }

    /// Pixel radius of a circle encoding `within` duration.
    pub fn circle_radius(&self, within: f64) -> f64 {
        self.factor * crate::stem::own_diameter(within) / 2.0
    }
}

/// How far past the configured height the longest stem may stretch.
/// Line-dominated profiles read better tall (up to 1.5x); bubble-dominated
/// ones barely stretch at all.
fn height_stretch_multiplier(longest: &Stem) -> f64 {
    if longest.lengths.scalable <= 0.0 {
        return 1.0;
    }
    let line_fraction =
        (longest.ancestors.total_between + longest.own_between) / longest.lengths.scalable;
    1.0 + 0.5 * line_fraction.clamp(0.0, 1.0)
}
