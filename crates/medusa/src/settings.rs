//! Layout configuration.

use crate::error::{Result, ensure_non_negative};
use serde::{Deserialize, Serialize};

/// How internal (midpoint) nodes are placed between their parent and the
/// centroid of their leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MidpointPlacement {
    /// Lay the node off along the parent-to-centroid line at a distance that
    /// makes the drawn edge length match its duration.
    #[default]
    LengthConstrained,
    /// Place the node at the plain average of parent position and leaf
    /// centroid. Looser but cheaper, for exploratory views.
    Spider,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutSettings {
    /// Canvas width in pixels.
    pub svg_width: f64,
    /// Canvas height in pixels. May be exceeded when `allow_stretch` is set.
    pub svg_height: f64,
    /// Margin reserved on all four canvas sides.
    pub svg_distance_from_edge: f64,
    /// Stroke width of drawn edges; part of every stem's fixed length.
    pub line_width: f64,
    /// Space reserved around a node for its label; part of every stem's
    /// fixed length.
    pub label_minimum_space: f64,
    /// Permit exceeding `svg_height` for tall or line-dominated trees.
    pub allow_stretch: bool,
    /// Run the node-collapsing pre-pass before the final layout.
    pub collapse_nodes: bool,
    /// Fixed pixel length of shortcut edges in sub-layouts.
    pub shortcut_length: f64,
    /// Reference height used for the size-independent scale that gates
    /// collapsing, so collapse decisions do not vary with canvas size.
    pub size_independent_height: f64,
    pub midpoint_placement: MidpointPlacement,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            svg_width: 1000.0,
            svg_height: 1000.0,
            svg_distance_from_edge: 30.0,
            line_width: 2.5,
            label_minimum_space: 14.0,
            allow_stretch: true,
            collapse_nodes: false,
            shortcut_length: 100.0,
            size_independent_height: 680.0,
            midpoint_placement: MidpointPlacement::default(),
        }
    }
}

impl LayoutSettings {
    /// Fixed (scale-independent) length contributed by one node's inbound
    /// edge: label clearance on both sides plus the stroke itself.
    pub fn line_fixed_length(&self) -> f64 {
        2.0 * self.label_minimum_space + self.line_width
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (computation, value) in [
            ("svg width", self.svg_width),
            ("svg height", self.svg_height),
            ("svg distance from edge", self.svg_distance_from_edge),
            ("line width", self.line_width),
            ("label minimum space", self.label_minimum_space),
            ("shortcut length", self.shortcut_length),
            ("size independent height", self.size_independent_height),
        ] {
            ensure_non_negative("settings", computation, value)?;
        }
        ensure_non_negative("settings", "available width", self.available_width())?;
        ensure_non_negative("settings", "available height", self.available_height())?;
        Ok(())
    }

    pub(crate) fn available_width(&self) -> f64 {
        self.svg_width - 2.0 * self.svg_distance_from_edge
    }

    pub(crate) fn available_height(&self) -> f64 {
        self.svg_height - 2.0 * self.svg_distance_from_edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        LayoutSettings::default().validate().unwrap();
    }

    #[test]
    fn zero_sized_canvas_is_rejected() {
        let settings = LayoutSettings {
            svg_width: 0.0,
            svg_height: 0.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
