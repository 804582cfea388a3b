//! Geometry primitives shared by the layout passes.
//!
//! `LineCoordinates` is the directed-segment value type everything else builds
//! on: stems are laid off along lines, perimeter blocks project through them,
//! and midpoint placement interpolates on them.

use crate::error::{Error, Result};
use serde::Serialize;

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

/// Normalizes an angle in degrees to the `[-180, 180)` range.
pub fn normalize_degrees(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}

/// Normalizes the signed difference between two angles in radians to
/// `(-PI, PI]`.
fn angle_delta(radians: f64, reference: f64) -> f64 {
    let mut delta = (radians - reference).rem_euclid(std::f64::consts::TAU);
    if delta > std::f64::consts::PI {
        delta -= std::f64::consts::TAU;
    }
    delta
}

/// A directed line segment with a known length and angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineCoordinates {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    length: f64,
    radians: f64,
}

impl LineCoordinates {
    /// Builds a segment from its two endpoints.
    pub fn from_points(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        for (computation, value) in [
            ("x1 endpoint", x1),
            ("y1 endpoint", y1),
            ("x2 endpoint", x2),
            ("y2 endpoint", y2),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidLine { computation, value });
            }
        }
        let length = (x2 - x1).hypot(y2 - y1);
        let radians = (y2 - y1).atan2(x2 - x1);
        Ok(Self {
            x1,
            y1,
            x2,
            y2,
            length,
            radians,
        })
    }

    /// Builds a segment from an origin, a length and an angle in radians.
    pub fn from_radians(x1: f64, y1: f64, length: f64, radians: f64) -> Result<Self> {
        for (computation, value) in [
            ("x1 endpoint", x1),
            ("y1 endpoint", y1),
            ("length", length),
            ("radians", radians),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidLine { computation, value });
            }
        }
        let x2 = x1 + length * radians.cos();
        let y2 = y1 + length * radians.sin();
        Ok(Self {
            x1,
            y1,
            x2,
            y2,
            length,
            radians,
        })
    }

    /// Builds a segment from an origin, a length and an angle in degrees,
    /// normalized to `[-180, 180)`.
    pub fn from_degrees(x1: f64, y1: f64, length: f64, degrees: f64) -> Result<Self> {
        if !degrees.is_finite() {
            return Err(Error::InvalidLine {
                computation: "degrees",
                value: degrees,
            });
        }
        Self::from_radians(x1, y1, length, normalize_degrees(degrees).to_radians())
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn radians(&self) -> f64 {
        self.radians
    }

    pub fn degrees(&self) -> f64 {
        normalize_degrees(self.radians.to_degrees())
    }

    pub fn origin(&self) -> Point {
        point(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        point(self.x2, self.y2)
    }

    /// Interpolates the point `distance` along the segment from its origin.
    /// Distances beyond the segment length extrapolate on the same heading.
    pub fn point_at_length(&self, distance: f64) -> Point {
        point(
            self.x1 + distance * self.radians.cos(),
            self.y1 + distance * self.radians.sin(),
        )
    }

    /// The same segment walked in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            x1: self.x2,
            y1: self.y2,
            x2: self.x1,
            y2: self.y1,
            length: self.length,
            radians: angle_delta(self.radians + std::f64::consts::PI, 0.0),
        }
    }

    /// Clamps the segment's angle to within `acceptable_radians` of
    /// `reference_radians`, recomputing the endpoint. Used to stop a child
    /// segment doubling back over its parent: the parent's own heading is the
    /// reference, and anything outside the acceptable cone snaps to its edge.
    pub fn prevent_backwards_angle(&self, reference_radians: f64, acceptable_radians: f64) -> Self {
        let delta = angle_delta(self.radians, reference_radians);
        if delta.abs() <= acceptable_radians {
            return *self;
        }
        let clamped = reference_radians + acceptable_radians.copysign(delta);
        // from_radians only fails on non-finite input, which finite fields here rule out.
        Self::from_radians(self.x1, self.y1, self.length, clamped)
            .unwrap_or(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_degrees_wraps_into_half_open_range() {
        assert_eq!(normalize_degrees(270.0), -90.0);
        assert_eq!(normalize_degrees(-270.0), 90.0);
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(540.0), -180.0);
    }

    #[test]
    fn angle_delta_is_signed_and_wrapped() {
        assert!((angle_delta(0.1, -0.1) - 0.2).abs() < 1e-12);
        let wrapped = angle_delta(3.0, -3.0);
        assert!(wrapped < 0.0);
        assert!(wrapped.abs() < std::f64::consts::PI);
    }
}
