//! Planar points with exact coordinate equality.
//!
//! # Equality Semantics
//!
//! Two points are equal when both coordinates match exactly. Comparison goes
//! through [`OrderedFloat`], so `-0.0 == 0.0` and all `NaN` bit patterns
//! compare equal to each other. This keeps `Eq` and `Hash` consistent, which
//! the spatial index relies on for duplicate detection and the mesh builder
//! relies on for mapping oracle output back to soundings.
//!
//! No tolerance is applied anywhere: a sounding moved by one ulp is a
//! different sounding.

#![forbid(unsafe_code)]

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// POINT STRUCT DEFINITION
// =============================================================================

/// A point in the chart plane, in ground units of the source data.
///
/// # Examples
///
/// ```rust
/// use sounding_selection::geometry::point::Point;
///
/// let p = Point::new(10.0, -2.5);
/// assert_eq!(p.x(), 10.0);
/// assert_eq!(p.y(), -2.5);
/// assert_eq!(p, Point::new(10.0, -2.5));
/// ```
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl Point {
    /// Creates a point from its two coordinates.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The x (easting) coordinate.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// The y (northing) coordinate.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Coordinate on axis `axis` (0 = x, 1 = y).
    ///
    /// # Panics
    ///
    /// Panics if `axis > 1`. Axes are a closed set; asking for a third one is
    /// a programming error.
    #[inline]
    #[must_use]
    pub fn coord(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => panic!("Point has two axes, requested axis {axis}"),
        }
    }

    /// Sets the coordinate on axis `axis` (0 = x, 1 = y).
    ///
    /// # Panics
    ///
    /// Panics if `axis > 1`.
    #[inline]
    pub fn set_coord(&mut self, axis: usize, value: f64) {
        match axis {
            0 => self.x = value,
            1 => self.y = value,
            _ => panic!("Point has two axes, requested axis {axis}"),
        }
    }

    /// Returns `true` when both coordinates are finite.
    #[inline]
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Squared Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Converts to a `geo` coordinate for kernel predicates.
    #[inline]
    #[must_use]
    pub const fn to_coord(self) -> geo::Coord<f64> {
        geo::Coord {
            x: self.x,
            y: self.y,
        }
    }

    /// Converts to a `geo` point for kernel predicates.
    #[inline]
    #[must_use]
    pub fn to_geo(self) -> geo::Point<f64> {
        geo::Point::new(self.x, self.y)
    }
}

// =============================================================================
// STANDARD TRAIT IMPLEMENTATIONS
// =============================================================================

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        OrderedFloat(self.x) == OrderedFloat(other.x) && OrderedFloat(self.y) == OrderedFloat(other.y)
    }
}

impl Eq for Point {}

impl Hash for Point {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        OrderedFloat(self.x).hash(state);
        OrderedFloat(self.y).hash(state);
    }
}

impl From<(f64, f64)> for Point {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Point {
    #[inline]
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<geo::Coord<f64>> for Point {
    #[inline]
    fn from(c: geo::Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({},{})", self.x, self.y)
    }
}

// =============================================================================
// TESTS
// =============================================================================
