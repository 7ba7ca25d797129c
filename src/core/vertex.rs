//! Soundings and hazard points.
//!
//! A [`Vertex`] is a chart-plane [`Point`] with a depth (positive down) and
//! the attributes the selection pipeline reads:
//!
//! - an optional danger-to-navigation [`Feature`] (obstruction, rock, wreck)
//! - an optional [`AccuracyCategory`] (CATZOC zone of confidence)
//! - a mutable [`Classification`] tag
//!
//! Identity is by coordinates only. Two vertices at the same position are the
//! same sounding for indexing purposes whatever their depths, so a vertex
//! must never be moved while it is held by a spatial index.
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::core::vertex::{AccuracyCategory, Vertex, VertexBuilder};
//! use sounding_selection::geometry::point::Point;
//! use sounding_selection::sounding;
//!
//! let v: Vertex = sounding!(10.0, 20.0, 5.4);
//! assert_eq!(v.depth(), 5.4);
//!
//! let surveyed = VertexBuilder::default()
//!     .point(Point::new(10.0, 20.0))
//!     .depth(7.0)
//!     .quality(AccuracyCategory::A2)
//!     .build()
//!     .unwrap();
//! assert_eq!(surveyed, v); // same position, same sounding
//! ```

#![forbid(unsafe_code)]

use crate::geometry::point::Point;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Depth assigned to synthetic boundary vertices whose true depth is unknown.
///
/// Triangles touching such a vertex are treated as degenerate by the safety
/// validator.
pub const SENTINEL_DEPTH: f64 = -99_999.0;

// =============================================================================
// ATTRIBUTE TYPES
// =============================================================================

/// Danger-to-navigation feature classes, with their S-57 object codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    /// OBSTRN (20).
    Obstruction,
    /// UWTROC (35).
    Rock,
    /// WRECKS (45).
    Wreck,
}

impl FeatureType {
    /// S-57 object code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Obstruction => 20,
            Self::Rock => 35,
            Self::Wreck => 45,
        }
    }

    /// Inverse of [`FeatureType::code`].
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            20 => Some(Self::Obstruction),
            35 => Some(Self::Rock),
            45 => Some(Self::Wreck),
            _ => None,
        }
    }
}

/// A hazard feature: its class plus the class-specific condition code
/// (wreck category or water level attribute).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feature {
    /// Feature class.
    pub kind: FeatureType,
    /// Condition code, `None` when not recorded.
    pub condition: Option<u8>,
}

impl Feature {
    /// Creates a feature.
    #[must_use]
    pub const fn new(kind: FeatureType, condition: Option<u8>) -> Self {
        Self { kind, condition }
    }
}

/// Zone-of-confidence category bounding the vertical uncertainty of a depth.
///
/// Ordered from best (`A1`) to worst (`U`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccuracyCategory {
    /// Code 1.
    A1,
    /// Code 2.
    A2,
    /// Code 3.
    B,
    /// Code 4.
    C,
    /// Code 5.
    D,
    /// Code 6, unassessed.
    U,
}

impl AccuracyCategory {
    /// Numeric code (1 to 6).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::A1 => 1,
            Self::A2 => 2,
            Self::B => 3,
            Self::C => 4,
            Self::D => 5,
            Self::U => 6,
        }
    }

    /// Inverse of [`AccuracyCategory::code`].
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::A1),
            2 => Some(Self::A2),
            3 => Some(Self::B),
            4 => Some(Self::C),
            5 => Some(Self::D),
            6 => Some(Self::U),
            _ => None,
        }
    }
}

/// How a selected sounding entered the final selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionRole {
    /// Survived label generalization.
    Generalized,
    /// Took the place of a generalized sounding during safety repair.
    Substituted,
    /// Added outright during safety repair.
    Appended,
}

/// Classification tag of a vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// No tag.
    #[default]
    Unclassified,
    /// Local pit: every neighbour is shallower.
    Minimum,
    /// Local shoal: every neighbour is deeper.
    Maximum,
    /// Alternating deeper and shallower neighbours around the wheel.
    Saddle,
    /// Part of the chart selection.
    Selected(SelectionRole),
}

impl Classification {
    /// Returns `true` for minima, maxima and saddles.
    #[must_use]
    pub const fn is_critical(self) -> bool {
        matches!(self, Self::Minimum | Self::Maximum | Self::Saddle)
    }
}

// =============================================================================
// CONVENIENCE MACRO
// =============================================================================

/// Builds a [`Vertex`] from `x, y, depth` and an optional accuracy category.
///
/// # Panics
///
/// Panics if a coordinate or the depth is not finite.
///
/// ```rust
/// use sounding_selection::core::vertex::AccuracyCategory;
/// use sounding_selection::sounding;
///
/// let v = sounding!(1.0, 2.0, 3.5, AccuracyCategory::B);
/// assert_eq!(v.quality(), Some(AccuracyCategory::B));
/// ```
#[macro_export]
macro_rules! sounding {
    ($x:expr, $y:expr, $depth:expr) => {
        $crate::core::vertex::VertexBuilder::default()
            .point($crate::geometry::point::Point::new($x, $y))
            .depth($depth)
            .build()
            .expect("Failed to build sounding: coordinates and depth must be finite")
    };
    ($x:expr, $y:expr, $depth:expr, $quality:expr) => {
        $crate::core::vertex::VertexBuilder::default()
            .point($crate::geometry::point::Point::new($x, $y))
            .depth($depth)
            .quality($quality)
            .build()
            .expect("Failed to build sounding: coordinates and depth must be finite")
    };
}

pub use crate::sounding;

// =============================================================================
// VERTEX
// =============================================================================

/// A sounding or hazard point.
#[derive(Builder, Clone, Copy, Debug, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Vertex {
    /// Position in the chart plane.
    point: Point,
    /// Depth, positive down.
    #[builder(default)]
    depth: f64,
    /// Hazard feature, when this point is a danger to navigation.
    #[builder(setter(into, strip_option), default)]
    feature: Option<Feature>,
    /// Zone-of-confidence category.
    #[builder(setter(into, strip_option), default)]
    quality: Option<AccuracyCategory>,
    /// Classification tag.
    #[builder(default)]
    classification: Classification,
}

impl VertexBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(p) = self.point.filter(|p| !p.is_finite()) {
            return Err(format!("vertex coordinates must be finite, got {p}"));
        }
        if let Some(depth) = self.depth.filter(|d| !d.is_finite()) {
            return Err(format!("vertex depth must be finite, got {depth}"));
        }
        Ok(())
    }
}

impl Vertex {
    /// Plain sounding with no attributes.
    #[must_use]
    pub const fn new(point: Point, depth: f64) -> Self {
        Self {
            point,
            depth,
            feature: None,
            quality: None,
            classification: Classification::Unclassified,
        }
    }

    /// Position.
    #[inline]
    #[must_use]
    pub const fn point(&self) -> Point {
        self.point
    }

    /// Depth, positive down.
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> f64 {
        self.depth
    }

    /// Overwrites the depth. Does not affect identity.
    pub const fn set_depth(&mut self, depth: f64) {
        self.depth = depth;
    }

    /// Hazard feature, if any.
    #[must_use]
    pub const fn feature(&self) -> Option<Feature> {
        self.feature
    }

    /// Returns `true` for danger-to-navigation points.
    #[must_use]
    pub const fn is_hazard(&self) -> bool {
        self.feature.is_some()
    }

    /// Zone-of-confidence category, if any.
    #[must_use]
    pub const fn quality(&self) -> Option<AccuracyCategory> {
        self.quality
    }

    /// Current classification tag.
    #[must_use]
    pub const fn classification(&self) -> Classification {
        self.classification
    }

    /// Replaces the classification tag.
    pub const fn set_classification(&mut self, classification: Classification) {
        self.classification = classification;
    }

    /// Returns `true` when the depth is the boundary sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.depth == SENTINEL_DEPTH
    }

    /// Copy of `other`'s position, depth and attributes, tagged with `role`.
    ///
    /// Used when a conflicting measurement replaces a displayed sounding.
    #[must_use]
    pub const fn adopted_as(other: &Self, role: SelectionRole) -> Self {
        Self {
            classification: Classification::Selected(role),
            ..*other
        }
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.point.hash(state);
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.point.x(), self.point.y(), self.depth)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let v = VertexBuilder::default()
            .point(Point::new(1.0, 2.0))
            .build()
            .unwrap();
        assert_eq!(v.depth(), 0.0);
        assert_eq!(v.feature(), None);
        assert_eq!(v.quality(), None);
        assert_eq!(v.classification(), Classification::Unclassified);
    }

    #[test]
    fn test_builder_rejects_non_finite() {
        let err = VertexBuilder::default()
            .point(Point::new(f64::NAN, 2.0))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("finite"));

        let err = VertexBuilder::default()
            .point(Point::new(0.0, 2.0))
            .depth(f64::INFINITY)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("depth"));
    }

    #[test]
    fn test_builder_requires_point() {
        assert!(VertexBuilder::default().depth(3.0).build().is_err());
    }

    #[test]
    fn test_identity_ignores_depth() {
        let mut a = sounding!(1.0, 1.0, 5.0);
        let b = sounding!(1.0, 1.0, 9.0);
        assert_eq!(a, b);
        a.set_depth(2.0);
        assert_eq!(a, b);
        assert_ne!(a, sounding!(1.0, 1.5, 2.0));
    }

    #[test]
    fn test_code_tables_round_trip() {
        for kind in [FeatureType::Obstruction, FeatureType::Rock, FeatureType::Wreck] {
            assert_eq!(FeatureType::from_code(kind.code()), Some(kind));
        }
        assert_eq!(FeatureType::from_code(99), None);
        for code in 1..=6 {
            assert_eq!(AccuracyCategory::from_code(code).map(AccuracyCategory::code), Some(code));
        }
        assert!(AccuracyCategory::A1 < AccuracyCategory::U);
    }

    #[test]
    fn test_adopted_as_keeps_measurement() {
        let danger = VertexBuilder::default()
            .point(Point::new(3.0, 4.0))
            .depth(1.2)
            .quality(AccuracyCategory::C)
            .build()
            .unwrap();
        let shown = Vertex::adopted_as(&danger, SelectionRole::Substituted);
        assert_eq!(shown.point(), danger.point());
        assert_eq!(shown.depth(), 1.2);
        assert_eq!(shown.quality(), Some(AccuracyCategory::C));
        assert_eq!(
            shown.classification(),
            Classification::Selected(SelectionRole::Substituted)
        );
    }

    #[test]
    fn test_sentinel_and_critical() {
        let v = Vertex::new(Point::new(0.0, 0.0), SENTINEL_DEPTH);
        assert!(v.is_sentinel());
        assert!(Classification::Saddle.is_critical());
        assert!(!Classification::Selected(SelectionRole::Appended).is_critical());
        assert_eq!(sounding!(1.0, 2.0, 3.5).to_string(), "1,2,3.5");
    }
}
