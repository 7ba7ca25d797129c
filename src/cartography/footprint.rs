//! Printed label and symbol footprints.
//!
//! Every sounding is drawn as a depth label whose shape depends on the
//! number actually printed; hazards are drawn as fixed symbols. For each
//! point the model yields two polygons in ground units:
//!
//! - the **label** (or symbol) as printed, used for exact overlap tests;
//! - a larger **search window** that contains every position from which
//!   another label or symbol could touch this one, used to bound index
//!   queries.
//!
//! A window is the catalogued window shape widened to the [`Reach`] of the
//! model: the label or symbol's bounding box grown on each side by the
//! furthest any catalogued footprint extends towards the opposite side.
//!
//! Shapes are catalogued in millimetres at paper scale and converted with
//! `ground = mm · scale / 1000`.
//!
//! # Displayed numbers
//!
//! Depths below 31 are printed truncated to one decimal, deeper values
//! truncated to an integer; a zero tenth is dropped (`5.0` prints as `5`).
//! The printed width is the digit count including the tenth, so `0.5`,
//! `12` and `1.2` are two characters wide. Labels wider than three
//! characters have no catalogued shape.
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::cartography::footprint::{DisplayedDepth, FootprintModel, LabelSpacing};
//! use sounding_selection::sounding;
//!
//! let shown = DisplayedDepth::from_depth(12.37).unwrap();
//! assert_eq!(shown.to_string(), "12.3");
//! assert_eq!(shown.characters(), 3);
//!
//! let model = FootprintModel::new(20_000.0, LabelSpacing::default());
//! let fp = model.footprint(&sounding!(0.0, 0.0, 12.37)).unwrap();
//! assert_eq!(fp.displayed, Some(shown));
//! ```

#![forbid(unsafe_code)]

use crate::core::diagnostics::{Diagnostic, DiagnosticSink};
use crate::core::vertex::{Feature, FeatureType, Vertex};
use crate::geometry::{domain::Domain, kernel, point::Point};
use geo::Polygon;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Extra spacing around label characters in millimetres when none is given.
pub const DEFAULT_SPACING_MM: f64 = 0.75;

/// Furthest any hazard symbol extends from its anchor, in millimetres.
pub const HAZARD_REACH_MM: f64 = 4.0;

/// Depths at or beyond this value are printed without a decimal.
pub const DECIMAL_LIMIT: f64 = 31.0;

/// Converts paper millimetres to ground units at `scale`.
#[must_use]
pub fn mm_to_ground(mm: f64, scale: f64) -> f64 {
    mm * scale / 1000.0
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Points that cannot be given a footprint. Callers report these and leave
/// the point out of label comparisons.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FootprintError {
    /// The printed label is wider than any catalogued shape.
    #[error("Depth label {displayed} needs {characters} characters; no shape is catalogued")]
    UnsupportedLabel {
        /// The number that would be printed.
        displayed: String,
        /// Its width in characters.
        characters: usize,
    },
    /// No symbol is catalogued for this hazard.
    #[error("No symbol for {kind:?} with condition {condition:?}")]
    UnsupportedHazard {
        /// Feature class.
        kind: FeatureType,
        /// Condition code.
        condition: Option<u8>,
    },
    /// The depth cannot be printed.
    #[error("Depth {depth} is not finite")]
    NonFiniteDepth {
        /// The offending depth.
        depth: f64,
    },
}

// =============================================================================
// DISPLAYED NUMBER
// =============================================================================

/// The number printed for a sounding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayedDepth {
    whole: u64,
    tenths: Option<u8>,
}

impl DisplayedDepth {
    /// Truncates `|depth|` to the printed precision.
    ///
    /// # Errors
    ///
    /// Returns [`FootprintError::NonFiniteDepth`] for `NaN` or infinite
    /// depths.
    pub fn from_depth(depth: f64) -> Result<Self, FootprintError> {
        if !depth.is_finite() {
            return Err(FootprintError::NonFiniteDepth { depth });
        }
        let n = depth.abs();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let shown = if n < DECIMAL_LIMIT {
            let tenths_total = (n * 10.0).trunc() as u64;
            let tenths = (tenths_total % 10) as u8;
            Self {
                whole: tenths_total / 10,
                tenths: (tenths != 0).then_some(tenths),
            }
        } else {
            Self {
                whole: n.trunc() as u64,
                tenths: None,
            }
        };
        Ok(shown)
    }

    /// Integer part.
    #[must_use]
    pub const fn whole(&self) -> u64 {
        self.whole
    }

    /// Tenths digit, `None` when printed as an integer.
    #[must_use]
    pub const fn tenths(&self) -> Option<u8> {
        self.tenths
    }

    /// Printed width in characters, the decimal point excluded.
    #[must_use]
    pub fn characters(&self) -> usize {
        let mut digits = 1;
        let mut rest = self.whole / 10;
        while rest > 0 {
            digits += 1;
            rest /= 10;
        }
        digits + usize::from(self.tenths.is_some())
    }

    /// Returns `true` when a tenth digit is printed.
    #[must_use]
    pub const fn is_decimal(&self) -> bool {
        self.tenths.is_some()
    }

    /// Returns `true` when the tenth digit is a `1`, which is drawn narrower.
    #[must_use]
    pub const fn is_narrow(&self) -> bool {
        matches!(self.tenths, Some(1))
    }

    /// Printed value as a number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self) -> f64 {
        self.whole as f64 + f64::from(self.tenths.unwrap_or(0)) / 10.0
    }
}

impl fmt::Display for DisplayedDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tenths {
            Some(t) => write!(f, "{}.{t}", self.whole),
            None => write!(f, "{}", self.whole),
        }
    }
}

// =============================================================================
// LABEL CATALOG
// =============================================================================

/// Catalogued label shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelShape {
    /// One digit.
    Single,
    /// Two digits, integer.
    Double,
    /// One digit and a tenth.
    DoubleDecimal {
        /// Tenth digit is `1`.
        narrow: bool,
    },
    /// Three digits, integer.
    Triple,
    /// Two digits and a tenth.
    TripleDecimal {
        /// Tenth digit is `1`.
        narrow: bool,
    },
}

impl LabelShape {
    /// Every catalogued shape.
    pub const ALL: [Self; 7] = [
        Self::Single,
        Self::Double,
        Self::DoubleDecimal { narrow: true },
        Self::DoubleDecimal { narrow: false },
        Self::Triple,
        Self::TripleDecimal { narrow: true },
        Self::TripleDecimal { narrow: false },
    ];

    /// Shape for a printed number, `None` when wider than three characters.
    #[must_use]
    pub fn for_displayed(shown: &DisplayedDepth) -> Option<Self> {
        let narrow = shown.is_narrow();
        match (shown.characters(), shown.is_decimal()) {
            (1, _) => Some(Self::Single),
            (2, false) => Some(Self::Double),
            (2, true) => Some(Self::DoubleDecimal { narrow }),
            (3, false) => Some(Self::Triple),
            (3, true) => Some(Self::TripleDecimal { narrow }),
            _ => None,
        }
    }

    /// Label outline offsets in millimetres for half-spacings `xs`, `ys`.
    ///
    /// Integer labels are rectangles; decimal labels add the lowered tenth
    /// as a step on the right.
    #[must_use]
    pub fn label_offsets(self, xs: f64, ys: f64) -> Vec<(f64, f64)> {
        let y1 = 1.4 + ys;
        let y2 = -1.4 - ys;
        let rectangle = |x1: f64, x2: f64| vec![(x1, y1), (x2, y1), (x2, y2), (x1, y2)];
        let stepped = |x1: f64, narrow: bool| {
            let x2 = 0.025;
            let x3 = if narrow { 1.4 } else { 1.9 } + xs;
            let x4 = -0.025;
            let y3 = 0.15 + ys;
            let y4 = -2.65 - ys;
            vec![
                (x1, y1),
                (x2, y1),
                (x2, y3),
                (x3, y3),
                (x3, y4),
                (x4, y4),
                (x4, y2),
                (x1, y2),
            ]
        };
        match self {
            Self::Single => rectangle(-1.9 - xs, 0.025),
            Self::Double => rectangle(-1.9 - xs, 1.9 + xs),
            Self::Triple => rectangle(-4.15 - xs, 1.9 + xs),
            Self::DoubleDecimal { narrow } => stepped(-1.9 - xs, narrow),
            Self::TripleDecimal { narrow } => stepped(-4.15 - xs, narrow),
        }
    }

    /// Search window offsets in millimetres, sized for the default spacing.
    #[must_use]
    pub fn window_offsets(self) -> &'static [(f64, f64)] {
        match self {
            Self::Single => &[(-4.57, 4.82), (4.57, 4.82), (4.57, -3.57), (-4.57, -3.57)],
            Self::Double => &[
                (-5.32, 4.82),
                (2.25, 4.82),
                (2.25, 3.57),
                (7.57, 3.57),
                (7.57, -3.57),
                (-5.32, -3.57),
            ],
            Self::DoubleDecimal { narrow: true } => &[
                (-5.32, 4.82),
                (0.82, 4.82),
                (0.82, 3.57),
                (4.82, 3.57),
                (4.82, 2.32),
                (7.07, 2.32),
                (7.07, -4.82),
                (-3.07, -4.82),
                (-3.07, -3.57),
                (-5.32, -3.57),
            ],
            Self::DoubleDecimal { narrow: false } => &[
                (-5.32, 4.82),
                (0.82, 4.82),
                (0.82, 3.57),
                (5.32, 3.57),
                (5.32, 2.32),
                (7.57, 2.32),
                (7.57, -4.82),
                (-3.07, -4.82),
                (-3.07, -3.57),
                (-5.32, -3.57),
            ],
            Self::Triple => &[
                (-7.57, 4.82),
                (0.82, 4.82),
                (0.82, 3.57),
                (7.57, 3.57),
                (7.57, -3.57),
                (-7.57, -3.57),
            ],
            Self::TripleDecimal { narrow: true } => &[
                (-7.57, 4.82),
                (0.82, 4.82),
                (0.82, 3.57),
                (4.82, 3.57),
                (4.82, 2.32),
                (7.07, 2.32),
                (7.07, -4.82),
                (-3.00, -4.82),
                (-3.00, -3.57),
                (-7.57, -3.57),
            ],
            Self::TripleDecimal { narrow: false } => &[
                (-7.57, 4.82),
                (0.82, 4.82),
                (0.82, 3.57),
                (5.32, 3.57),
                (5.32, 2.32),
                (7.57, 2.32),
                (7.57, -4.82),
                (-3.00, -4.82),
                (-3.00, -3.57),
                (-7.57, -3.57),
            ],
        }
    }
}

// =============================================================================
// FOOTPRINT MODEL
// =============================================================================

/// Extra character spacing in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelSpacing {
    /// Horizontal spacing.
    pub horizontal_mm: f64,
    /// Vertical spacing.
    pub vertical_mm: f64,
}

impl Default for LabelSpacing {
    fn default() -> Self {
        Self {
            horizontal_mm: DEFAULT_SPACING_MM,
            vertical_mm: DEFAULT_SPACING_MM,
        }
    }
}

/// Furthest distance, in millimetres, that any catalogued label or symbol
/// extends from its anchor towards each side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reach {
    /// Towards negative x.
    pub left: f64,
    /// Towards positive x.
    pub right: f64,
    /// Towards negative y.
    pub below: f64,
    /// Towards positive y.
    pub above: f64,
}

impl Reach {
    const fn uniform(mm: f64) -> Self {
        Self {
            left: mm,
            right: mm,
            below: mm,
            above: mm,
        }
    }
}

/// Label (or symbol) and search window of one point.
#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
    /// Region that bounds index queries for conflicts with this point.
    pub window: Polygon<f64>,
    /// The printed label or symbol.
    pub label: Polygon<f64>,
    /// The printed number, `None` for hazard symbols.
    pub displayed: Option<DisplayedDepth>,
}

/// Footprint catalog at a fixed scale and spacing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FootprintModel {
    scale: f64,
    spacing: LabelSpacing,
}

impl FootprintModel {
    /// Model for chart scale `1:scale`.
    #[must_use]
    pub const fn new(scale: f64, spacing: LabelSpacing) -> Self {
        Self { scale, spacing }
    }

    /// Chart scale denominator.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Reach of every label at this model's spacing and of every hazard
    /// symbol.
    #[must_use]
    pub fn reach(&self) -> Reach {
        let (xs, ys) = self.half_spacing();
        LabelShape::ALL
            .into_iter()
            .flat_map(|shape| shape.label_offsets(xs, ys))
            .fold(Reach::uniform(HAZARD_REACH_MM), |r, (x, y)| Reach {
                left: r.left.max(-x),
                right: r.right.max(x),
                below: r.below.max(-y),
                above: r.above.max(y),
            })
    }

    const fn half_spacing(&self) -> (f64, f64) {
        (self.spacing.horizontal_mm / 2.0, self.spacing.vertical_mm / 2.0)
    }

    /// Every anchor from which some catalogued footprint can touch `shape`.
    fn reach_window(&self, shape: &Polygon<f64>) -> Option<Domain> {
        let r = self.reach();
        let g = |mm: f64| mm_to_ground(mm, self.scale);
        // A footprint reaching right touches `shape` from its left side.
        kernel::expanded_bounds(shape, [g(r.right), g(r.left), g(r.above), g(r.below)])
    }

    /// Footprint of `vertex`: a hazard symbol when the vertex carries a
    /// feature, a depth label otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`FootprintError`] when no shape is catalogued for the point.
    pub fn footprint(&self, vertex: &Vertex) -> Result<Footprint, FootprintError> {
        match vertex.feature() {
            Some(feature) => self.hazard_footprint(vertex.point(), vertex.depth(), feature),
            None => self.label_footprint(vertex.point(), vertex.depth()),
        }
    }

    /// Depth label of a sounding at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`FootprintError::UnsupportedLabel`] for labels wider than
    /// three characters.
    pub fn label_footprint(&self, at: Point, depth: f64) -> Result<Footprint, FootprintError> {
        let shown = DisplayedDepth::from_depth(depth)?;
        let shape = LabelShape::for_displayed(&shown).ok_or_else(|| {
            FootprintError::UnsupportedLabel {
                displayed: shown.to_string(),
                characters: shown.characters(),
            }
        })?;
        let factor = mm_to_ground(1.0, self.scale);
        let (xs, ys) = self.half_spacing();
        let label = kernel::offset_polygon(at, &shape.label_offsets(xs, ys), factor);
        let catalogued = kernel::offset_polygon(at, shape.window_offsets(), factor);

        // The catalogued windows only cover other labels at the default
        // spacing.
        let window = match (self.reach_window(&label), kernel::bounding_domain(&catalogued)) {
            (Some(mut domain), Some(table)) => {
                domain.resize(&table.min());
                domain.resize(&table.max());
                domain.to_polygon()
            }
            _ => catalogued,
        };

        Ok(Footprint {
            window,
            label,
            displayed: Some(shown),
        })
    }

    /// Danger-to-navigation symbol at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`FootprintError::UnsupportedHazard`] when the feature class
    /// and condition have no catalogued symbol.
    pub fn hazard_footprint(
        &self,
        at: Point,
        depth: f64,
        feature: Feature,
    ) -> Result<Footprint, FootprintError> {
        let g = |mm: f64| mm_to_ground(mm, self.scale);
        let symbol = if depth > 0.0 {
            let minor = if depth < 20.0 { 3.16 } else { 3.14 };
            kernel::ellipse(at, g(4.0), g(minor))
        } else {
            match (feature.kind, feature.condition) {
                (FeatureType::Wreck, Some(5)) => kernel::triangle(
                    Point::new(at.x() - g(3.5), at.y() - g(0.5)),
                    Point::new(at.x() + g(3.0), at.y() - g(0.5)),
                    Point::new(at.x() + g(0.6), at.y() + g(3.0)),
                ),
                (FeatureType::Wreck, Some(1)) => kernel::ellipse(at, g(2.5), g(1.5)),
                (FeatureType::Wreck, Some(2)) => kernel::ellipse(at, g(2.95), g(2.05)),
                (FeatureType::Rock, Some(3)) => kernel::circle(at, g(2.01)),
                (FeatureType::Rock, _) => kernel::ellipse(at, g(2.0), g(1.625)),
                (FeatureType::Obstruction, _) => kernel::circle(at, g(2.05)),
                (kind @ FeatureType::Wreck, condition) => {
                    return Err(FootprintError::UnsupportedHazard { kind, condition });
                }
            }
        };
        let window = self.reach_window(&symbol).ok_or(FootprintError::UnsupportedHazard {
            kind: feature.kind,
            condition: feature.condition,
        })?;
        Ok(Footprint {
            window: window.to_polygon(),
            label: symbol,
            displayed: None,
        })
    }

    /// Footprints of every vertex in `vertices`, `None` where no shape is
    /// catalogued. Each such point is reported to `sink`.
    pub fn catalog(&self, vertices: &[Vertex], sink: &mut dyn DiagnosticSink) -> Vec<Option<Footprint>> {
        vertices
            .iter()
            .enumerate()
            .map(|(index, v)| match self.footprint(v) {
                Ok(fp) => Some(fp),
                Err(FootprintError::UnsupportedHazard { kind, condition }) => {
                    sink.report(Diagnostic::UnsupportedHazard {
                        index,
                        feature: format!("{kind:?} (condition {condition:?})"),
                    });
                    None
                }
                Err(FootprintError::UnsupportedLabel { characters, .. }) => {
                    sink.report(Diagnostic::UnsupportedLabel {
                        index,
                        depth: v.depth(),
                        characters,
                    });
                    None
                }
                Err(FootprintError::NonFiniteDepth { depth }) => {
                    sink.report(Diagnostic::UnsupportedLabel {
                        index,
                        depth,
                        characters: 0,
                    });
                    None
                }
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vertex::VertexBuilder;
    use crate::sounding;
    use approx::assert_relative_eq;

    fn model() -> FootprintModel {
        FootprintModel::new(20_000.0, LabelSpacing::default())
    }

    fn bbox(p: &Polygon<f64>) -> (Point, Point) {
        let d = kernel::bounding_domain(p).unwrap();
        (d.min(), d.max())
    }

    #[test]
    fn test_displayed_depth_truncation() {
        let cases = [
            (5.0, "5", 1, false),
            (5.99, "5.9", 2, true),
            (0.5, "0.5", 2, true),
            (12.0, "12", 2, false),
            (12.34, "12.3", 3, true),
            (30.99, "30.9", 3, true),
            (31.7, "31", 2, false),
            (123.9, "123", 3, false),
            (1234.0, "1234", 4, false),
            (-4.25, "4.2", 2, true),
        ];
        for (depth, text, chars, decimal) in cases {
            let shown = DisplayedDepth::from_depth(depth).unwrap();
            assert_eq!(shown.to_string(), text, "depth {depth}");
            assert_eq!(shown.characters(), chars, "depth {depth}");
            assert_eq!(shown.is_decimal(), decimal, "depth {depth}");
        }
        assert!(DisplayedDepth::from_depth(f64::NAN).is_err());
        assert!(DisplayedDepth::from_depth(2.15).unwrap().is_narrow());
    }

    #[test]
    fn test_shape_selection() {
        let shape = |d: f64| LabelShape::for_displayed(&DisplayedDepth::from_depth(d).unwrap());
        assert_eq!(shape(7.0), Some(LabelShape::Single));
        assert_eq!(shape(17.0), Some(LabelShape::Double));
        assert_eq!(shape(7.1), Some(LabelShape::DoubleDecimal { narrow: true }));
        assert_eq!(shape(17.5), Some(LabelShape::TripleDecimal { narrow: false }));
        assert_eq!(shape(170.0), Some(LabelShape::Triple));
        assert_eq!(shape(1700.0), None);
    }

    #[test]
    fn test_single_digit_label_in_ground_units() {
        // 1:20000, 1 mm = 20 m; half-spacing 0.375 mm.
        let fp = model().label_footprint(Point::new(0.0, 0.0), 5.0).unwrap();
        let (min, max) = bbox(&fp.label);
        assert_relative_eq!(min.x(), -(1.9 + 0.375) * 20.0, epsilon = 1e-9);
        assert_relative_eq!(max.x(), 0.025 * 20.0, epsilon = 1e-9);
        assert_relative_eq!(max.y(), (1.4 + 0.375) * 20.0, epsilon = 1e-9);
        assert_relative_eq!(min.y(), -(1.4 + 0.375) * 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_decimal_label_has_lowered_tenth() {
        let fp = model().label_footprint(Point::new(100.0, 100.0), 2.2).unwrap();
        assert_eq!(fp.label.exterior().0.len(), 9);
        let (min, max) = bbox(&fp.label);
        assert_relative_eq!(min.y(), 100.0 - (2.65 + 0.375) * 20.0, epsilon = 1e-9);
        assert_relative_eq!(max.x(), 100.0 + (1.9 + 0.375) * 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_window_contains_label() {
        let m = model();
        for depth in [3.0, 3.1, 3.4, 13.0, 13.1, 13.4, 130.0] {
            let fp = m.label_footprint(Point::new(0.0, 0.0), depth).unwrap();
            let (lmin, lmax) = bbox(&fp.label);
            let (wmin, wmax) = bbox(&fp.window);
            assert!(wmin.x() <= lmin.x() && wmin.y() <= lmin.y(), "depth {depth}");
            assert!(wmax.x() >= lmax.x() && wmax.y() >= lmax.y(), "depth {depth}");
        }
    }

    #[test]
    fn test_wider_spacing_grows_window() {
        let wide = FootprintModel::new(
            20_000.0,
            LabelSpacing {
                horizontal_mm: 2.75,
                vertical_mm: 0.75,
            },
        );
        let narrow_fp = model().label_footprint(Point::new(0.0, 0.0), 5.0).unwrap();
        let wide_fp = wide.label_footprint(Point::new(0.0, 0.0), 5.0).unwrap();
        let (_, nmax) = bbox(&narrow_fp.window);
        let (_, wmax) = bbox(&wide_fp.window);
        // Default spacing: the catalogued window is the wider one.
        assert_relative_eq!(nmax.x(), 4.57 * 20.0, epsilon = 1e-9);
        // A three-digit label reaches 4.15 mm plus half-spacing to the left.
        assert_relative_eq!(wmax.x(), (0.025 + 4.15 + 1.375) * 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reach_covers_labels_and_symbols() {
        let r = model().reach();
        assert_relative_eq!(r.left, 4.15 + 0.375, epsilon = 1e-12);
        assert_relative_eq!(r.right, HAZARD_REACH_MM, epsilon = 1e-12);
        assert_relative_eq!(r.below, HAZARD_REACH_MM, epsilon = 1e-12);
        assert_relative_eq!(r.above, HAZARD_REACH_MM, epsilon = 1e-12);
    }

    #[test]
    fn test_hazard_window_reaches_wide_labels() {
        // The three-digit label 120 m east of the rock reaches back over it.
        let rock = VertexBuilder::default()
            .point(Point::new(0.0, 0.0))
            .depth(0.0)
            .feature(Feature::new(FeatureType::Rock, Some(3)))
            .build()
            .unwrap();
        let deep = sounding!(120.0, 0.0, 123.0);
        let m = model();
        let (fr, fd) = (m.footprint(&rock).unwrap(), m.footprint(&deep).unwrap());
        assert!(kernel::polygons_intersect(&fr.label, &fd.label));
        assert!(kernel::point_in_polygon(&deep.point(), &fr.window));
        assert!(kernel::point_in_polygon(&rock.point(), &fd.window));
    }

    #[test]
    fn test_label_window_reaches_largest_symbol() {
        // Wreck of known depth: a 4 mm by 3.16 mm ellipse.
        let wreck = VertexBuilder::default()
            .point(Point::new(-124.5, 0.0))
            .depth(12.0)
            .feature(Feature::new(FeatureType::Wreck, None))
            .build()
            .unwrap();
        let shoal = sounding!(0.0, 0.0, 5.0);
        let m = model();
        let (fw, fs) = (m.footprint(&wreck).unwrap(), m.footprint(&shoal).unwrap());
        assert!(kernel::polygons_intersect(&fw.label, &fs.label));
        assert!(kernel::point_in_polygon(&wreck.point(), &fs.window));
    }

    #[test]
    fn test_unsupported_label() {
        let err = model().footprint(&sounding!(0.0, 0.0, 4321.0)).unwrap_err();
        assert_eq!(
            err,
            FootprintError::UnsupportedLabel {
                displayed: "4321".to_string(),
                characters: 4
            }
        );
    }

    #[test]
    fn test_hazard_symbols() {
        let hazard = |kind, condition, depth| {
            VertexBuilder::default()
                .point(Point::new(0.0, 0.0))
                .depth(depth)
                .feature(Feature::new(kind, condition))
                .build()
                .unwrap()
        };
        let m = model();

        let rock = m.footprint(&hazard(FeatureType::Rock, Some(3), 0.0)).unwrap();
        let (_, max) = bbox(&rock.label);
        assert_relative_eq!(max.x(), 2.01 * 20.0, epsilon = 1e-9);
        let (_, wmax) = bbox(&rock.window);
        assert_relative_eq!(wmax.x(), (2.01 + 4.15 + 0.375) * 20.0, epsilon = 1e-9);
        assert!(rock.displayed.is_none());

        let known_depth = m.footprint(&hazard(FeatureType::Wreck, None, 12.0)).unwrap();
        let (_, max) = bbox(&known_depth.label);
        assert_relative_eq!(max.x(), 4.0 * 20.0, epsilon = 1e-9);

        let exposed = m.footprint(&hazard(FeatureType::Wreck, Some(5), 0.0)).unwrap();
        assert_eq!(exposed.label.exterior().0.len(), 4);

        let unknown = m.footprint(&hazard(FeatureType::Wreck, Some(4), 0.0));
        assert_eq!(
            unknown,
            Err(FootprintError::UnsupportedHazard {
                kind: FeatureType::Wreck,
                condition: Some(4)
            })
        );
    }

    #[test]
    fn test_catalog_reports_unsupported_points() {
        let vertices = vec![sounding!(0.0, 0.0, 5.0), sounding!(1.0, 0.0, 4321.0)];
        let mut sink = crate::core::diagnostics::CollectingSink::default();
        let catalog = model().catalog(&vertices, &mut sink);
        assert!(catalog[0].is_some());
        assert!(catalog[1].is_none());
        assert_eq!(
            sink.diagnostics(),
            &[Diagnostic::UnsupportedLabel {
                index: 1,
                depth: 4321.0,
                characters: 4
            }]
        );
    }
}
