//! Geometry kernel adapter over the [`geo`] crate.
//!
//! The selection pipeline needs a handful of planar predicates and
//! constructors: point-in-polygon, polygon/polygon intersection, bounding
//! boxes, representative interior points, barycentric weights and simple
//! shape builders (offset polygons, ellipses, triangles). Everything that
//! touches `geo` lives here so the rest of the crate works with
//! [`Point`] and [`Domain`].
//!
//! All predicates treat polygon boundaries as part of the polygon: a point on
//! an edge is inside, two labels that touch along an edge overlap.
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::geometry::kernel;
//! use sounding_selection::geometry::point::Point;
//!
//! let tri = kernel::triangle(Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0));
//! assert!(kernel::point_in_polygon(&Point::new(1.0, 1.0), &tri));
//! assert!(kernel::point_in_polygon(&Point::new(2.0, 2.0), &tri)); // on the hypotenuse
//! assert!(!kernel::point_in_polygon(&Point::new(3.0, 3.0), &tri));
//! ```

#![forbid(unsafe_code)]

use super::{domain::Domain, point::Point};
use geo::{BoundingRect, InteriorPoint, Intersects, LineString, Polygon};
use std::f64::consts::TAU;
use std::fmt::Write as _;

/// Number of segments used to approximate ellipses and circles.
pub const ELLIPSE_SEGMENTS: usize = 64;

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Closed polygon with `offsets` applied to `origin`, each offset multiplied
/// by `factor`.
///
/// `offsets` is an open ring; the closing vertex is added here.
#[must_use]
pub fn offset_polygon(origin: Point, offsets: &[(f64, f64)], factor: f64) -> Polygon<f64> {
    let ring: Vec<(f64, f64)> = offsets
        .iter()
        .map(|&(dx, dy)| (dx.mul_add(factor, origin.x()), dy.mul_add(factor, origin.y())))
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}

/// Triangle `a, b, c`.
#[must_use]
pub fn triangle(a: Point, b: Point, c: Point) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![a.to_coord(), b.to_coord(), c.to_coord()]),
        vec![],
    )
}

/// Axis-aligned ellipse centred at `center` with semi-axes `a` (x) and `b` (y).
#[must_use]
pub fn ellipse(center: Point, a: f64, b: f64) -> Polygon<f64> {
    #[allow(clippy::cast_precision_loss)]
    let step = TAU / ELLIPSE_SEGMENTS as f64;
    let ring: Vec<(f64, f64)> = (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let theta = step * i as f64;
            (
                a.mul_add(theta.cos(), center.x()),
                b.mul_add(theta.sin(), center.y()),
            )
        })
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}

/// Circle of radius `r` centred at `center`.
#[must_use]
pub fn circle(center: Point, r: f64) -> Polygon<f64> {
    ellipse(center, r, r)
}

/// Axis-aligned square of half-side `half` centred at `center`.
#[must_use]
pub fn square(center: Point, half: f64) -> Polygon<f64> {
    Domain::new(
        Point::new(center.x() - half, center.y() - half),
        Point::new(center.x() + half, center.y() + half),
    )
    .to_polygon()
}

/// Bounding box of `polygon` grown by `[left, right, below, above]`.
///
/// Conservative stand-in for buffering: with equal margins the result
/// contains the uniformly buffered shape.
#[must_use]
pub fn expanded_bounds(polygon: &Polygon<f64>, margins: [f64; 4]) -> Option<Domain> {
    let [left, right, below, above] = margins;
    let bbox = bounding_domain(polygon)?;
    Some(Domain::new(
        Point::new(bbox.min().x() - left, bbox.min().y() - below),
        Point::new(bbox.max().x() + right, bbox.max().y() + above),
    ))
}

// =============================================================================
// PREDICATES
// =============================================================================

/// Returns `true` when `p` lies inside or on the boundary of `polygon`.
#[must_use]
pub fn point_in_polygon(p: &Point, polygon: &Polygon<f64>) -> bool {
    p.to_geo().intersects(polygon)
}

/// Returns `true` when the two polygons share at least one point.
#[must_use]
pub fn polygons_intersect(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    a.intersects(b)
}

/// Bounding box of `polygon`, or `None` for an empty polygon.
#[must_use]
pub fn bounding_domain(polygon: &Polygon<f64>) -> Option<Domain> {
    polygon
        .bounding_rect()
        .map(|r| Domain::new(Point::from(r.min()), Point::from(r.max())))
}

/// A point guaranteed to lie inside `polygon`, used as a hole marker.
#[must_use]
pub fn representative_point(polygon: &Polygon<f64>) -> Option<Point> {
    polygon
        .interior_point()
        .map(|p| Point::new(p.x(), p.y()))
}

/// Barycentric weights of `p` relative to the triangle `a, b, c`.
///
/// Returns `None` for a degenerate (zero-area) triangle.
#[must_use]
pub fn barycentric(p: &Point, a: &Point, b: &Point, c: &Point) -> Option<[f64; 3]> {
    let det = (b.y() - c.y()).mul_add(a.x() - c.x(), (c.x() - b.x()) * (a.y() - c.y()));
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let w0 = (b.y() - c.y()).mul_add(p.x() - c.x(), (c.x() - b.x()) * (p.y() - c.y())) / det;
    let w1 = (c.y() - a.y()).mul_add(p.x() - c.x(), (a.x() - c.x()) * (p.y() - c.y())) / det;
    Some([w0, w1, 1.0 - w0 - w1])
}

// =============================================================================
// WKT OUTPUT
// =============================================================================

/// Single-line WKT `POLYGON` text for the exterior ring of `polygon`.
#[must_use]
pub fn polygon_to_wkt(polygon: &Polygon<f64>) -> String {
    let mut out = String::from("POLYGON ((");
    let ring = polygon.exterior();
    for (i, c) in ring.coords().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{} {}", c.x, c.y);
    }
    out.push_str("))");
    out
}

// =============================================================================
// TESTS
// =============================================================================
