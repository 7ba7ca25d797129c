//! Axis-aligned bounding rectangles with exact boundary semantics.
//!
//! A [`Domain`] is the cell shape of the PR-quadtree. Two containment rules
//! coexist and must not be confused:
//!
//! - [`Domain::contains_point_halfopen`] is the ownership rule. On each axis a
//!   coordinate belongs to `[min, max)`, except when `max` equals the global
//!   maximum of the whole index, where the interval is closed. Every point of
//!   the global domain is owned by exactly one quadrant at every level.
//! - [`Domain::contains_strict`] treats both boundaries as closed and is used
//!   to grow a domain around a set of points with [`Domain::resize`].
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::geometry::domain::Domain;
//! use sounding_selection::geometry::point::Point;
//!
//! let global = Domain::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
//! let [ne, nw, sw, se] = global.quadrants();
//!
//! // The centroid lies on both split lines; NE owns it.
//! let c = global.centroid();
//! assert!(ne.contains_point_halfopen(&c, &global));
//! assert!(!nw.contains_point_halfopen(&c, &global));
//! assert!(!sw.contains_point_halfopen(&c, &global));
//! assert!(!se.contains_point_halfopen(&c, &global));
//! ```

#![forbid(unsafe_code)]

use super::point::Point;
use serde::{Deserialize, Serialize};

// =============================================================================
// DOMAIN
// =============================================================================

/// Axis-aligned rectangle `[min, max]`.
///
/// Invariant: `min.x ≤ max.x` and `min.y ≤ max.y`. A domain only grows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    min: Point,
    max: Point,
}

impl Domain {
    /// Creates a domain from its corners, reordering coordinates so that the
    /// invariant holds.
    #[must_use]
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x().min(b.x()), a.y().min(b.y())),
            max: Point::new(a.x().max(b.x()), a.y().max(b.y())),
        }
    }

    /// Degenerate domain covering a single point.
    #[must_use]
    pub const fn from_point(p: Point) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest domain enclosing all `points`, or `None` when empty.
    pub fn enclosing<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let mut domain = Self::from_point(*iter.next()?);
        for p in iter {
            domain.resize(p);
        }
        Some(domain)
    }

    /// Lower-left corner.
    #[must_use]
    pub const fn min(&self) -> Point {
        self.min
    }

    /// Upper-right corner.
    #[must_use]
    pub const fn max(&self) -> Point {
        self.max
    }

    /// Extent along x.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x() - self.min.x()
    }

    /// Extent along y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y() - self.min.y()
    }

    /// Midpoint of the rectangle; the split point of a quadtree cell.
    #[must_use]
    pub fn centroid(&self) -> Point {
        Point::new(
            (self.min.x() + self.max.x()) / 2.0,
            (self.min.y() + self.max.y()) / 2.0,
        )
    }

    /// Ownership test relative to the `global` domain of the index.
    ///
    /// A coordinate is inside `[min, max)` on each axis, or `[min, max]` on an
    /// axis where `max` coincides with the global maximum.
    #[must_use]
    pub fn contains_point_halfopen(&self, p: &Point, global: &Self) -> bool {
        (0..2).all(|axis| {
            let c = p.coord(axis);
            let lo = self.min.coord(axis);
            let hi = self.max.coord(axis);
            if hi == global.max.coord(axis) {
                lo <= c && c <= hi
            } else {
                lo <= c && c < hi
            }
        })
    }

    /// Closed containment test, both boundaries inclusive.
    #[must_use]
    pub fn contains_strict(&self, p: &Point) -> bool {
        self.min.x() <= p.x() && p.x() <= self.max.x() && self.min.y() <= p.y() && p.y() <= self.max.y()
    }

    /// Grows the domain so that it contains `p`. Never shrinks.
    pub fn resize(&mut self, p: &Point) {
        if self.contains_strict(p) {
            return;
        }
        self.min = Point::new(self.min.x().min(p.x()), self.min.y().min(p.y()));
        self.max = Point::new(self.max.x().max(p.x()), self.max.y().max(p.y()));
    }

    /// Returns `true` when the closed rectangles overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x() <= other.max.x()
            && other.min.x() <= self.max.x()
            && self.min.y() <= other.max.y()
            && other.min.y() <= self.max.y()
    }

    /// Returns `true` when every point of `other` lies in this domain's
    /// ownership region (half-open relative to `global`).
    ///
    /// Used by the region-query shortcut: if a child owns the whole query
    /// box, no sibling can own a point inside it.
    #[must_use]
    pub fn owns_box(&self, other: &Self, global: &Self) -> bool {
        (0..2).all(|axis| {
            let lo = self.min.coord(axis);
            let hi = self.max.coord(axis);
            let qlo = other.min.coord(axis);
            let qhi = other.max.coord(axis);
            if hi == global.max.coord(axis) {
                lo <= qlo && qhi <= hi
            } else {
                lo <= qlo && qhi < hi
            }
        })
    }

    /// Splits the domain at its centroid into `[NE, NW, SW, SE]`.
    #[must_use]
    pub fn quadrants(&self) -> [Self; 4] {
        let c = self.centroid();
        [
            Self::new(c, self.max),
            Self::new(
                Point::new(self.min.x(), c.y()),
                Point::new(c.x(), self.max.y()),
            ),
            Self::new(self.min, c),
            Self::new(
                Point::new(c.x(), self.min.y()),
                Point::new(self.max.x(), c.y()),
            ),
        ]
    }

    /// Polygon covering the closed rectangle.
    #[must_use]
    pub fn to_polygon(&self) -> geo::Polygon<f64> {
        geo::Rect::new(self.min.to_coord(), self.max.to_coord()).to_polygon()
    }

    /// Returns `true` when the closed rectangle intersects `polygon`.
    #[must_use]
    pub fn intersects(&self, polygon: &geo::Polygon<f64>) -> bool {
        use geo::Intersects;
        geo::Rect::new(self.min.to_coord(), self.max.to_coord()).intersects(polygon)
    }

    /// Returns `true` when `polygon` lies inside this domain's ownership
    /// region relative to `global`.
    #[must_use]
    pub fn contains(&self, polygon: &geo::Polygon<f64>, global: &Self) -> bool {
        crate::geometry::kernel::bounding_domain(polygon)
            .is_some_and(|bbox| self.owns_box(&bbox, global))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Domain {
        Domain::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0))
    }

    #[test]
    fn test_new_reorders_corners() {
        let d = Domain::new(Point::new(5.0, -1.0), Point::new(-5.0, 1.0));
        assert_eq!(d.min(), Point::new(-5.0, -1.0));
        assert_eq!(d.max(), Point::new(5.0, 1.0));
        assert_relative_eq!(d.width(), 10.0);
        assert_relative_eq!(d.height(), 2.0);
    }

    #[test]
    fn test_every_point_has_exactly_one_owning_quadrant() {
        let global = unit_square();
        let quads = global.quadrants();
        let samples = [
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 5.0),
            Point::new(5.0, 10.0),
            Point::new(2.5, 7.5),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ];
        for p in &samples {
            let owners = quads
                .iter()
                .filter(|q| q.contains_point_halfopen(p, &global))
                .count();
            assert_eq!(owners, 1, "point {p} owned by {owners} quadrants");
        }
    }

    #[test]
    fn test_halfopen_excludes_internal_max() {
        let global = unit_square();
        let [_, _, sw, _] = global.quadrants();
        assert!(sw.contains_point_halfopen(&Point::new(4.999, 4.999), &global));
        assert!(!sw.contains_point_halfopen(&Point::new(5.0, 1.0), &global));
        assert!(sw.contains_strict(&Point::new(5.0, 1.0)));
    }

    #[test]
    fn test_resize_grows_monotonically() {
        let mut d = Domain::from_point(Point::new(1.0, 1.0));
        d.resize(&Point::new(3.0, -2.0));
        d.resize(&Point::new(2.0, 0.0));
        assert_eq!(d.min(), Point::new(1.0, -2.0));
        assert_eq!(d.max(), Point::new(3.0, 1.0));

        let enclosing =
            Domain::enclosing(&[Point::new(1.0, 1.0), Point::new(3.0, -2.0)]).unwrap();
        assert_eq!(enclosing, d);
        assert!(Domain::enclosing(std::iter::empty::<&Point>()).is_none());
    }

    #[test]
    fn test_owns_box_respects_split_line() {
        let global = unit_square();
        let [ne, _, sw, _] = global.quadrants();
        let on_split = Domain::new(Point::new(1.0, 1.0), Point::new(5.0, 2.0));
        assert!(!sw.owns_box(&on_split, &global));
        let inside = Domain::new(Point::new(1.0, 1.0), Point::new(4.0, 2.0));
        assert!(sw.owns_box(&inside, &global));
        let touching_global = Domain::new(Point::new(6.0, 6.0), Point::new(10.0, 10.0));
        assert!(ne.owns_box(&touching_global, &global));
    }

    #[test]
    fn test_polygon_intersection_and_containment() {
        let global = unit_square();
        let [ne, nw, ..] = global.quadrants();
        let tri = geo::Polygon::new(
            geo::LineString::from(vec![(6.0, 6.0), (8.0, 6.0), (7.0, 8.0), (6.0, 6.0)]),
            vec![],
        );
        assert!(ne.intersects(&tri));
        assert!(!nw.intersects(&tri));
        assert!(ne.contains(&tri, &global));
        assert!(!global.quadrants()[2].contains(&tri, &global));
    }
}
