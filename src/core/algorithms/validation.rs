//! Legibility and safety checks of a selection.
//!
//! # Legibility
//!
//! Two selected points violate legibility when their printed labels
//! overlap. Each overlapping pair is reported once.
//!
//! # Safety
//!
//! The surface triangulated from the selection must never show water deeper
//! than the source data. Two methods are available:
//!
//! - [`SafetyMethod::Direct`]: inside each triangle, the shallowest source
//!   point must not be shallower than the triangle's shallowest corner. For
//!   a flat triangle (all corners at one depth) with depth areas supplied,
//!   the point is instead compared with the minimum depth of the depth area
//!   enclosing it.
//! - [`SafetyMethod::Surface`]: the depth interpolated at each source point
//!   inside a triangle must not exceed the measured depth by more than the
//!   vertical tolerance of the triangle's worst accuracy category. The
//!   worst offender of each triangle is reported.
//!
//! Triangles touching a boundary vertex at the sentinel depth are never
//! assessed.

#![forbid(unsafe_code)]

use crate::cartography::accuracy::{depth_tolerance, worst_category};
use crate::cartography::footprint::Footprint;
use crate::core::collections::{FastHashSet, fast_hash_set_with_capacity};
use crate::core::mesh::Mesh;
use crate::core::point_set::VertexStore;
use crate::core::quadtree::PrQuadtree;
use crate::core::vertex::Vertex;
use crate::geometry::kernel;
use geo::Polygon;
use serde::{Deserialize, Serialize};

// =============================================================================
// TYPES
// =============================================================================

/// Safety validation method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SafetyMethod {
    /// Shallowest point inside each triangle against its corners.
    #[default]
    Direct,
    /// Interpolated against measured depth, within accuracy tolerance.
    Surface,
}

/// A charted depth area: inside `polygon` the depth is at least `min_depth`.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthArea {
    /// Area outline.
    pub polygon: Polygon<f64>,
    /// Minimum depth of the area.
    pub min_depth: f64,
}

/// A source point that the selection surface misrepresents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafetyViolation {
    /// Index of the source point.
    pub source: usize,
    /// Mesh triangle in which it was found.
    pub triangle: usize,
    /// Depth of the source point.
    pub depth: f64,
}

/// Two selected points whose labels overlap, `first < second`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelConflict {
    /// Lower index.
    pub first: usize,
    /// Higher index.
    pub second: usize,
}

impl LabelConflict {
    /// Conflict between `a` and `b` in canonical order.
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            first: a.min(b),
            second: a.max(b),
        }
    }
}

// =============================================================================
// LEGIBILITY
// =============================================================================

/// Overlapping label pairs among the points of `store`.
///
/// `tree` must index `store` and `footprints` must hold one entry per
/// vertex; points without a footprint are skipped.
///
/// # Examples
///
/// ```rust
/// use sounding_selection::core::algorithms::validation::{legibility_violations, LabelConflict};
/// use sounding_selection::cartography::footprint::{FootprintModel, LabelSpacing};
/// use sounding_selection::core::diagnostics::CollectingSink;
/// use sounding_selection::core::point_set::{PointSet, VertexStore};
/// use sounding_selection::core::quadtree::PrQuadtree;
/// use sounding_selection::sounding;
///
/// let points: PointSet = vec![sounding!(0.0, 0.0, 3.0), sounding!(5.0, 5.0, 4.0)].into();
/// let (tree, _) = PrQuadtree::build(&points, 0..2, 4).unwrap();
/// let model = FootprintModel::new(20_000.0, LabelSpacing::default());
/// let footprints = model.catalog(points.vertices(), &mut CollectingSink::default());
///
/// let conflicts = legibility_violations(&points, &tree, &footprints);
/// assert_eq!(conflicts, vec![LabelConflict::new(1, 0)]);
/// ```
#[must_use]
pub fn legibility_violations<S>(
    store: &S,
    tree: &PrQuadtree,
    footprints: &[Option<Footprint>],
) -> Vec<LabelConflict>
where
    S: VertexStore + ?Sized,
{
    let mut conflicts: FastHashSet<LabelConflict> = FastHashSet::default();
    for (i, fi) in footprints.iter().enumerate() {
        let Some(fi) = fi else { continue };
        for j in tree.points_in_polygon(&fi.window, store) {
            if j == i {
                continue;
            }
            let Some(Some(fj)) = footprints.get(j) else {
                continue;
            };
            if kernel::polygons_intersect(&fi.label, &fj.label) {
                conflicts.insert(LabelConflict::new(i, j));
            }
        }
    }
    let mut conflicts: Vec<LabelConflict> = conflicts.into_iter().collect();
    conflicts.sort_unstable();
    conflicts
}

/// Every point involved in at least one conflict, ascending.
#[must_use]
pub fn conflicting_points(conflicts: &[LabelConflict]) -> Vec<usize> {
    let mut points: Vec<usize> = conflicts
        .iter()
        .flat_map(|c| [c.first, c.second])
        .collect();
    points.sort_unstable();
    points.dedup();
    points
}

// =============================================================================
// SAFETY
// =============================================================================

/// Source points misrepresented by the surface of `mesh`.
///
/// `source_tree` must index `source`. Violations are returned in triangle
/// order, each source point at most once.
#[must_use]
pub fn safety_violations<S>(
    method: SafetyMethod,
    mesh: &Mesh,
    source: &S,
    source_tree: &PrQuadtree,
    areas: &[DepthArea],
) -> Vec<SafetyViolation>
where
    S: VertexStore + ?Sized,
{
    let mut seen = fast_hash_set_with_capacity(mesh.triangle_count());
    let mut violations = Vec::new();
    for t in 0..mesh.triangle_count() {
        let Some(corners) = mesh.triangle_vertices(t) else {
            continue;
        };
        if corners.iter().any(|v| v.is_sentinel()) {
            continue;
        }
        let Some(polygon) = mesh.triangle_polygon(t) else {
            continue;
        };
        let inside = source_tree.points_in_polygon(&polygon, source);
        let found = match method {
            SafetyMethod::Direct => direct_check(corners, &inside, source.vertices(), areas),
            SafetyMethod::Surface => surface_check(corners, &inside, source.vertices()),
        };
        if let Some(s) = found {
            if seen.insert(s) {
                violations.push(SafetyViolation {
                    source: s,
                    triangle: t,
                    depth: source.vertices()[s].depth(),
                });
            }
        }
    }
    tracing::debug!(
        method = ?method,
        triangles = mesh.triangle_count(),
        violations = violations.len(),
        "safety validation finished"
    );
    violations
}

fn direct_check(
    corners: [&Vertex; 3],
    inside: &[usize],
    vertices: &[Vertex],
    areas: &[DepthArea],
) -> Option<usize> {
    let shallowest = inside.iter().copied().min_by(|&a, &b| {
        vertices[a]
            .depth()
            .total_cmp(&vertices[b].depth())
            .then(a.cmp(&b))
    })?;
    let candidate = &vertices[shallowest];
    let floor = corners
        .iter()
        .map(|v| v.depth())
        .fold(f64::INFINITY, f64::min);
    if candidate.depth() >= floor {
        return None;
    }

    let flat = corners.iter().all(|v| v.depth() == corners[0].depth());
    if flat && !areas.is_empty() {
        let area = areas
            .iter()
            .find(|a| kernel::point_in_polygon(&candidate.point(), &a.polygon))?;
        return (candidate.depth() < area.min_depth).then_some(shallowest);
    }
    Some(shallowest)
}

fn surface_check(corners: [&Vertex; 3], inside: &[usize], vertices: &[Vertex]) -> Option<usize> {
    let category = worst_category(corners.iter().map(|v| v.quality()));
    depth_tolerance(category, 0.0)?;
    let [a, b, c] = corners.map(Vertex::point);

    let mut worst: Option<(f64, usize)> = None;
    for &i in inside {
        let v = &vertices[i];
        let p = v.point();
        if p == a || p == b || p == c {
            continue;
        }
        let Some(w) = kernel::barycentric(&p, &a, &b, &c) else {
            continue;
        };
        let interpolated = w[0].mul_add(
            corners[0].depth(),
            w[1].mul_add(corners[1].depth(), w[2] * corners[2].depth()),
        );
        let excess = interpolated - v.depth();
        let Some(tolerance) = depth_tolerance(category, v.depth()) else {
            continue;
        };
        if excess > tolerance && worst.is_none_or(|(e, _)| excess > e) {
            worst = Some((excess, i));
        }
    }
    worst.map(|(_, i)| i)
}

// =============================================================================
// TESTS
// =============================================================================
