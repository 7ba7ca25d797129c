//! Triangulation oracle.
//!
//! The pipeline treats triangulation as an external, fallible service:
//! given points, optional boundary segments and hole markers, it returns a
//! vertex list and index triples. [`Triangulator`] is that contract and
//! [`SpadeTriangulator`] implements it with a constrained Delaunay
//! triangulation from [`spade`].
//!
//! With boundary segments present the result behaves like a planar
//! straight-line graph triangulation: every segment is a mesh edge, and
//! triangles outside the outer boundary or inside a hole are discarded.
//! Without segments the result is the plain Delaunay triangulation.
//!
//! [`triangulate_with_retry`] wraps any oracle with a bounded retry, and
//! [`mesh_from_triangulation`] maps oracle output back onto soundings.
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::core::triangulation::{SpadeTriangulator, TriangulationInput, Triangulator};
//! use sounding_selection::geometry::point::Point;
//!
//! let input = TriangulationInput::unconstrained(vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 0.0),
//!     Point::new(0.0, 1.0),
//!     Point::new(1.0, 1.0),
//! ]);
//! let raw = SpadeTriangulator.triangulate(&input).unwrap();
//! assert_eq!(raw.vertices.len(), 4);
//! assert_eq!(raw.triangles.len(), 2);
//! ```

#![forbid(unsafe_code)]

use crate::core::collections::{FastHashMap, fast_hash_map_with_capacity};
use crate::core::diagnostics::{Diagnostic, DiagnosticSink};
use crate::core::mesh::{Mesh, MeshError};
use crate::core::vertex::{SENTINEL_DEPTH, Vertex};
use crate::geometry::{kernel, point::Point};
use geo::Polygon;
use spade::handles::FixedFaceHandle;
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation as _};
use thiserror::Error;

/// Default number of oracle attempts.
pub const DEFAULT_ATTEMPTS: usize = 5;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by a triangulation oracle.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TriangulationError {
    /// The oracle failed for a reason that may not recur.
    #[error("Triangulation oracle failed: {message}")]
    Oracle {
        /// Oracle message.
        message: String,
    },
    /// A point cannot be triangulated (non-finite or out of range).
    #[error("Point {index} at {point} cannot be triangulated: {message}")]
    InvalidPoint {
        /// Input index.
        index: usize,
        /// The point.
        point: Point,
        /// Oracle message.
        message: String,
    },
    /// A segment refers to a missing point.
    #[error("Segment {segment} refers to point {index}, but the input has {len} points")]
    SegmentOutOfRange {
        /// Segment position.
        segment: usize,
        /// Offending point index.
        index: usize,
        /// Number of input points.
        len: usize,
    },
    /// A segment crosses a segment added before it.
    #[error("Segment {segment} ({from} -> {to}) crosses an earlier segment")]
    ConflictingSegment {
        /// Segment position.
        segment: usize,
        /// Start point index.
        from: usize,
        /// End point index.
        to: usize,
    },
    /// Every attempt failed.
    #[error("Triangulation failed after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made.
        attempts: usize,
        /// The last failure.
        #[source]
        source: Box<TriangulationError>,
    },
}

impl TriangulationError {
    /// Returns `true` for failures worth another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Oracle { .. })
    }
}

// =============================================================================
// ORACLE CONTRACT
// =============================================================================

/// Oracle input: points, boundary segments as index pairs into `points`,
/// and one marker point inside each hole.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangulationInput {
    /// Points to triangulate.
    pub points: Vec<Point>,
    /// Segments that must appear as mesh edges.
    pub segments: Vec<[usize; 2]>,
    /// Points inside regions to leave untriangulated.
    pub holes: Vec<Point>,
}

impl TriangulationInput {
    /// Plain Delaunay input.
    #[must_use]
    pub const fn unconstrained(points: Vec<Point>) -> Self {
        Self {
            points,
            segments: Vec::new(),
            holes: Vec::new(),
        }
    }

    /// Boundary vertices first, then `points`, with the boundary's segments
    /// and holes.
    #[must_use]
    pub fn constrained(boundary: &Boundary, points: impl IntoIterator<Item = Point>) -> Self {
        let mut all: Vec<Point> = boundary.vertices.iter().map(Vertex::point).collect();
        all.extend(points);
        Self {
            points: all,
            segments: boundary.segments.clone(),
            holes: boundary.holes.clone(),
        }
    }

    /// Returns `true` when boundary segments are present.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        !self.segments.is_empty()
    }
}

/// Oracle output: vertex positions and index triples into them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTriangulation {
    /// Output vertices; may merge coincident inputs or add Steiner points.
    pub vertices: Vec<Point>,
    /// Triangles as vertex index triples.
    pub triangles: Vec<[usize; 3]>,
}

/// A triangulation oracle.
pub trait Triangulator {
    /// Triangulates `input`.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError`] when the oracle cannot produce a
    /// triangulation.
    fn triangulate(&self, input: &TriangulationInput) -> Result<RawTriangulation, TriangulationError>;
}

/// Runs `oracle` up to `attempts` times, reporting each retryable failure to
/// `sink`. Non-retryable errors are returned immediately.
///
/// # Errors
///
/// Returns [`TriangulationError::RetriesExhausted`] wrapping the last
/// failure when every attempt failed.
pub fn triangulate_with_retry<T>(
    oracle: &T,
    input: &TriangulationInput,
    attempts: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<RawTriangulation, TriangulationError>
where
    T: Triangulator + ?Sized,
{
    let attempts = attempts.max(1);
    let mut last = None;
    for attempt in 1..=attempts {
        match oracle.triangulate(input) {
            Ok(raw) => return Ok(raw),
            Err(err) if err.is_retryable() => {
                sink.report(Diagnostic::TriangulationRetry {
                    attempt,
                    message: err.to_string(),
                });
                last = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(TriangulationError::RetriesExhausted {
        attempts,
        source: Box::new(last.unwrap_or(TriangulationError::Oracle {
            message: "no attempt was made".to_string(),
        })),
    })
}

// =============================================================================
// SPADE ORACLE
// =============================================================================

type Cdt = ConstrainedDelaunayTriangulation<Point2<f64>>;

/// Constrained Delaunay oracle backed by `spade`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpadeTriangulator;

impl Triangulator for SpadeTriangulator {
    fn triangulate(&self, input: &TriangulationInput) -> Result<RawTriangulation, TriangulationError> {
        let mut cdt = Cdt::new();
        let mut handles = Vec::with_capacity(input.points.len());
        for (index, p) in input.points.iter().enumerate() {
            let handle = cdt
                .insert(Point2::new(p.x(), p.y()))
                .map_err(|e| TriangulationError::InvalidPoint {
                    index,
                    point: *p,
                    message: format!("{e:?}"),
                })?;
            handles.push(handle);
        }

        for (segment, &[from, to]) in input.segments.iter().enumerate() {
            let lookup = |index: usize| {
                handles
                    .get(index)
                    .copied()
                    .ok_or(TriangulationError::SegmentOutOfRange {
                        segment,
                        index,
                        len: handles.len(),
                    })
            };
            let (a, b) = (lookup(from)?, lookup(to)?);
            if a == b {
                continue;
            }
            if !cdt.can_add_constraint(a, b) {
                return Err(TriangulationError::ConflictingSegment { segment, from, to });
            }
            cdt.add_constraint(a, b);
        }

        let discarded = if input.is_constrained() {
            discarded_faces(&cdt, &input.holes)
        } else {
            vec![false; cdt.num_all_faces()]
        };

        let vertices = cdt
            .vertices()
            .map(|v| Point::new(v.position().x, v.position().y))
            .collect();
        let triangles = cdt
            .inner_faces()
            .filter(|f| !discarded[f.fix().index()])
            .map(|f| f.vertices().map(|v| v.fix().index()))
            .collect();
        Ok(RawTriangulation {
            vertices,
            triangles,
        })
    }
}

/// Faces outside the constrained boundary or inside a hole, by face index.
fn discarded_faces(cdt: &Cdt, holes: &[Point]) -> Vec<bool> {
    let mut discarded = vec![false; cdt.num_all_faces()];
    let mut stack: Vec<FixedFaceHandle<spade::handles::InnerTag>> = Vec::new();

    // Seeds: faces reached from the hull across an unconstrained edge.
    for face in cdt.inner_faces() {
        let touches_open_hull = face.adjacent_edges().iter().any(|edge| {
            edge.rev().face().is_outer() && !cdt.is_constraint_edge(edge.as_undirected().fix())
        });
        if touches_open_hull {
            stack.push(face.fix());
        }
    }

    for hole in holes {
        let containing = cdt.inner_faces().find(|face| {
            let [a, b, c] = face.positions().map(|p| Point::new(p.x, p.y));
            kernel::barycentric(hole, &a, &b, &c).is_some_and(|w| w.iter().all(|&x| x >= 0.0))
        });
        if let Some(face) = containing {
            stack.push(face.fix());
        }
    }

    while let Some(fixed) = stack.pop() {
        if discarded[fixed.index()] {
            continue;
        }
        discarded[fixed.index()] = true;
        for edge in cdt.face(fixed).adjacent_edges() {
            if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                continue;
            }
            if let Some(neighbour) = edge.rev().face().as_inner() {
                if !discarded[neighbour.fix().index()] {
                    stack.push(neighbour.fix());
                }
            }
        }
    }
    discarded
}

// =============================================================================
// BOUNDARY
// =============================================================================

/// Coverage boundary constraining the triangulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Boundary {
    /// Ring vertices, sentinel depth unless known.
    pub vertices: Vec<Vertex>,
    /// Closed-ring segments as index pairs into `vertices`.
    pub segments: Vec<[usize; 2]>,
    /// One interior point per interior ring.
    pub holes: Vec<Point>,
}

impl Boundary {
    /// Boundary of the union of `polygons`, given as disjoint parts.
    ///
    /// Every ring (exterior and interior) contributes its vertices, with the
    /// closing duplicate dropped, and segments joining consecutive vertices
    /// and the last back to the first. Each interior ring contributes a hole
    /// marker.
    #[must_use]
    pub fn from_polygons(polygons: &[Polygon<f64>]) -> Self {
        let mut boundary = Self::default();
        for polygon in polygons {
            boundary.push_ring(polygon.exterior());
            for interior in polygon.interiors() {
                boundary.push_ring(interior);
                let hole = Polygon::new(interior.clone(), vec![]);
                if let Some(marker) = kernel::representative_point(&hole) {
                    boundary.holes.push(marker);
                }
            }
        }
        boundary
    }

    fn push_ring(&mut self, ring: &geo::LineString<f64>) {
        let mut coords: Vec<Point> = ring.coords().map(|&c| Point::from(c)).collect();
        if coords.len() > 1 && coords.first() == coords.last() {
            coords.pop();
        }
        if coords.len() < 2 {
            return;
        }
        let start = self.vertices.len();
        self.vertices
            .extend(coords.iter().map(|&p| Vertex::new(p, SENTINEL_DEPTH)));
        let end = self.vertices.len() - 1;
        self.segments.extend((start..end).map(|i| [i, i + 1]));
        self.segments.push([end, start]);
    }

    /// Returns `true` when the boundary has no segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

// =============================================================================
// MESH ASSEMBLY
// =============================================================================

/// Builds a [`Mesh`] from oracle output.
///
/// Output vertices are matched to `sources` by exact coordinates, earlier
/// sources winning over later ones at the same position. Vertices with no
/// source (Steiner points) get the sentinel depth.
///
/// # Errors
///
/// Returns [`MeshError`] if the oracle produced an invalid triangle.
pub fn mesh_from_triangulation<'a, I>(raw: &RawTriangulation, sources: I) -> Result<Mesh, MeshError>
where
    I: IntoIterator<Item = &'a Vertex>,
{
    let mut by_position: FastHashMap<Point, Vertex> = fast_hash_map_with_capacity(raw.vertices.len());
    for v in sources {
        by_position.entry(v.point()).or_insert(*v);
    }
    let mut mesh = Mesh::new();
    for p in &raw.vertices {
        let vertex = by_position
            .get(p)
            .copied()
            .unwrap_or_else(|| Vertex::new(*p, SENTINEL_DEPTH));
        mesh.add_vertex(vertex);
    }
    for &corners in &raw.triangles {
        mesh.add_triangle(corners)?;
    }
    Ok(mesh)
}

// =============================================================================
// TESTS
// =============================================================================
