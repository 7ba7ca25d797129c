//! Triangulated irregular networks.
//!
//! A [`Mesh`] owns its vertex arena, a triangle list of index triples into
//! that arena, and a vertex→triangle adjacency maintained as triangles are
//! added. Meshes are never edited in place: every change to the selection
//! produces a fresh triangulation and a fresh mesh.
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::core::mesh::Mesh;
//! use sounding_selection::sounding;
//!
//! let mut mesh = Mesh::new();
//! let a = mesh.add_vertex(sounding!(0.0, 0.0, 10.0));
//! let b = mesh.add_vertex(sounding!(1.0, 0.0, 12.0));
//! let c = mesh.add_vertex(sounding!(0.0, 1.0, 11.0));
//! let t = mesh.add_triangle([a, b, c]).unwrap();
//!
//! assert_eq!(mesh.incident_triangles(a), &[t]);
//! assert_eq!(mesh.neighbours(a).as_slice(), &[b, c]);
//! ```

#![forbid(unsafe_code)]

use crate::core::collections::WheelBuffer;
use crate::core::point_set::VertexStore;
use crate::core::vertex::Vertex;
use crate::geometry::{domain::Domain, kernel, point::Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while assembling a mesh.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    /// A triangle references a vertex that does not exist.
    #[error("Triangle {triangle} references vertex {index}, but the mesh has {len} vertices")]
    VertexIndexOutOfRange {
        /// Position the triangle would have taken.
        triangle: usize,
        /// The offending vertex index.
        index: usize,
        /// Number of vertices in the mesh.
        len: usize,
    },
    /// A triangle uses the same vertex twice.
    #[error("Triangle {triangle} repeats vertex {index}")]
    RepeatedVertex {
        /// Position the triangle would have taken.
        triangle: usize,
        /// The repeated vertex index.
        index: usize,
    },
}

// =============================================================================
// TRIANGLE
// =============================================================================

/// Three vertex indices into the owning mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle([usize; 3]);

impl Triangle {
    /// Corner indices in insertion order.
    #[must_use]
    pub const fn indices(&self) -> [usize; 3] {
        self.0
    }

    /// Returns `true` when `vertex` is one of the corners.
    #[must_use]
    pub fn has_vertex(&self, vertex: usize) -> bool {
        self.0.contains(&vertex)
    }

    /// The two corners other than `vertex`, or `None` if `vertex` is not a
    /// corner.
    #[must_use]
    pub fn opposite_edge(&self, vertex: usize) -> Option<[usize; 2]> {
        let [a, b, c] = self.0;
        if vertex == a {
            Some([b, c])
        } else if vertex == b {
            Some([c, a])
        } else if vertex == c {
            Some([a, b])
        } else {
            None
        }
    }
}

// =============================================================================
// MESH
// =============================================================================

/// Triangle mesh over an owned vertex arena.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    incident: Vec<WheelBuffer>,
    domain: Option<Domain>,
}

impl Mesh {
    /// Empty mesh.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
            incident: Vec::new(),
            domain: None,
        }
    }

    /// Appends a vertex, grows the domain and returns the vertex index.
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        match &mut self.domain {
            Some(domain) => domain.resize(&vertex.point()),
            None => self.domain = Some(Domain::from_point(vertex.point())),
        }
        self.vertices.push(vertex);
        self.incident.push(WheelBuffer::new());
        self.vertices.len() - 1
    }

    /// Appends a triangle and records it in the adjacency of its corners.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError`] if a corner index is out of range or repeated.
    pub fn add_triangle(&mut self, corners: [usize; 3]) -> Result<usize, MeshError> {
        let triangle = self.triangles.len();
        for (k, &index) in corners.iter().enumerate() {
            if index >= self.vertices.len() {
                return Err(MeshError::VertexIndexOutOfRange {
                    triangle,
                    index,
                    len: self.vertices.len(),
                });
            }
            if corners[..k].contains(&index) {
                return Err(MeshError::RepeatedVertex { triangle, index });
            }
        }
        for &index in &corners {
            self.incident[index].push(triangle);
        }
        self.triangles.push(Triangle(corners));
        Ok(triangle)
    }

    /// All triangles, by index.
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Triangle at `index`.
    #[must_use]
    pub fn triangle(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index)
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Corner vertices of triangle `index`.
    #[must_use]
    pub fn triangle_vertices(&self, index: usize) -> Option<[&Vertex; 3]> {
        let [a, b, c] = self.triangles.get(index)?.indices();
        Some([
            self.vertices.get(a)?,
            self.vertices.get(b)?,
            self.vertices.get(c)?,
        ])
    }

    /// Corner positions of triangle `index`.
    #[must_use]
    pub fn triangle_points(&self, index: usize) -> Option<[Point; 3]> {
        self.triangle_vertices(index)
            .map(|[a, b, c]| [a.point(), b.point(), c.point()])
    }

    /// Footprint of triangle `index` as a polygon.
    #[must_use]
    pub fn triangle_polygon(&self, index: usize) -> Option<geo::Polygon<f64>> {
        self.triangle_points(index)
            .map(|[a, b, c]| kernel::triangle(a, b, c))
    }

    /// Triangles incident to `vertex`, empty for unknown vertices.
    #[must_use]
    pub fn incident_triangles(&self, vertex: usize) -> &[usize] {
        self.incident.get(vertex).map_or(&[], |t| t.as_slice())
    }

    /// Distinct neighbours of `vertex` over its incident triangles, in first
    /// encounter order.
    #[must_use]
    pub fn neighbours(&self, vertex: usize) -> WheelBuffer {
        let mut ring = WheelBuffer::new();
        for &t in self.incident_triangles(vertex) {
            for corner in self.triangles[t].indices() {
                if corner != vertex && !ring.contains(&corner) {
                    ring.push(corner);
                }
            }
        }
        ring
    }

    /// Mutable access to a vertex; positions must not change.
    pub fn vertex_mut(&mut self, index: usize) -> Option<&mut Vertex> {
        self.vertices.get_mut(index)
    }

    /// Consumes the mesh, returning its vertex arena.
    #[must_use]
    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }
}

impl VertexStore for Mesh {
    fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn domain(&self) -> Option<Domain> {
        self.domain
    }
}

// =============================================================================
// TESTS
// =============================================================================
