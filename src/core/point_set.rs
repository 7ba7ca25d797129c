//! Flat vertex arenas.
//!
//! A [`PointSet`] owns a `Vec<Vertex>` and the [`Domain`] bounding it, grown
//! incrementally as vertices are pushed. Everything else in the crate refers
//! to vertices by their position in such an arena.
//!
//! The [`VertexStore`] trait is the read-only view the spatial index needs;
//! both [`PointSet`] and [`Mesh`](crate::core::mesh::Mesh) implement it.

#![forbid(unsafe_code)]

use crate::core::vertex::Vertex;
use crate::geometry::domain::Domain;
use serde::{Deserialize, Serialize};

// =============================================================================
// VERTEX STORE TRAIT
// =============================================================================

/// Read-only access to an indexed vertex arena.
pub trait VertexStore {
    /// All vertices, by index.
    fn vertices(&self) -> &[Vertex];

    /// Bounding domain of the arena, `None` when empty.
    fn domain(&self) -> Option<Domain>;

    /// Vertex at `index`.
    fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices().get(index)
    }

    /// Number of vertices.
    fn len(&self) -> usize {
        self.vertices().len()
    }

    /// Returns `true` when the arena holds no vertex.
    fn is_empty(&self) -> bool {
        self.vertices().is_empty()
    }
}

// =============================================================================
// POINT SET
// =============================================================================

/// Unstructured vertex arena.
///
/// # Examples
///
/// ```rust
/// use sounding_selection::core::point_set::{PointSet, VertexStore};
/// use sounding_selection::sounding;
///
/// let mut set = PointSet::new();
/// set.push(sounding!(0.0, 0.0, 5.0));
/// set.push(sounding!(4.0, 2.0, 6.0));
/// let domain = set.domain().unwrap();
/// assert_eq!(domain.width(), 4.0);
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PointSet {
    vertices: Vec<Vertex>,
    domain: Option<Domain>,
}

impl PointSet {
    /// Empty point set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            domain: None,
        }
    }

    /// Appends `vertex`, growing the domain, and returns its index.
    pub fn push(&mut self, vertex: Vertex) -> usize {
        match &mut self.domain {
            Some(domain) => domain.resize(&vertex.point()),
            None => self.domain = Some(Domain::from_point(vertex.point())),
        }
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Mutable access to the vertex at `index`.
    ///
    /// Callers must not move a vertex held by a live spatial index.
    pub fn vertex_mut(&mut self, index: usize) -> Option<&mut Vertex> {
        self.vertices.get_mut(index)
    }

    /// Iterates over `(index, vertex)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Vertex)> {
        self.vertices.iter().enumerate()
    }

    /// Consumes the set, returning the arena.
    #[must_use]
    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }
}

impl VertexStore for PointSet {
    fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn domain(&self) -> Option<Domain> {
        self.domain
    }
}

impl FromIterator<Vertex> for PointSet {
    fn from_iter<I: IntoIterator<Item = Vertex>>(iter: I) -> Self {
        let mut set = Self::new();
        for v in iter {
            set.push(v);
        }
        set
    }
}

impl From<Vec<Vertex>> for PointSet {
    fn from(vertices: Vec<Vertex>) -> Self {
        vertices.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point;
    use crate::sounding;

    #[test]
    fn test_push_grows_domain() {
        let mut set = PointSet::new();
        assert!(set.domain().is_none());
        assert!(set.is_empty());

        assert_eq!(set.push(sounding!(1.0, 1.0, 2.0)), 0);
        assert_eq!(set.push(sounding!(-1.0, 3.0, 2.0)), 1);
        let d = set.domain().unwrap();
        assert_eq!(d.min(), Point::new(-1.0, 1.0));
        assert_eq!(d.max(), Point::new(1.0, 3.0));
    }

    #[test]
    fn test_collect_and_access() {
        let set: PointSet = vec![sounding!(0.0, 0.0, 1.0), sounding!(2.0, 0.0, 3.0)].into();
        assert_eq!(set.len(), 2);
        assert_eq!(set.vertex(1).map(Vertex::depth), Some(3.0));
        assert!(set.vertex(2).is_none());
        let depths: Vec<f64> = set.iter().map(|(_, v)| v.depth()).collect();
        assert_eq!(depths, vec![1.0, 3.0]);
    }
}
