//! Terrain-critical vertices of a depth mesh.
//!
//! A vertex is compared against the ring of vertices it shares a triangle
//! with. Depth grows downwards, so a vertex with no shallower neighbour is a
//! local [`Classification::Maximum`] (a shoal) and a vertex with no deeper
//! neighbour is a [`Classification::Minimum`] (a pit). A vertex is a
//! [`Classification::Saddle`] when both its deeper and its shallower
//! neighbours split into at least two groups, where two neighbours are
//! grouped when they span a triangle with the vertex.
//!
//! A neighbour at exactly the same depth makes the vertex part of a flat
//! patch; such vertices stay [`Classification::Unclassified`]. Boundary
//! vertices at [`SENTINEL_DEPTH`](crate::core::vertex::SENTINEL_DEPTH) carry
//! no depth: they are never classified and are ignored as neighbours.
//!
//! The classification walks the leaves of a mesh-mode [`PrQuadtree`] and
//! reads each leaf vertex's complete 1-ring from the mesh adjacency.

#![forbid(unsafe_code)]

use crate::core::collections::{FastHashMap, SmallBuffer, WheelBuffer, fast_hash_map_with_capacity};
use crate::core::mesh::Mesh;
use crate::core::point_set::VertexStore;
use crate::core::quadtree::PrQuadtree;
use crate::core::vertex::Classification;
use serde::{Deserialize, Serialize};

/// Number of vertices of each critical type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriticalCounts {
    /// Pits.
    pub minima: usize,
    /// Shoals.
    pub maxima: usize,
    /// Saddles.
    pub saddles: usize,
}

impl CriticalCounts {
    /// Total number of critical vertices.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.minima + self.maxima + self.saddles
    }

    fn record(&mut self, class: Classification) {
        match class {
            Classification::Minimum => self.minima += 1,
            Classification::Maximum => self.maxima += 1,
            Classification::Saddle => self.saddles += 1,
            Classification::Unclassified | Classification::Selected(_) => {}
        }
    }
}

/// Classifies vertex `v` of `mesh` from its 1-ring.
///
/// # Examples
///
/// ```rust
/// use sounding_selection::core::algorithms::critical_points::classify_vertex;
/// use sounding_selection::core::mesh::Mesh;
/// use sounding_selection::core::vertex::Classification;
/// use sounding_selection::sounding;
///
/// let mut mesh = Mesh::new();
/// let centre = mesh.add_vertex(sounding!(0.0, 0.0, 2.0));
/// let a = mesh.add_vertex(sounding!(1.0, 0.0, 8.0));
/// let b = mesh.add_vertex(sounding!(0.0, 1.0, 9.0));
/// let c = mesh.add_vertex(sounding!(-1.0, -1.0, 7.0));
/// mesh.add_triangle([centre, a, b]).unwrap();
/// mesh.add_triangle([centre, b, c]).unwrap();
/// mesh.add_triangle([centre, c, a]).unwrap();
///
/// assert_eq!(classify_vertex(&mesh, centre), Classification::Maximum);
/// ```
#[must_use]
pub fn classify_vertex(mesh: &Mesh, v: usize) -> Classification {
    let Some(vertex) = mesh.vertices().get(v) else {
        return Classification::Unclassified;
    };
    if vertex.is_sentinel() {
        return Classification::Unclassified;
    }
    let z = vertex.depth();

    let mut upper = WheelBuffer::new();
    let mut lower = WheelBuffer::new();
    for n in mesh.neighbours(v) {
        let neighbour = &mesh.vertices()[n];
        if neighbour.is_sentinel() {
            continue;
        }
        let d = neighbour.depth();
        if d > z {
            lower.push(n);
        } else if d < z {
            upper.push(n);
        } else {
            return Classification::Unclassified;
        }
    }
    if upper.is_empty() && lower.is_empty() {
        return Classification::Unclassified;
    }
    if upper.is_empty() {
        return Classification::Maximum;
    }
    if lower.is_empty() {
        return Classification::Minimum;
    }

    let mut upper_groups = Components::new(&upper);
    let mut lower_groups = Components::new(&lower);
    for &t in mesh.incident_triangles(v) {
        let Some([a, b]) = mesh.triangle(t).and_then(|tri| tri.opposite_edge(v)) else {
            continue;
        };
        upper_groups.join(a, b);
        lower_groups.join(a, b);
    }
    if upper_groups.count() >= 2 && lower_groups.count() >= 2 {
        Classification::Saddle
    } else {
        Classification::Unclassified
    }
}

/// Classifies every indexed vertex of `mesh` leaf by leaf and tags it.
///
/// Vertices that are not critical keep their existing tag, so a selection
/// role survives unless the vertex is a minimum, maximum or saddle.
pub fn classify_mesh(mesh: &mut Mesh, tree: &PrQuadtree) -> CriticalCounts {
    let mut tags = Vec::new();
    for leaf in tree.leaves() {
        for &v in leaf.node.vertices() {
            let class = classify_vertex(mesh, v);
            if class.is_critical() {
                tags.push((v, class));
            }
        }
    }

    let mut counts = CriticalCounts::default();
    for (v, class) in tags {
        if let Some(vertex) = mesh.vertex_mut(v) {
            vertex.set_classification(class);
            counts.record(class);
        }
    }
    tracing::debug!(
        minima = counts.minima,
        maxima = counts.maxima,
        saddles = counts.saddles,
        "critical points classified"
    );
    counts
}

/// Union-find over one side of a vertex wheel.
struct Components {
    slots: FastHashMap<usize, usize>,
    parent: SmallBuffer<usize, 8>,
}

impl Components {
    fn new(members: &[usize]) -> Self {
        let mut slots = fast_hash_map_with_capacity(members.len());
        for (i, &m) in members.iter().enumerate() {
            slots.insert(m, i);
        }
        Self {
            slots,
            parent: (0..members.len()).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Joins `a` and `b` when both are members.
    fn join(&mut self, a: usize, b: usize) {
        let (Some(&i), Some(&j)) = (self.slots.get(&a), self.slots.get(&b)) else {
            return;
        };
        let (ri, rj) = (self.find(i), self.find(j));
        if ri != rj {
            self.parent[ri] = rj;
        }
    }

    fn count(&mut self) -> usize {
        (0..self.parent.len()).filter(|&i| self.find(i) == i).count()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vertex::{SelectionRole, Vertex};
    use crate::sounding;

    /// Centre vertex at depth `z` with a closed wheel of `ring` depths.
    fn wheel(z: f64, ring: &[f64]) -> Mesh {
        let mut mesh = Mesh::new();
        let centre = mesh.add_vertex(sounding!(0.0, 0.0, z));
        #[allow(clippy::cast_precision_loss)]
        let n = ring.len() as f64;
        let ids: Vec<usize> = ring
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                #[allow(clippy::cast_precision_loss)]
                let a = std::f64::consts::TAU * i as f64 / n;
                mesh.add_vertex(sounding!(a.cos() * 10.0, a.sin() * 10.0, d))
            })
            .collect();
        for i in 0..ids.len() {
            mesh.add_triangle([centre, ids[i], ids[(i + 1) % ids.len()]])
                .unwrap();
        }
        mesh
    }

    #[test]
    fn test_pit_is_minimum() {
        let mesh = wheel(20.0, &[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        assert_eq!(classify_vertex(&mesh, 0), Classification::Minimum);
    }

    #[test]
    fn test_peak_is_maximum() {
        let mesh = wheel(1.0, &[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        assert_eq!(classify_vertex(&mesh, 0), Classification::Maximum);
    }

    #[test]
    fn test_alternating_wheel_is_saddle() {
        let mesh = wheel(10.0, &[5.0, 15.0, 5.0, 15.0]);
        assert_eq!(classify_vertex(&mesh, 0), Classification::Saddle);
    }

    #[test]
    fn test_slope_is_regular() {
        let mesh = wheel(10.0, &[5.0, 6.0, 15.0, 16.0]);
        assert_eq!(classify_vertex(&mesh, 0), Classification::Unclassified);
    }

    #[test]
    fn test_flat_neighbour_leaves_unclassified() {
        let mesh = wheel(10.0, &[10.0, 15.0, 16.0, 17.0]);
        assert_eq!(classify_vertex(&mesh, 0), Classification::Unclassified);
    }

    #[test]
    fn test_sentinel_neighbours_ignored() {
        let mut mesh = wheel(5.0, &[10.0, 11.0, 12.0, 13.0]);
        mesh.vertex_mut(1)
            .unwrap()
            .set_depth(crate::core::vertex::SENTINEL_DEPTH);
        assert_eq!(classify_vertex(&mesh, 0), Classification::Maximum);
        assert_eq!(classify_vertex(&mesh, 1), Classification::Unclassified);
    }

    #[test]
    fn test_classify_mesh_counts_and_tags() {
        let mut mesh = wheel(10.0, &[5.0, 15.0, 5.0, 15.0]);
        mesh.vertex_mut(0)
            .unwrap()
            .set_classification(Classification::Selected(SelectionRole::Generalized));
        let tree = PrQuadtree::build_mesh(&mesh, 2).unwrap();
        let counts = classify_mesh(&mut mesh, &tree);
        assert_eq!(counts.saddles, 1);
        let centre: &Vertex = &mesh.vertices()[0];
        assert_eq!(centre.classification(), Classification::Saddle);
        // Outer ring vertices: two shoals at 5, two pits at 15.
        assert_eq!(counts.maxima, 2);
        assert_eq!(counts.minima, 2);
        assert_eq!(counts.total(), 5);
    }
}
