//! Point-region quadtree over an external vertex arena.
//!
//! The tree stores vertex (and, in mesh mode, triangle) indices only; the
//! vertices themselves live in a [`VertexStore`] passed to every operation.
//! Cells are split at their centroid into four quadrants numbered
//! NE = 0, NW = 1, SW = 2, SE = 3.
//!
//! # Ownership rule
//!
//! A point belongs to exactly one quadrant at every level, decided by
//! [`Domain::contains_point_halfopen`] relative to the tree's global domain.
//! Points on an internal split line go to the quadrant whose lower bound is
//! the split line; points on the outer boundary stay inside.
//!
//! # Splitting
//!
//! A leaf that holds more than `capacity` indices becomes internal: its
//! indices are redistributed into four fresh children, any of which may split
//! again immediately. Exact coordinate duplicates are never stored twice.
//! A cell whose centroid can no longer separate distinct coordinates (float
//! resolution exhausted) stays an over-full leaf.
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::core::point_set::PointSet;
//! use sounding_selection::core::quadtree::PrQuadtree;
//! use sounding_selection::geometry::kernel;
//! use sounding_selection::geometry::point::Point;
//! use sounding_selection::sounding;
//!
//! let points: PointSet = vec![
//!     sounding!(0.0, 0.0, 1.0),
//!     sounding!(10.0, 10.0, 2.0),
//!     sounding!(5.0, 5.0, 3.0),
//!     sounding!(5.0, 5.0, 4.0),
//! ]
//! .into();
//!
//! let (tree, duplicates) = PrQuadtree::build(&points, 0..4, 1).unwrap();
//! assert_eq!(duplicates, vec![(3, 2)]);
//! assert_eq!(tree.len(), 3);
//!
//! let query = kernel::square(Point::new(5.0, 5.0), 0.5);
//! assert_eq!(tree.points_in_polygon(&query, &points), vec![2]);
//! ```

#![forbid(unsafe_code)]

use crate::core::mesh::Mesh;
use crate::core::point_set::VertexStore;
use crate::core::vertex::Vertex;
use crate::geometry::{domain::Domain, kernel, point::Point};
use geo::Polygon;
use thiserror::Error;

/// Quadrant names in numbering order.
pub const QUADRANT_NAMES: [&str; 4] = ["NE", "NW", "SW", "SE"];

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Contract violations of the spatial index.
///
/// These indicate a caller bug (stale index, wrong arena) and are never
/// swallowed by the pipeline.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SpatialIndexError {
    /// Leaf capacity must be at least one.
    #[error("Quadtree leaf capacity must be at least 1")]
    ZeroCapacity,
    /// An index does not refer to a vertex of the store.
    #[error("Vertex index {index} out of range for a store of {len} vertices")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Size of the store.
        len: usize,
    },
    /// A triangle index does not refer to a triangle of the mesh.
    #[error("Triangle index {index} out of range for a mesh of {len} triangles")]
    TriangleOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of triangles in the mesh.
        len: usize,
    },
    /// A vertex lies outside the global domain of the index.
    #[error("Vertex {index} at {point} lies outside the indexed domain {domain:?}")]
    OutsideDomain {
        /// Index of the vertex.
        index: usize,
        /// Its position.
        point: Point,
        /// Global domain of the index.
        domain: Domain,
    },
}

// =============================================================================
// NODE
// =============================================================================

/// A quadtree cell: a leaf holding indices or an internal node with exactly
/// four children.
#[derive(Clone, Debug, Default)]
pub struct Node {
    vertices: Vec<usize>,
    triangles: Vec<usize>,
    children: Option<Box<[Node; 4]>>,
}

impl Node {
    /// Returns `true` for leaves.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Vertex indices held by this leaf (empty for internal nodes).
    #[must_use]
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Triangle indices registered at this leaf.
    #[must_use]
    pub fn triangles(&self) -> &[usize] {
        &self.triangles
    }

    /// Children in quadrant order, `None` for leaves.
    #[must_use]
    pub fn children(&self) -> Option<&[Self; 4]> {
        self.children.as_deref()
    }

    /// Depth-first label of quadrant `quadrant` under a parent labelled
    /// `parent`. The root is labelled 0.
    #[must_use]
    pub const fn child_label(parent: u128, quadrant: usize) -> u128 {
        parent.saturating_mul(4).saturating_add(quadrant as u128 + 1)
    }
}

/// A leaf reached by [`PrQuadtree::leaves`].
#[derive(Clone, Copy, Debug)]
pub struct Leaf<'a> {
    /// Depth-first label.
    pub label: u128,
    /// Depth below the root.
    pub depth: usize,
    /// Cell rectangle.
    pub domain: Domain,
    /// The leaf node.
    pub node: &'a Node,
}

/// Result of inserting one index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored in a leaf.
    Inserted,
    /// Discarded: `existing` already holds the same coordinates.
    Duplicate {
        /// Index already stored at the same position.
        existing: usize,
    },
}

// =============================================================================
// TREE
// =============================================================================

/// PR-quadtree rooted at a fixed global domain.
#[derive(Clone, Debug)]
pub struct PrQuadtree {
    root: Node,
    domain: Domain,
    capacity: usize,
}

impl PrQuadtree {
    /// Empty tree over `domain` with leaf capacity `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialIndexError::ZeroCapacity`] when `capacity == 0`.
    pub fn new(domain: Domain, capacity: usize) -> Result<Self, SpatialIndexError> {
        if capacity == 0 {
            return Err(SpatialIndexError::ZeroCapacity);
        }
        Ok(Self {
            root: Node::default(),
            domain,
            capacity,
        })
    }

    /// Builds a point-mode tree over `store`, inserting `order` in sequence.
    ///
    /// Returns the tree and the discarded duplicates as
    /// `(discarded, existing)` pairs.
    ///
    /// # Errors
    ///
    /// Propagates any [`SpatialIndexError`] from [`PrQuadtree::insert`].
    pub fn build<S, I>(
        store: &S,
        order: I,
        capacity: usize,
    ) -> Result<(Self, Vec<(usize, usize)>), SpatialIndexError>
    where
        S: VertexStore + ?Sized,
        I: IntoIterator<Item = usize>,
    {
        let mut tree = Self::new(store.domain().unwrap_or_default(), capacity)?;
        let mut duplicates = Vec::new();
        for index in order {
            if let InsertOutcome::Duplicate { existing } = tree.insert(index, store)? {
                duplicates.push((index, existing));
            }
        }
        Ok((tree, duplicates))
    }

    /// Builds a mesh-mode tree: every mesh vertex, then every triangle.
    ///
    /// # Errors
    ///
    /// Propagates any [`SpatialIndexError`].
    pub fn build_mesh(mesh: &Mesh, capacity: usize) -> Result<Self, SpatialIndexError> {
        let (mut tree, duplicates) = Self::build(mesh, 0..mesh.len(), capacity)?;
        if !duplicates.is_empty() {
            tracing::debug!(
                count = duplicates.len(),
                "mesh contains coincident vertices; only the first of each is indexed"
            );
        }
        for t in 0..mesh.triangle_count() {
            tree.insert_triangle(t, mesh)?;
        }
        Ok(tree)
    }

    /// Global domain.
    #[must_use]
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// Leaf capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Root node.
    #[must_use]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    /// Number of indexed vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves().iter().map(|l| l.node.vertices.len()).sum()
    }

    /// Returns `true` when no vertex is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -------------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------------

    /// Inserts vertex `index` of `store`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialIndexError::IndexOutOfRange`] for an unknown index and
    /// [`SpatialIndexError::OutsideDomain`] for a vertex outside the global
    /// domain.
    pub fn insert<S>(&mut self, index: usize, store: &S) -> Result<InsertOutcome, SpatialIndexError>
    where
        S: VertexStore + ?Sized,
    {
        let vertices = store.vertices();
        let point = vertices
            .get(index)
            .ok_or(SpatialIndexError::IndexOutOfRange {
                index,
                len: vertices.len(),
            })?
            .point();
        if !self.domain.contains_strict(&point) {
            return Err(SpatialIndexError::OutsideDomain {
                index,
                point,
                domain: self.domain,
            });
        }
        let ctx = InsertContext {
            vertices,
            global: self.domain,
            capacity: self.capacity,
        };
        Ok(insert_into(&mut self.root, self.domain, index, point, &ctx))
    }

    /// Registers triangle `index` of `mesh` at the first leaf, in quadrant
    /// order, whose cell owns one of its corners.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialIndexError`] for an unknown triangle or a corner
    /// outside the global domain.
    pub fn insert_triangle(&mut self, index: usize, mesh: &Mesh) -> Result<(), SpatialIndexError> {
        let corners = mesh
            .triangle(index)
            .ok_or(SpatialIndexError::TriangleOutOfRange {
                index,
                len: mesh.triangle_count(),
            })?
            .indices();
        let global = self.domain;
        let mut points = [Point::default(); 3];
        for (slot, &v) in points.iter_mut().zip(&corners) {
            let p = mesh.vertices()[v].point();
            if !global.contains_strict(&p) {
                return Err(SpatialIndexError::OutsideDomain {
                    index: v,
                    point: p,
                    domain: global,
                });
            }
            *slot = p;
        }

        let mut node = &mut self.root;
        let mut domain = global;
        loop {
            let Node {
                triangles,
                children,
                ..
            } = node;
            match children.as_deref_mut() {
                Some(children) => {
                    let quads = domain.quadrants();
                    // A corner inside the parent is always owned by one child.
                    let q = quads
                        .iter()
                        .position(|d| points.iter().any(|p| d.contains_point_halfopen(p, &global)))
                        .unwrap_or(0);
                    domain = quads[q];
                    node = &mut children[q];
                }
                None => {
                    triangles.push(index);
                    return Ok(());
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Indices of all indexed vertices inside or on the boundary of
    /// `polygon`, each reported once.
    #[must_use]
    pub fn points_in_polygon<S>(&self, polygon: &Polygon<f64>, store: &S) -> Vec<usize>
    where
        S: VertexStore + ?Sized,
    {
        let mut found = Vec::new();
        let vertices = store.vertices();
        self.visit_region(polygon, |node| {
            found.extend(node.vertices.iter().copied().filter(|&i| {
                vertices
                    .get(i)
                    .is_some_and(|v| kernel::point_in_polygon(&v.point(), polygon))
            }));
        });
        found
    }

    /// Triangle indices registered at leaves whose cells meet `polygon`.
    ///
    /// This is a candidate set: callers test the triangles themselves.
    #[must_use]
    pub fn triangles_near(&self, polygon: &Polygon<f64>) -> Vec<usize> {
        let mut found = Vec::new();
        self.visit_region(polygon, |node| found.extend_from_slice(&node.triangles));
        found
    }

    /// Removes and returns every indexed vertex inside `polygon` for which
    /// `eliminate` returns `true`.
    pub fn eliminate_in_region<S, F>(
        &mut self,
        polygon: &Polygon<f64>,
        store: &S,
        mut eliminate: F,
    ) -> Vec<usize>
    where
        S: VertexStore + ?Sized,
        F: FnMut(usize, &Vertex) -> bool,
    {
        let mut removed = Vec::new();
        let Some(bbox) = kernel::bounding_domain(polygon) else {
            return removed;
        };
        let global = self.domain;
        let vertices = store.vertices();
        let mut stack: Vec<(&mut Node, Domain)> = vec![(&mut self.root, global)];
        while let Some((node, domain)) = stack.pop() {
            let Node {
                vertices: held,
                children,
                ..
            } = node;
            if let Some(children) = children.as_deref_mut() {
                let quads = domain.quadrants();
                if let Some(q) = quads.iter().position(|d| d.owns_box(&bbox, &global)) {
                    stack.push((&mut children[q], quads[q]));
                } else {
                    for (child, quad) in children.iter_mut().zip(quads).rev() {
                        if quad.intersects(polygon) {
                            stack.push((child, quad));
                        }
                    }
                }
            } else {
                held.retain(|&i| {
                    let Some(v) = vertices.get(i) else {
                        return true;
                    };
                    if kernel::point_in_polygon(&v.point(), polygon) && eliminate(i, v) {
                        removed.push(i);
                        false
                    } else {
                        true
                    }
                });
            }
        }
        removed
    }

    /// All leaves in depth-first quadrant order.
    #[must_use]
    pub fn leaves(&self) -> Vec<Leaf<'_>> {
        let mut leaves = Vec::new();
        let mut stack = vec![(&self.root, self.domain, 0_u128, 0_usize)];
        while let Some((node, domain, label, depth)) = stack.pop() {
            match node.children() {
                Some(children) => {
                    let quads = domain.quadrants();
                    for q in (0..4).rev() {
                        stack.push((
                            &children[q],
                            quads[q],
                            Node::child_label(label, q),
                            depth + 1,
                        ));
                    }
                }
                None => leaves.push(Leaf {
                    label,
                    depth,
                    domain,
                    node,
                }),
            }
        }
        leaves
    }

    /// Visits every leaf that can hold a point inside `polygon`.
    ///
    /// If one child owns the polygon's whole bounding box, only that child is
    /// descended into.
    fn visit_region<F>(&self, polygon: &Polygon<f64>, mut visit: F)
    where
        F: FnMut(&Node),
    {
        let Some(bbox) = kernel::bounding_domain(polygon) else {
            return;
        };
        if !self.domain.overlaps(&bbox) {
            return;
        }
        let global = self.domain;
        let mut stack = vec![(&self.root, global)];
        while let Some((node, domain)) = stack.pop() {
            let Some(children) = node.children() else {
                visit(node);
                continue;
            };
            let quads = domain.quadrants();
            if let Some(q) = quads.iter().position(|d| d.owns_box(&bbox, &global)) {
                stack.push((&children[q], quads[q]));
                continue;
            }
            for q in (0..4).rev() {
                if quads[q].intersects(polygon) {
                    stack.push((&children[q], quads[q]));
                }
            }
        }
    }
}

// =============================================================================
// INSERTION HELPERS
// =============================================================================

struct InsertContext<'a> {
    vertices: &'a [Vertex],
    global: Domain,
    capacity: usize,
}

/// Quadrant of `domain` owning `p`. Falls back to NE, which only happens for
/// points outside `domain`; callers only pass owned points.
fn owning_quadrant(domain: &Domain, p: &Point, global: &Domain) -> (usize, Domain) {
    let quads = domain.quadrants();
    let q = quads
        .iter()
        .position(|d| d.contains_point_halfopen(p, global))
        .unwrap_or(0);
    (q, quads[q])
}

fn insert_into(
    node: &mut Node,
    domain: Domain,
    index: usize,
    point: Point,
    ctx: &InsertContext<'_>,
) -> InsertOutcome {
    if let Some(children) = node.children.as_deref_mut() {
        let (q, quad) = owning_quadrant(&domain, &point, &ctx.global);
        return insert_into(&mut children[q], quad, index, point, ctx);
    }

    if let Some(&existing) = node
        .vertices
        .iter()
        .find(|&&i| ctx.vertices[i].point() == point)
    {
        return InsertOutcome::Duplicate { existing };
    }
    node.vertices.push(index);

    if node.vertices.len() > ctx.capacity {
        split(node, domain, ctx);
    }
    InsertOutcome::Inserted
}

fn split(node: &mut Node, domain: Domain, ctx: &InsertContext<'_>) {
    if domain.quadrants().contains(&domain) {
        #[cfg(feature = "test-debug")]
        tracing::debug!(?domain, held = node.vertices.len(), "cell cannot be subdivided further");
        return;
    }
    let held = std::mem::take(&mut node.vertices);
    node.children = Some(Box::default());
    for index in held {
        let point = ctx.vertices[index].point();
        insert_into(node, domain, index, point, ctx);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::point_set::PointSet;
    use crate::sounding;

    fn grid(n: usize) -> PointSet {
        let mut set = PointSet::new();
        for i in 0..n {
            for j in 0..n {
                #[allow(clippy::cast_precision_loss)]
                set.push(sounding!(i as f64, j as f64, (i + j) as f64));
            }
        }
        set
    }

    fn owners(tree: &PrQuadtree, index: usize) -> usize {
        tree.leaves()
            .iter()
            .filter(|l| l.node.vertices().contains(&index))
            .count()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = PrQuadtree::new(Domain::default(), 0).unwrap_err();
        assert_eq!(err, SpatialIndexError::ZeroCapacity);
    }

    #[test]
    fn test_split_respects_capacity_and_ownership() {
        let set = grid(5);
        let (tree, duplicates) = PrQuadtree::build(&set, 0..set.len(), 2).unwrap();
        assert!(duplicates.is_empty());
        assert_eq!(tree.len(), 25);
        for leaf in tree.leaves() {
            assert!(leaf.node.vertices().len() <= 2, "leaf {} overflows", leaf.label);
            for &i in leaf.node.vertices() {
                let p = set.vertex(i).unwrap().point();
                assert!(leaf.domain.contains_point_halfopen(&p, &tree.domain()));
            }
        }
        for i in 0..set.len() {
            assert_eq!(owners(&tree, i), 1);
        }
    }

    #[test]
    fn test_cascading_split() {
        // Three points packed in one corner force several levels at once.
        let set: PointSet = vec![
            sounding!(0.0, 0.0, 1.0),
            sounding!(100.0, 100.0, 1.0),
            sounding!(0.1, 0.1, 1.0),
            sounding!(0.2, 0.1, 1.0),
        ]
        .into();
        let (tree, _) = PrQuadtree::build(&set, 0..4, 1).unwrap();
        assert!(tree.leaves().iter().all(|l| l.node.vertices().len() <= 1));
        assert!(tree.leaves().iter().any(|l| l.depth > 5));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_out_of_range_and_outside_domain() {
        let set = grid(2);
        let mut tree = PrQuadtree::new(set.domain().unwrap(), 4).unwrap();
        assert_eq!(
            tree.insert(7, &set),
            Err(SpatialIndexError::IndexOutOfRange { index: 7, len: 4 })
        );

        let mut bigger = set.clone();
        bigger.push(sounding!(50.0, 50.0, 1.0));
        assert!(matches!(
            tree.insert(4, &bigger),
            Err(SpatialIndexError::OutsideDomain { index: 4, .. })
        ));
    }

    #[test]
    fn test_points_on_split_lines_are_found() {
        let set = grid(5); // split lines at 2.0 and 1.0/3.0
        let (tree, _) = PrQuadtree::build(&set, 0..set.len(), 1).unwrap();
        let line = kernel::square(Point::new(2.0, 2.0), 0.01);
        assert_eq!(tree.points_in_polygon(&line, &set), vec![12]);

        let column = Domain::new(Point::new(1.9, -1.0), Point::new(2.1, 5.0)).to_polygon();
        let mut found = tree.points_in_polygon(&column, &set);
        found.sort_unstable();
        assert_eq!(found, vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_eliminate_in_region_with_predicate() {
        let set = grid(4);
        let (mut tree, _) = PrQuadtree::build(&set, 0..set.len(), 2).unwrap();
        let everything = set.domain().unwrap().to_polygon();
        let mut removed = tree.eliminate_in_region(&everything, &set, |_, v| v.depth() >= 4.0);
        removed.sort_unstable();
        let expected: Vec<usize> = set
            .iter()
            .filter(|(_, v)| v.depth() >= 4.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(removed, expected);
        assert_eq!(tree.len(), 16 - expected.len());
        assert!(tree.points_in_polygon(&everything, &set).iter().all(|&i| set.vertex(i).unwrap().depth() < 4.0));
    }

    #[test]
    fn test_mesh_mode_registers_each_triangle_once() {
        let mut mesh = Mesh::new();
        for (x, y) in [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (2.0, 2.0)] {
            mesh.add_vertex(sounding!(x, y, 1.0));
        }
        for t in [[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]] {
            mesh.add_triangle(t).unwrap();
        }
        let tree = PrQuadtree::build_mesh(&mesh, 1).unwrap();
        let mut registered: Vec<usize> = tree
            .leaves()
            .iter()
            .flat_map(|l| l.node.triangles().iter().copied())
            .collect();
        registered.sort_unstable();
        assert_eq!(registered, vec![0, 1, 2, 3]);

        let near = tree.triangles_near(&kernel::square(Point::new(3.0, 3.0), 0.5));
        assert!(!near.is_empty());
    }

    #[test]
    fn test_labels_follow_depth_first_numbering() {
        assert_eq!(Node::child_label(0, 0), 1);
        assert_eq!(Node::child_label(0, 3), 4);
        assert_eq!(Node::child_label(1, 0), 5);
        assert_eq!(Node::child_label(4, 3), 20);

        let set = grid(3);
        let (tree, _) = PrQuadtree::build(&set, 0..set.len(), 4).unwrap();
        let labels: Vec<u128> = tree.leaves().iter().map(|l| l.label).collect();
        // The root split once; its NE child is the first leaf visited.
        assert_eq!(labels, vec![1, 2, 3, 4]);
    }
}
