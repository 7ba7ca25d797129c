//! Shallowest-first point elimination.
//!
//! Both conflict models share one loop: points are visited in ascending
//! depth order, the shallowest pending point `t` is kept, and every pending
//! point that conflicts with `t` is removed from the index and from the
//! working list. A point is *pending* until it is either kept or removed.
//!
//! - [`ConflictModel::Label`]: `v` conflicts with `t` when their printed
//!   labels overlap and `v` is not shallower than `t` (hazards override the
//!   depth test). Exact depth ties go to the point processed first.
//! - [`ConflictModel::Radius`]: `v` conflicts with `t` when it lies within
//!   a radius that grows linearly with `t`'s rank in depth order.
//!
//! Points without a catalogued footprint are kept and never compared.
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::core::algorithms::generalization::{generalize, ConflictModel};
//! use sounding_selection::cartography::footprint::{FootprintModel, LabelSpacing};
//! use sounding_selection::core::diagnostics::CollectingSink;
//! use sounding_selection::core::point_set::PointSet;
//! use sounding_selection::sounding;
//!
//! let points: PointSet = vec![
//!     sounding!(0.0, 0.0, 5.0),
//!     sounding!(10.0, 0.0, 6.0),
//!     sounding!(5_000.0, 5_000.0, 4.0),
//! ]
//! .into();
//! let model = ConflictModel::Label(FootprintModel::new(20_000.0, LabelSpacing::default()));
//! let outcome = generalize(&points, &model, 1, &mut CollectingSink::default()).unwrap();
//! assert_eq!(outcome.selected, vec![2, 0]);
//! assert_eq!(outcome.eliminations.len(), 1);
//! ```

#![forbid(unsafe_code)]

use crate::cartography::footprint::{Footprint, FootprintModel};
use crate::core::diagnostics::{Diagnostic, DiagnosticSink};
use crate::core::point_set::VertexStore;
use crate::core::quadtree::{PrQuadtree, SpatialIndexError};
use crate::core::vertex::Vertex;
use crate::geometry::kernel;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

// =============================================================================
// CONFLICT MODELS
// =============================================================================

/// Linear search radius between `start` (shallowest point) and `end`
/// (deepest point), in ground units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadiusLookup {
    /// Radius of the shallowest point.
    pub start: f64,
    /// Radius of the deepest point.
    pub end: f64,
}

impl RadiusLookup {
    /// Lookup from `start` to `end`.
    #[must_use]
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Radius for the point of rank `rank` among `count` points.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sounding_selection::core::algorithms::generalization::RadiusLookup;
    ///
    /// let lookup = RadiusLookup::new(10.0, 50.0);
    /// assert_eq!(lookup.radius(0, 5), 10.0);
    /// assert_eq!(lookup.radius(2, 5), 30.0);
    /// assert_eq!(lookup.radius(4, 5), 50.0);
    /// assert_eq!(lookup.radius(0, 1), 10.0);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn radius(&self, rank: usize, count: usize) -> f64 {
        if count < 2 {
            return self.start;
        }
        let t = rank.min(count - 1) as f64 / (count - 1) as f64;
        (self.end - self.start).mul_add(t, self.start)
    }
}

/// How two points are judged to conflict.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConflictModel {
    /// Printed label overlap.
    Label(FootprintModel),
    /// Distance within a rank-dependent radius.
    Radius(RadiusLookup),
}

// =============================================================================
// WORKING LIST
// =============================================================================

/// Point indices sorted by `(depth, index)` with order-preserving removal.
///
/// Removal locates the entry by binary search and marks it dead, so the
/// sort order of the remaining entries never changes.
#[derive(Clone, Debug)]
pub struct SortedWorkingList {
    entries: Vec<(OrderedFloat<f64>, usize)>,
    alive: Vec<bool>,
    cursor: usize,
    remaining: usize,
}

impl SortedWorkingList {
    /// Sorts every vertex of `vertices`.
    #[must_use]
    pub fn new(vertices: &[Vertex]) -> Self {
        let mut entries: Vec<(OrderedFloat<f64>, usize)> = vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (OrderedFloat(v.depth()), i))
            .collect();
        entries.sort_unstable();
        let n = entries.len();
        Self {
            entries,
            alive: vec![true; n],
            cursor: 0,
            remaining: n,
        }
    }

    /// Indices in sort order, dead entries included.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|&(_, i)| i)
    }

    /// Total number of entries, dead entries included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of live entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.remaining
    }

    /// Returns `true` when no live entry is left.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    fn position(&self, depth: f64, index: usize) -> Option<usize> {
        self.entries.binary_search(&(OrderedFloat(depth), index)).ok()
    }

    /// Returns `true` when `index` (at `depth`) is still live.
    #[must_use]
    pub fn contains(&self, depth: f64, index: usize) -> bool {
        self.position(depth, index).is_some_and(|p| self.alive[p])
    }

    /// Removes `index` (at `depth`). Returns `false` if it was not live.
    pub fn remove(&mut self, depth: f64, index: usize) -> bool {
        match self.position(depth, index) {
            Some(p) if self.alive[p] => {
                self.alive[p] = false;
                self.remaining -= 1;
                true
            }
            _ => false,
        }
    }

    /// Removes and returns the shallowest live entry as `(rank, index)`,
    /// where `rank` is its position in the full sort order.
    pub fn pop_front(&mut self) -> Option<(usize, usize)> {
        while self.cursor < self.entries.len() {
            let rank = self.cursor;
            self.cursor += 1;
            if self.alive[rank] {
                self.alive[rank] = false;
                self.remaining -= 1;
                return Some((rank, self.entries[rank].1));
            }
        }
        None
    }
}

// =============================================================================
// GENERALIZATION
// =============================================================================

/// A point removed in favour of another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Elimination {
    /// The removed point.
    pub eliminated: usize,
    /// The kept point that removed it.
    pub by: usize,
}

/// Result of one generalization run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralizationOutcome {
    /// Kept points in processing (ascending depth) order.
    pub selected: Vec<usize>,
    /// Removed points in removal order.
    pub eliminations: Vec<Elimination>,
    /// Kept points that had no footprint and were never compared.
    pub unsupported: Vec<usize>,
}

/// Eliminates conflicting points of `store` under `model`, shallowest first.
///
/// Exact coordinate duplicates are eliminated by the shallower point at the
/// same position (they never reach the index).
///
/// # Errors
///
/// Returns [`SpatialIndexError`] when the index cannot be built, e.g. for a
/// zero `capacity`.
pub fn generalize<S>(
    store: &S,
    model: &ConflictModel,
    capacity: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<GeneralizationOutcome, SpatialIndexError>
where
    S: VertexStore + ?Sized,
{
    let vertices = store.vertices();
    let mut list = SortedWorkingList::new(vertices);
    let order: Vec<usize> = list.indices().collect();
    let count = list.capacity();
    let (mut tree, duplicates) = PrQuadtree::build(store, order, capacity)?;

    let mut outcome = GeneralizationOutcome::default();
    for (index, kept) in duplicates {
        sink.report(Diagnostic::DuplicateDiscarded {
            index,
            kept,
            point: vertices[index].point(),
        });
        list.remove(vertices[index].depth(), index);
        outcome.eliminations.push(Elimination {
            eliminated: index,
            by: kept,
        });
    }

    let footprints: Vec<Option<Footprint>> = match model {
        ConflictModel::Label(footprint) => footprint.catalog(vertices, sink),
        ConflictModel::Radius(_) => Vec::new(),
    };

    while let Some((rank, t)) = list.pop_front() {
        outcome.selected.push(t);
        let target = &vertices[t];
        let removed = match model {
            ConflictModel::Label(_) => {
                let Some(ft) = footprints[t].as_ref() else {
                    outcome.unsupported.push(t);
                    continue;
                };
                tree.eliminate_in_region(&ft.window, store, |i, v| {
                    i != t
                        && list.contains(v.depth(), i)
                        && footprints[i]
                            .as_ref()
                            .is_some_and(|fv| labels_conflict(target, ft, v, fv))
                })
            }
            ConflictModel::Radius(lookup) => {
                let r = lookup.radius(rank, count);
                let window = kernel::square(target.point(), r);
                tree.eliminate_in_region(&window, store, |i, v| {
                    i != t
                        && list.contains(v.depth(), i)
                        && v.depth() >= target.depth()
                        && v.point().distance_squared(&target.point()) <= r * r
                })
            }
        };
        for i in removed {
            list.remove(vertices[i].depth(), i);
            outcome.eliminations.push(Elimination {
                eliminated: i,
                by: t,
            });
        }
    }

    tracing::debug!(
        kept = outcome.selected.len(),
        eliminated = outcome.eliminations.len(),
        unsupported = outcome.unsupported.len(),
        "generalization finished"
    );
    Ok(outcome)
}

/// Label conflict between kept `target` and candidate `v`.
fn labels_conflict(target: &Vertex, ft: &Footprint, v: &Vertex, fv: &Footprint) -> bool {
    (target.is_hazard() || v.depth() >= target.depth())
        && kernel::polygons_intersect(&ft.label, &fv.label)
}

// =============================================================================
// TESTS
// =============================================================================
