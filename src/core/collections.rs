//! Collection aliases shared across the crate.
//!
//! Index-heavy code (the quadtree, the mesh adjacency, the validators) hashes
//! small integer keys and coordinates it produced itself, so the fast
//! non-cryptographic [`rustc_hash`] hasher is used throughout. Small
//! per-vertex lists (wheel neighbours, incident triangles) live in
//! [`SmallBuffer`]s to stay on the stack for typical vertex degrees.

#![forbid(unsafe_code)]

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// `HashMap` with the Fx hasher.
///
/// Not DoS-resistant: only use with keys the crate itself derives.
///
/// # Examples
///
/// ```rust
/// use sounding_selection::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<usize, f64> = FastHashMap::default();
/// map.insert(3, 12.5);
/// assert_eq!(map.get(&3), Some(&12.5));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// `HashSet` with the Fx hasher.
pub type FastHashSet<T> = FxHashSet<T>;

/// Stack-allocated vector with heap fallback beyond `N` elements.
///
/// # Examples
///
/// ```rust
/// use sounding_selection::core::collections::SmallBuffer;
///
/// let mut ring: SmallBuffer<usize, 8> = SmallBuffer::new();
/// ring.extend([4, 7, 9]);
/// assert!(!ring.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Inline capacity for per-vertex neighbour lists. Interior vertices of a
/// Delaunay mesh have six neighbours on average.
pub const WHEEL_CAPACITY: usize = 8;

/// Neighbour or incident-triangle indices of one mesh vertex.
pub type WheelBuffer = SmallBuffer<usize, WHEEL_CAPACITY>;

/// Creates a [`FastHashMap`] with room for `capacity` entries.
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, rustc_hash::FxBuildHasher)
}

/// Creates a [`FastHashSet`] with room for `capacity` entries.
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, rustc_hash::FxBuildHasher)
}
