//! # sounding-selection
//!
//! Label-aware, hydrographically safe sounding selection for nautical chart
//! production.
//!
//! Given a dense bathymetric survey (soundings plus hazard points), the
//! library picks the subset that can be printed at a chart scale without
//! overlapping labels, while keeping the surface implied by the printed
//! depths no deeper than the survey anywhere.
//!
//! # Features
//!
//! - PR-quadtree spatial index with half-open ownership and polygon queries
//! - Depth-label and hazard-symbol footprints for twelve chart scales
//! - Shallowest-first generalization by label overlap or by radius
//! - Constrained Delaunay triangulation through a pluggable oracle
//!   (backed by [spade](https://docs.rs/spade) by default)
//! - Safety validation by direct comparison or by surface tolerance
//! - Bounded safety repair with forced acceptance
//! - Critical-point (pit, peak, saddle) annotation of the final surface
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use sounding_selection::prelude::*;
//!
//! let source: PointSet = vec![
//!     sounding!(0.0, 0.0, 5.0),
//!     sounding!(10.0, 0.0, 6.0),      // hidden by the label of the 5
//!     sounding!(1_000.0, 0.0, 7.0),
//!     sounding!(0.0, 1_000.0, 8.0),
//!     sounding!(1_000.0, 1_000.0, 9.0),
//! ]
//! .into();
//!
//! let config = SelectionConfigBuilder::default()
//!     .scale(20_000_u32)
//!     .build()
//!     .unwrap();
//! let mut sink = CollectingSink::default();
//! let report = select_soundings(
//!     &config,
//!     &SelectionInput::new(&source),
//!     &SpadeTriangulator,
//!     &mut sink,
//! )
//! .unwrap();
//!
//! assert_eq!(report.soundings.len(), 4);
//! assert!(report.safety_violations.is_empty());
//! assert!(report.legibility_conflicts.is_empty());
//! ```
//!
//! # Guarantees
//!
//! - **Shallowest wins** – a sounding is only ever hidden by a sounding at
//!   the same depth or shallower, or by a hazard.
//! - **Determinism** – ties on depth are broken by input order; the same
//!   input always yields the same selection.
//! - **Termination** – the repair loop is bounded by
//!   [`max_repair_iterations`](config::SelectionConfig::max_repair_iterations)
//!   and by a plateau limit; when it gives up, every remaining violation is
//!   added to the selection.
//! - **Exact duplicates** – coincident points are indexed once; the rest are
//!   reported through [`Diagnostic::DuplicateDiscarded`](core::diagnostics::Diagnostic::DuplicateDiscarded).
//!
//! Points whose label has no catalogued footprint stay in the selection and
//! are reported; they take no part in label comparisons.

// Allow multiple crate versions due to transitive dependencies
#![allow(clippy::multiple_crate_versions)]
#![forbid(unsafe_code)]

/// Geometric primitives: points, domains and the planar kernel.
pub mod geometry {
    pub mod domain;
    /// Planar predicates and polygon helpers on top of `geo`
    pub mod kernel;
    pub mod point;
    pub use domain::*;
    pub use point::*;
}

/// Core data structures: vertices, point sets, meshes and the spatial index.
pub mod core {
    /// Selection stages
    pub mod algorithms {
        /// Safety repair loop
        pub mod adjustment;
        /// Pit, peak and saddle classification
        pub mod critical_points;
        /// Shallowest-first point elimination
        pub mod generalization;
        /// Safety and legibility checks
        pub mod validation;
    }
    /// High-performance collection types
    pub mod collections;
    /// Non-fatal conditions raised during a run
    pub mod diagnostics;
    pub mod mesh;
    pub mod point_set;
    /// Point-region quadtree
    pub mod quadtree;
    /// Triangulation oracle seam and the spade-backed oracle
    pub mod triangulation;
    pub mod vertex;
    // Re-export the `core` modules.
    pub use diagnostics::*;
    pub use mesh::*;
    pub use point_set::*;
    pub use quadtree::*;
    pub use triangulation::*;
    pub use vertex::*;
    // Note: collections module not re-exported here to avoid namespace pollution
}

/// Chart symbology: label footprints and depth tolerances.
pub mod cartography {
    pub mod accuracy;
    pub mod footprint;
}

pub mod config;
pub mod io;
pub mod selection;

/// A prelude module that re-exports commonly used types and macros.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        diagnostics::*, mesh::*, point_set::*, quadtree::*, triangulation::*, vertex::*,
    };

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    // Re-export from geometry
    pub use crate::geometry::{domain::*, point::*};

    pub use crate::core::algorithms::{
        adjustment::{AdjustmentController, Decision, SelectedSounding},
        critical_points::{CriticalCounts, classify_mesh, classify_vertex},
        generalization::{
            ConflictModel, Elimination, GeneralizationOutcome, RadiusLookup, generalize,
        },
        validation::{
            DepthArea, LabelConflict, SafetyMethod, SafetyViolation, legibility_violations,
            safety_violations,
        },
    };
    pub use crate::cartography::footprint::{Footprint, FootprintModel, LabelSpacing};
    pub use crate::config::{GeneralizationMethod, SelectionConfig, SelectionConfigBuilder};
    pub use crate::selection::{SelectionError, SelectionInput, SelectionReport, select_soundings};

    // Convenience macros
    pub use crate::sounding;
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{mesh::Mesh, point_set::PointSet, quadtree::PrQuadtree, vertex::Vertex},
        geometry::point::Point,
        is_normal,
        selection::SelectionReport,
    };

    // =============================================================================
    // TYPE SAFETY TESTS
    // =============================================================================

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point>());
        assert!(is_normal::<Vertex>());
        assert!(is_normal::<PointSet>());
        assert!(is_normal::<Mesh>());
        assert!(is_normal::<PrQuadtree>());
        assert!(is_normal::<SelectionReport>());
    }

    #[test]
    fn test_prelude_collections_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<u64, usize> = FastHashMap::default();
        map.insert(123, 456);
        assert_eq!(map.get(&123), Some(&456));

        let mut set: FastHashSet<u64> = FastHashSet::default();
        set.insert(789);
        assert!(set.contains(&789));

        let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
        buffer.push(42);
        assert_eq!(buffer.len(), 1);

        let map_with_cap = fast_hash_map_with_capacity::<u64, usize>(100);
        assert!(map_with_cap.capacity() >= 100);

        let set_with_cap = fast_hash_set_with_capacity::<u64>(50);
        assert!(set_with_cap.capacity() >= 50);
    }

    #[test]
    fn test_prelude_pipeline_exports() {
        use crate::prelude::*;

        let source: PointSet = vec![sounding!(0.0, 0.0, 1.0), sounding!(5.0, 0.0, 2.0)].into();
        let model = FootprintModel::new(20_000.0, LabelSpacing::default());
        let outcome = generalize(
            &source,
            &ConflictModel::Label(model),
            1,
            &mut CollectingSink::default(),
        )
        .unwrap();
        assert_eq!(outcome.selected, vec![0]);
    }
}
