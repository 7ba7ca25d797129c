//! End-to-end sounding selection.
//!
//! [`select_soundings`] runs the stages in order:
//!
//! 1. shallowest-first generalization of the source points;
//! 2. triangulation of the selection, constrained by the coverage boundary
//!    when one is given;
//! 3. safety validation against the source points, repaired until the
//!    surface is safe or the repair loop gives up;
//! 4. legibility validation of the final selection;
//! 5. critical-point annotation of the final mesh.
//!
//! Every stage builds its own index and mesh; nothing is shared between
//! stages except the source point set.
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::config::SelectionConfigBuilder;
//! use sounding_selection::core::diagnostics::CollectingSink;
//! use sounding_selection::core::point_set::PointSet;
//! use sounding_selection::core::triangulation::SpadeTriangulator;
//! use sounding_selection::selection::{select_soundings, SelectionInput};
//! use sounding_selection::sounding;
//!
//! let source: PointSet = vec![
//!     sounding!(0.0, 0.0, 5.0),
//!     sounding!(10.0, 0.0, 6.0),
//!     sounding!(0.0, 10.0, 7.0),
//!     sounding!(500.0, 500.0, 4.0),
//!     sounding!(510.0, 500.0, 3.0),
//!     sounding!(500.0, 510.0, 2.0),
//! ]
//! .into();
//! let config = SelectionConfigBuilder::default().scale(20_000_u32).build().unwrap();
//! let report = select_soundings(
//!     &config,
//!     &SelectionInput::new(&source),
//!     &SpadeTriangulator,
//!     &mut CollectingSink::default(),
//! )
//! .unwrap();
//! assert_eq!(report.soundings.len(), 2);
//! assert!(report.legibility_conflicts.is_empty());
//! ```

#![forbid(unsafe_code)]

use crate::core::algorithms::adjustment::{
    AdjustmentController, Decision, SelectedSounding, force_accept, repair,
};
use crate::core::algorithms::critical_points::{CriticalCounts, classify_mesh};
use crate::core::algorithms::generalization::{
    GeneralizationOutcome, SortedWorkingList, generalize,
};
use crate::core::algorithms::validation::{
    DepthArea, LabelConflict, SafetyViolation, legibility_violations, safety_violations,
};
use crate::config::{ConfigError, GeneralizationMethod, SelectionConfig};
use crate::core::diagnostics::{CollectingSink, Diagnostic, DiagnosticSink};
use crate::core::mesh::{Mesh, MeshError};
use crate::core::point_set::{PointSet, VertexStore};
use crate::core::quadtree::{PrQuadtree, SpatialIndexError};
use crate::core::triangulation::{
    Boundary, TriangulationError, TriangulationInput, Triangulator, mesh_from_triangulation,
    triangulate_with_retry,
};
use crate::core::vertex::Vertex;
use geo::Polygon;
use thiserror::Error;

/// Terminal failure of a selection run.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The configuration cannot be run.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The source point set is empty.
    #[error("No source soundings to select from")]
    EmptyInput,
    /// A spatial index contract was violated.
    #[error(transparent)]
    SpatialIndex(#[from] SpatialIndexError),
    /// The triangulation oracle failed.
    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
    /// The oracle produced an invalid mesh.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Data a run reads.
#[derive(Clone, Copy, Debug)]
pub struct SelectionInput<'a> {
    /// Source soundings and hazards.
    pub source: &'a PointSet,
    /// Coverage boundary constraining the triangulation.
    pub boundary: Option<&'a Boundary>,
    /// Depth areas for the direct safety method.
    pub depth_areas: &'a [DepthArea],
}

impl<'a> SelectionInput<'a> {
    /// Input with no boundary and no depth areas.
    #[must_use]
    pub const fn new(source: &'a PointSet) -> Self {
        Self {
            source,
            boundary: None,
            depth_areas: &[],
        }
    }

    /// Adds a coverage boundary.
    #[must_use]
    pub const fn with_boundary(mut self, boundary: &'a Boundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Adds depth areas.
    #[must_use]
    pub const fn with_depth_areas(mut self, areas: &'a [DepthArea]) -> Self {
        self.depth_areas = areas;
        self
    }
}

/// Everything a run produced.
#[derive(Clone, Debug)]
pub struct SelectionReport {
    /// Final selection as source indices with their roles.
    pub selection: Vec<SelectedSounding>,
    /// Final selection as vertices, tagged with their roles.
    pub soundings: Vec<Vertex>,
    /// Result of the generalization stage.
    pub generalization: GeneralizationOutcome,
    /// Safety violations of the first mesh.
    pub initial_violations: Vec<SafetyViolation>,
    /// Safety violations left after adjustment.
    pub safety_violations: Vec<SafetyViolation>,
    /// Overlapping labels in the final selection, as indices into
    /// `soundings`.
    pub legibility_conflicts: Vec<LabelConflict>,
    /// Mesh of the generalized selection.
    pub initial_mesh: Mesh,
    /// Mesh of the final selection, critical vertices tagged.
    pub final_mesh: Mesh,
    /// Critical vertices of the final mesh.
    pub critical: CriticalCounts,
    /// Safety validation passes performed.
    pub iterations: usize,
    /// `true` when the repair loop gave up and appended violations.
    pub forced: bool,
    /// Printed label of each sounding that has one.
    pub labels: Vec<Polygon<f64>>,
}

/// Runs the full selection pipeline.
///
/// # Errors
///
/// Returns [`SelectionError`] for an invalid configuration, an empty input,
/// an index contract violation or an oracle failure.
pub fn select_soundings<T>(
    config: &SelectionConfig,
    input: &SelectionInput<'_>,
    oracle: &T,
    sink: &mut dyn DiagnosticSink,
) -> Result<SelectionReport, SelectionError>
where
    T: Triangulator + ?Sized,
{
    config.validate()?;
    let source = input.source;
    if source.is_empty() {
        return Err(SelectionError::EmptyInput);
    }
    let capacity = config.effective_capacity(source.len());
    let model = config.footprint_model();

    tracing::info!(points = source.len(), capacity, "generalizing source soundings");
    let outcome = generalize(source, &config.conflict_model(), capacity, sink)?;
    let mut selection: Vec<SelectedSounding> = outcome
        .selected
        .iter()
        .map(|&s| SelectedSounding::generalized(s))
        .collect();

    let order: Vec<usize> = SortedWorkingList::new(source.vertices()).indices().collect();
    let (source_tree, _) = PrQuadtree::build(source, order, capacity)?;

    let stage = MeshStage {
        source,
        boundary: input.boundary,
        oracle,
        attempts: config.triangulation_attempts,
    };
    let initial_mesh = stage.triangulate(&selection, sink)?;
    let validate = |mesh: &Mesh| {
        safety_violations(
            config.safety_method,
            mesh,
            source,
            &source_tree,
            input.depth_areas,
        )
    };
    let initial_violations = validate(&initial_mesh);
    tracing::info!(
        selected = selection.len(),
        triangles = initial_mesh.triangle_count(),
        violations = initial_violations.len(),
        "initial selection validated"
    );

    let mut controller =
        AdjustmentController::new(config.max_repair_iterations, config.plateau_limit);
    let mut violations = initial_violations.clone();
    let mut mesh = initial_mesh.clone();
    let mut forced = false;
    loop {
        match controller.observe(violations.len()) {
            Decision::Converged => break,
            Decision::Repair => {
                let summary = repair(&mut selection, &violations, source.vertices(), &model);
                sink.report(Diagnostic::RepairIteration {
                    iteration: controller.iterations(),
                    violations: violations.len(),
                });
                tracing::debug!(
                    substituted = summary.substituted,
                    appended = summary.appended,
                    "repair pass applied"
                );
                mesh = stage.triangulate(&selection, sink)?;
                violations = validate(&mesh);
            }
            Decision::ForceAccept => {
                let accepted = force_accept(&mut selection, &violations);
                sink.report(Diagnostic::ForcedAcceptance {
                    iterations: controller.iterations(),
                    accepted,
                });
                mesh = stage.triangulate(&selection, sink)?;
                violations = validate(&mesh);
                forced = true;
                break;
            }
        }
    }

    let soundings: Vec<Vertex> = selection
        .iter()
        .map(|s| Vertex::adopted_as(&source.vertices()[s.source], s.role))
        .collect();
    let selected_set: PointSet = soundings.iter().copied().collect();
    let (selected_tree, _) = PrQuadtree::build(
        &selected_set,
        0..selected_set.len(),
        config.effective_capacity(selected_set.len()),
    )?;
    let mut catalog_sink = CollectingSink::default();
    let footprints = model.catalog(selected_set.vertices(), &mut catalog_sink);
    if matches!(config.generalization, GeneralizationMethod::Radius { .. }) {
        // Label generalization already reported these against source indices.
        for diagnostic in catalog_sink.into_diagnostics() {
            sink.report(to_source_index(diagnostic, &selection));
        }
    }
    let legibility_conflicts = legibility_violations(&selected_set, &selected_tree, &footprints);
    let labels: Vec<Polygon<f64>> = footprints.into_iter().flatten().map(|fp| fp.label).collect();

    let mut final_mesh = mesh;
    let mesh_tree = PrQuadtree::build_mesh(
        &final_mesh,
        config.effective_capacity(final_mesh.len()),
    )?;
    let critical = classify_mesh(&mut final_mesh, &mesh_tree);

    tracing::info!(
        selected = soundings.len(),
        safety_violations = violations.len(),
        legibility_violations = legibility_conflicts.len(),
        iterations = controller.iterations(),
        forced,
        "selection finished"
    );

    Ok(SelectionReport {
        selection,
        soundings,
        generalization: outcome,
        initial_violations,
        safety_violations: violations,
        legibility_conflicts,
        initial_mesh,
        final_mesh,
        critical,
        iterations: controller.iterations(),
        forced,
        labels,
    })
}

/// Triangulates selections against a fixed source and boundary.
struct MeshStage<'a, T: ?Sized> {
    source: &'a PointSet,
    boundary: Option<&'a Boundary>,
    oracle: &'a T,
    attempts: usize,
}

impl<T> MeshStage<'_, T>
where
    T: Triangulator + ?Sized,
{
    fn triangulate(
        &self,
        selection: &[SelectedSounding],
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Mesh, SelectionError> {
        let vertices: Vec<Vertex> = selection
            .iter()
            .map(|s| Vertex::adopted_as(&self.source.vertices()[s.source], s.role))
            .collect();
        let points = vertices.iter().map(Vertex::point);
        let request = match self.boundary {
            Some(boundary) if !boundary.is_empty() => TriangulationInput::constrained(boundary, points),
            _ => TriangulationInput::unconstrained(points.collect()),
        };
        let raw = triangulate_with_retry(self.oracle, &request, self.attempts, sink)?;
        // Measured depths win over boundary sentinels at shared positions.
        let boundary_vertices = self.boundary.map_or(&[][..], |b| b.vertices.as_slice());
        Ok(mesh_from_triangulation(
            &raw,
            vertices.iter().chain(boundary_vertices),
        )?)
    }
}

fn to_source_index(diagnostic: Diagnostic, selection: &[SelectedSounding]) -> Diagnostic {
    let source = |i: usize| selection.get(i).map_or(i, |s| s.source);
    match diagnostic {
        Diagnostic::UnsupportedLabel {
            index,
            depth,
            characters,
        } => Diagnostic::UnsupportedLabel {
            index: source(index),
            depth,
            characters,
        },
        Diagnostic::UnsupportedHazard { index, feature } => Diagnostic::UnsupportedHazard {
            index: source(index),
            feature,
        },
        other => other,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionConfigBuilder;
    use crate::core::triangulation::SpadeTriangulator;
    use crate::core::vertex::{Classification, SelectionRole};
    use crate::sounding;

    fn config() -> SelectionConfig {
        SelectionConfigBuilder::default()
            .scale(20_000_u32)
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let source = PointSet::new();
        let result = select_soundings(
            &config(),
            &SelectionInput::new(&source),
            &SpadeTriangulator,
            &mut CollectingSink::default(),
        );
        assert!(matches!(result, Err(SelectionError::EmptyInput)));
    }

    #[test]
    fn test_invalid_config_is_rejected_before_processing() {
        let source: PointSet = vec![sounding!(0.0, 0.0, 1.0)].into();
        let bad = SelectionConfigBuilder::default()
            .scale(12_u32)
            .build()
            .unwrap();
        let result = select_soundings(
            &bad,
            &SelectionInput::new(&source),
            &SpadeTriangulator,
            &mut CollectingSink::default(),
        );
        assert!(matches!(
            result,
            Err(SelectionError::Config(ConfigError::UnsupportedScale { scale: 12 }))
        ));
    }

    #[test]
    fn test_spread_out_points_are_all_kept() {
        let source: PointSet = vec![
            sounding!(0.0, 0.0, 5.0),
            sounding!(1_000.0, 0.0, 6.0),
            sounding!(0.0, 1_000.0, 7.0),
            sounding!(1_000.0, 1_000.0, 8.0),
        ]
        .into();
        let mut sink = CollectingSink::default();
        let report = select_soundings(&config(), &SelectionInput::new(&source), &SpadeTriangulator, &mut sink)
            .unwrap();
        assert_eq!(report.soundings.len(), 4);
        assert!(report.safety_violations.is_empty());
        assert_eq!(report.iterations, 1);
        assert!(!report.forced);
        assert_eq!(report.final_mesh.triangle_count(), 2);
        assert_eq!(report.labels.len(), 4);
        assert!(
            report
                .soundings
                .iter()
                .all(|v| v.classification() == Classification::Selected(SelectionRole::Generalized))
        );
    }

    #[test]
    fn test_eliminated_shoal_is_restored() {
        // The 3 m sounding loses to the 2 m one but falls in the triangle of
        // the 9 m soundings, whose surface is deeper than it.
        let source: PointSet = vec![
            sounding!(0.0, 0.0, 2.0),
            sounding!(-40.0, 0.0, 3.0),
            sounding!(-30.0, -75.0, 9.0),
            sounding!(-30.0, 75.0, 9.0),
            sounding!(-3_000.0, 0.0, 9.0),
        ]
        .into();
        let mut sink = CollectingSink::default();
        let report = select_soundings(&config(), &SelectionInput::new(&source), &SpadeTriangulator, &mut sink)
            .unwrap();

        assert_eq!(report.generalization.selected, vec![0, 2, 3, 4]);
        assert_eq!(report.initial_violations.len(), 1);
        assert_eq!(report.initial_violations[0].source, 1);
        assert!(report.safety_violations.is_empty());
        assert_eq!(report.iterations, 2);
        assert!(!report.forced);
        assert_eq!(
            report.selection[0],
            SelectedSounding {
                source: 1,
                role: SelectionRole::Substituted
            }
        );
        assert_eq!(
            sink.count(|d| matches!(d, Diagnostic::RepairIteration { .. })),
            1
        );
    }
}
