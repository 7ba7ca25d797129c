//! Caller-supplied diagnostic sinks.
//!
//! Reportable, non-fatal conditions (an unsupported label width, a
//! triangulation retry, a forced acceptance at the end of the repair loop)
//! are handed to a [`DiagnosticSink`] passed into each stage rather than to a
//! process-wide logger. [`TracingSink`] forwards them to `tracing`;
//! [`CollectingSink`] keeps them for inspection.
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::core::diagnostics::{CollectingSink, Diagnostic, DiagnosticSink};
//!
//! let mut sink = CollectingSink::default();
//! sink.report(Diagnostic::TriangulationRetry { attempt: 1, message: "robust mode failed".into() });
//! assert_eq!(sink.diagnostics().len(), 1);
//! assert_eq!(sink.count(|d| matches!(d, Diagnostic::TriangulationRetry { .. })), 1);
//! ```

#![forbid(unsafe_code)]

use crate::geometry::point::Point;
use serde::Serialize;
use std::fmt;

/// A reportable condition raised during a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Diagnostic {
    /// The depth label of a sounding has no catalogued footprint; the
    /// sounding is left out of label comparisons.
    UnsupportedLabel {
        /// Vertex index.
        index: usize,
        /// Depth of the sounding.
        depth: f64,
        /// Characters the printed label would need.
        characters: usize,
    },
    /// A hazard point has no catalogued symbol.
    UnsupportedHazard {
        /// Vertex index.
        index: usize,
        /// Description of the feature.
        feature: String,
    },
    /// An exact coordinate duplicate was discarded by the spatial index.
    DuplicateDiscarded {
        /// The discarded vertex.
        index: usize,
        /// The vertex kept at the same position.
        kept: usize,
        /// Shared position.
        point: Point,
    },
    /// The triangulation oracle failed and is being retried.
    TriangulationRetry {
        /// One-based attempt that failed.
        attempt: usize,
        /// Oracle error message.
        message: String,
    },
    /// One pass of the safety repair loop finished.
    RepairIteration {
        /// One-based iteration number.
        iteration: usize,
        /// Violations found before repairing.
        violations: usize,
    },
    /// The repair loop stopped early and appended the remaining violations.
    ForcedAcceptance {
        /// Iterations performed.
        iterations: usize,
        /// Violations accepted into the selection.
        accepted: usize,
    },
}

impl Diagnostic {
    /// Returns `true` for conditions worth a warning.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedLabel { .. } | Self::UnsupportedHazard { .. } | Self::ForcedAcceptance { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedLabel {
                index,
                depth,
                characters,
            } => write!(
                f,
                "Depth label not assigned: vertex {index} (depth {depth}) needs {characters} characters"
            ),
            Self::UnsupportedHazard { index, feature } => {
                write!(f, "Hazard symbol not assigned: vertex {index} ({feature})")
            }
            Self::DuplicateDiscarded { index, kept, point } => {
                write!(f, "Vertex {index} duplicates vertex {kept} at {point}; discarded")
            }
            Self::TriangulationRetry { attempt, message } => {
                write!(f, "Triangulation attempt {attempt} failed: {message}")
            }
            Self::RepairIteration {
                iteration,
                violations,
            } => write!(f, "Repair iteration {iteration}: {violations} safety violations"),
            Self::ForcedAcceptance {
                iterations,
                accepted,
            } => write!(
                f,
                "Repair stopped after {iterations} iterations; {accepted} violations appended to the selection"
            ),
        }
    }
}

/// Receiver of [`Diagnostic`]s.
pub trait DiagnosticSink {
    /// Records one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`: warnings at `WARN`, the rest at
/// `DEBUG`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_warning() {
            tracing::warn!("{diagnostic}");
        } else {
            tracing::debug!("{diagnostic}");
        }
    }
}

/// Stores every diagnostic in order.
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    /// All diagnostics received so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of diagnostics matching `predicate`.
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Diagnostic) -> bool,
    {
        self.diagnostics.iter().filter(|d| predicate(d)).count()
    }

    /// Consumes the sink.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_levels() {
        let label = Diagnostic::UnsupportedLabel {
            index: 3,
            depth: 1234.0,
            characters: 4,
        };
        assert!(label.is_warning());
        assert!(label.to_string().starts_with("Depth label not assigned"));
        let retry = Diagnostic::TriangulationRetry {
            attempt: 2,
            message: "boom".to_string(),
        };
        assert!(!retry.is_warning());
    }

    #[test]
    fn test_tracing_sink_accepts_everything() {
        let mut sink = TracingSink;
        sink.report(Diagnostic::RepairIteration {
            iteration: 1,
            violations: 4,
        });
        sink.report(Diagnostic::ForcedAcceptance {
            iterations: 50,
            accepted: 2,
        });
    }

    #[test]
    fn test_collecting_sink_keeps_order() {
        let mut sink = CollectingSink::default();
        for iteration in 1..=3 {
            sink.report(Diagnostic::RepairIteration {
                iteration,
                violations: 10 - iteration,
            });
        }
        let iterations: Vec<usize> = sink
            .into_diagnostics()
            .into_iter()
            .filter_map(|d| match d {
                Diagnostic::RepairIteration { iteration, .. } => Some(iteration),
                _ => None,
            })
            .collect();
        assert_eq!(iterations, vec![1, 2, 3]);
    }
}
