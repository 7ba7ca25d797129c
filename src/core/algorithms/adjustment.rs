//! Safety repair of a generalized selection.
//!
//! The repair loop alternates validation and repair until the selection
//! surface is safe:
//!
//! ```text
//! initial selection -> validate -> repair -> re-triangulate -> validate -> ... -> converged
//! ```
//!
//! [`AdjustmentController`] decides after each validation whether to stop,
//! repair again, or give up. Giving up (too many iterations, or no
//! improvement for `plateau_limit` iterations in a row) appends every
//! remaining violation to the selection, so the loop always terminates with
//! a safe selection at the cost of legibility.
//!
//! [`repair`] applies one repair pass: each displayed sounding whose label
//! covers violations is replaced by the shallowest of them, and the
//! violations left over are appended.

#![forbid(unsafe_code)]

use crate::core::algorithms::validation::SafetyViolation;
use crate::cartography::footprint::FootprintModel;
use crate::core::collections::{FastHashSet, fast_hash_set_with_capacity};
use crate::core::vertex::{SelectionRole, Vertex};
use crate::geometry::kernel;
use serde::{Deserialize, Serialize};

/// Default bound on validation passes.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Default number of consecutive non-improving passes tolerated.
pub const DEFAULT_PLATEAU_LIMIT: usize = 3;

// =============================================================================
// CONTROLLER
// =============================================================================

/// What to do after a validation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// No violations remain.
    Converged,
    /// Repair and validate again.
    Repair,
    /// Stop and append the remaining violations.
    ForceAccept,
}

/// Termination policy of the repair loop.
///
/// # Examples
///
/// ```rust
/// use sounding_selection::core::algorithms::adjustment::{AdjustmentController, Decision};
///
/// let mut controller = AdjustmentController::new(50, 2);
/// assert_eq!(controller.observe(4), Decision::Repair);
/// assert_eq!(controller.observe(4), Decision::Repair);
/// assert_eq!(controller.observe(5), Decision::ForceAccept);
/// assert_eq!(controller.history(), &[4, 4, 5]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjustmentController {
    max_iterations: usize,
    plateau_limit: usize,
    history: Vec<usize>,
    best: Option<usize>,
    stalled: usize,
}

impl Default for AdjustmentController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS, DEFAULT_PLATEAU_LIMIT)
    }
}

impl AdjustmentController {
    /// Controller allowing `max_iterations` validation passes and
    /// `plateau_limit` consecutive passes without a new best count.
    #[must_use]
    pub const fn new(max_iterations: usize, plateau_limit: usize) -> Self {
        Self {
            max_iterations,
            plateau_limit,
            history: Vec::new(),
            best: None,
            stalled: 0,
        }
    }

    /// Records the violation count of one validation pass.
    pub fn observe(&mut self, violations: usize) -> Decision {
        self.history.push(violations);
        if violations == 0 {
            return Decision::Converged;
        }
        match self.best {
            Some(best) if violations >= best => self.stalled += 1,
            _ => {
                self.best = Some(violations);
                self.stalled = 0;
            }
        }
        if self.history.len() >= self.max_iterations || self.stalled >= self.plateau_limit {
            tracing::debug!(
                iterations = self.history.len(),
                stalled = self.stalled,
                "repair loop stopping without convergence"
            );
            Decision::ForceAccept
        } else {
            Decision::Repair
        }
    }

    /// Violation counts observed so far.
    #[must_use]
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// Number of validation passes observed.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.history.len()
    }
}

// =============================================================================
// REPAIR
// =============================================================================

/// A source point in the selection and how it got there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectedSounding {
    /// Source point index.
    pub source: usize,
    /// How it entered the selection.
    pub role: SelectionRole,
}

impl SelectedSounding {
    /// Sounding kept by generalization.
    #[must_use]
    pub const fn generalized(source: usize) -> Self {
        Self {
            source,
            role: SelectionRole::Generalized,
        }
    }
}

/// Changes made by one [`repair`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairSummary {
    /// Displayed soundings replaced by a violation.
    pub substituted: usize,
    /// Violations added to the selection.
    pub appended: usize,
}

/// Repairs `selection` against `violations`.
///
/// For every selected sounding, in order, the violations inside its label
/// are absorbed and the shallowest of them is displayed instead. The
/// violations no label absorbed are appended. Violations that are already
/// selected are ignored.
pub fn repair(
    selection: &mut Vec<SelectedSounding>,
    violations: &[SafetyViolation],
    source: &[Vertex],
    model: &FootprintModel,
) -> RepairSummary {
    let mut selected: FastHashSet<usize> = selection.iter().map(|s| s.source).collect();
    let mut open: Vec<usize> = violations
        .iter()
        .map(|v| v.source)
        .filter(|s| !selected.contains(s) && *s < source.len())
        .collect();
    open.sort_unstable();
    open.dedup();

    let mut summary = RepairSummary::default();
    for slot in selection.iter_mut() {
        if open.is_empty() {
            break;
        }
        let Ok(footprint) = model.footprint(&source[slot.source]) else {
            continue;
        };
        let mut absorbed: FastHashSet<usize> = fast_hash_set_with_capacity(open.len());
        let mut shallowest: Option<usize> = None;
        for &v in &open {
            if !kernel::point_in_polygon(&source[v].point(), &footprint.label) {
                continue;
            }
            absorbed.insert(v);
            let shallower = shallowest.is_none_or(|s| source[v].depth() < source[s].depth());
            if shallower {
                shallowest = Some(v);
            }
        }
        let Some(replacement) = shallowest else {
            continue;
        };
        selected.remove(&slot.source);
        selected.insert(replacement);
        *slot = SelectedSounding {
            source: replacement,
            role: SelectionRole::Substituted,
        };
        open.retain(|v| !absorbed.contains(v));
        summary.substituted += 1;
    }

    summary.appended = append(selection, &open, &mut selected);
    summary
}

/// Appends every violation not already selected; returns how many were
/// added.
pub fn force_accept(
    selection: &mut Vec<SelectedSounding>,
    violations: &[SafetyViolation],
) -> usize {
    let mut selected: FastHashSet<usize> = selection.iter().map(|s| s.source).collect();
    let sources: Vec<usize> = violations.iter().map(|v| v.source).collect();
    append(selection, &sources, &mut selected)
}

fn append(
    selection: &mut Vec<SelectedSounding>,
    sources: &[usize],
    selected: &mut FastHashSet<usize>,
) -> usize {
    let before = selection.len();
    for &s in sources {
        if selected.insert(s) {
            selection.push(SelectedSounding {
                source: s,
                role: SelectionRole::Appended,
            });
        }
    }
    selection.len() - before
}

// =============================================================================
// TESTS
// =============================================================================
