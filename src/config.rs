//! Run configuration.
//!
//! [`SelectionConfig`] carries every parameter of a selection run. It is
//! built with [`SelectionConfigBuilder`]; only the chart scale is required.
//! [`SelectionConfig::validate`] rejects configurations that cannot be run
//! and is called by the pipeline before any processing.
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::config::{GeneralizationMethod, SelectionConfigBuilder};
//!
//! let config = SelectionConfigBuilder::default()
//!     .scale(20_000_u32)
//!     .generalization(GeneralizationMethod::Radius { start: 10.0, end: 40.0 })
//!     .build()
//!     .unwrap();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.horizontal_spacing_mm, 0.75);
//! assert_eq!(config.effective_capacity(10_000), 4);
//! ```

#![forbid(unsafe_code)]

use crate::core::algorithms::adjustment::{DEFAULT_MAX_ITERATIONS, DEFAULT_PLATEAU_LIMIT};
use crate::core::algorithms::generalization::{ConflictModel, RadiusLookup};
use crate::core::algorithms::validation::SafetyMethod;
use crate::cartography::footprint::{DEFAULT_SPACING_MM, FootprintModel, LabelSpacing};
use crate::core::triangulation::DEFAULT_ATTEMPTS;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chart scale denominators with a calibrated label catalog.
pub const SUPPORTED_SCALES: [u32; 12] = [
    10_000, 15_000, 20_000, 25_000, 40_000, 80_000, 160_000, 320_000, 640_000, 1_280_000,
    2_560_000, 5_120_000,
];

/// Points per leaf when no capacity is configured, as a fraction of the
/// source size (1 / 2500 = 0.0004).
const POINTS_PER_CAPACITY_UNIT: usize = 2_500;

/// Fatal configuration errors.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The scale has no label catalog.
    #[error("Unsupported chart scale 1:{scale}")]
    UnsupportedScale {
        /// Requested scale denominator.
        scale: u32,
    },
    /// Label spacing must be finite and non-negative.
    #[error("Invalid label spacing: horizontal {horizontal} mm, vertical {vertical} mm")]
    InvalidSpacing {
        /// Horizontal spacing.
        horizontal: f64,
        /// Vertical spacing.
        vertical: f64,
    },
    /// An explicit leaf capacity of zero.
    #[error("Leaf capacity must be at least 1")]
    ZeroCapacity,
    /// Radius generalization needs `0 <= start <= end`, both finite.
    #[error("Invalid radius range {start}..{end}")]
    InvalidRadius {
        /// Radius of the shallowest point.
        start: f64,
        /// Radius of the deepest point.
        end: f64,
    },
    /// A loop bound of zero.
    #[error("{field} must be at least 1")]
    ZeroLimit {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The builder could not produce a configuration.
    #[error("Incomplete configuration: {message}")]
    Incomplete {
        /// Builder error message.
        message: String,
    },
}

impl From<SelectionConfigBuilderError> for ConfigError {
    fn from(err: SelectionConfigBuilderError) -> Self {
        Self::Incomplete {
            message: err.to_string(),
        }
    }
}

/// Point elimination strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum GeneralizationMethod {
    /// Label overlap at chart scale.
    #[default]
    Label,
    /// Rank-dependent radius in ground units.
    Radius {
        /// Radius of the shallowest point.
        start: f64,
        /// Radius of the deepest point.
        end: f64,
    },
}

/// Parameters of a selection run.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Chart scale denominator.
    #[builder(setter(into))]
    pub scale: u32,
    /// Horizontal character spacing in millimetres.
    #[builder(default = "DEFAULT_SPACING_MM")]
    pub horizontal_spacing_mm: f64,
    /// Vertical character spacing in millimetres.
    #[builder(default = "DEFAULT_SPACING_MM")]
    pub vertical_spacing_mm: f64,
    /// Point elimination strategy.
    #[builder(default)]
    pub generalization: GeneralizationMethod,
    /// Safety validation method.
    #[builder(default)]
    pub safety_method: SafetyMethod,
    /// Quadtree leaf capacity; derived from the input size when unset.
    #[builder(setter(strip_option), default)]
    pub leaf_capacity: Option<usize>,
    /// Attempts allowed per triangulation.
    #[builder(default = "DEFAULT_ATTEMPTS")]
    pub triangulation_attempts: usize,
    /// Bound on safety validation passes.
    #[builder(default = "DEFAULT_MAX_ITERATIONS")]
    pub max_repair_iterations: usize,
    /// Consecutive non-improving passes before forced acceptance.
    #[builder(default = "DEFAULT_PLATEAU_LIMIT")]
    pub plateau_limit: usize,
}

impl SelectionConfig {
    /// Checks that the configuration can be run.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_SCALES.contains(&self.scale) {
            return Err(ConfigError::UnsupportedScale { scale: self.scale });
        }
        let spacing_ok = |s: f64| s.is_finite() && s >= 0.0;
        if !spacing_ok(self.horizontal_spacing_mm) || !spacing_ok(self.vertical_spacing_mm) {
            return Err(ConfigError::InvalidSpacing {
                horizontal: self.horizontal_spacing_mm,
                vertical: self.vertical_spacing_mm,
            });
        }
        if self.leaf_capacity == Some(0) {
            return Err(ConfigError::ZeroCapacity);
        }
        if let GeneralizationMethod::Radius { start, end } = self.generalization {
            if !(start.is_finite() && end.is_finite() && 0.0 <= start && start <= end) {
                return Err(ConfigError::InvalidRadius { start, end });
            }
        }
        for (field, value) in [
            ("triangulation_attempts", self.triangulation_attempts),
            ("max_repair_iterations", self.max_repair_iterations),
            ("plateau_limit", self.plateau_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroLimit { field });
            }
        }
        Ok(())
    }

    /// Leaf capacity for an index over `points` points.
    #[must_use]
    pub fn effective_capacity(&self, points: usize) -> usize {
        self.leaf_capacity
            .unwrap_or_else(|| (points / POINTS_PER_CAPACITY_UNIT).max(1))
    }

    /// Label spacing.
    #[must_use]
    pub const fn spacing(&self) -> LabelSpacing {
        LabelSpacing {
            horizontal_mm: self.horizontal_spacing_mm,
            vertical_mm: self.vertical_spacing_mm,
        }
    }

    /// Footprint catalog at the configured scale and spacing.
    #[must_use]
    pub fn footprint_model(&self) -> FootprintModel {
        FootprintModel::new(f64::from(self.scale), self.spacing())
    }

    /// Conflict model of the configured generalization.
    #[must_use]
    pub fn conflict_model(&self) -> ConflictModel {
        match self.generalization {
            GeneralizationMethod::Label => ConflictModel::Label(self.footprint_model()),
            GeneralizationMethod::Radius { start, end } => {
                ConflictModel::Radius(RadiusLookup::new(start, end))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SelectionConfigBuilder {
        let mut builder = SelectionConfigBuilder::default();
        builder.scale(20_000_u32);
        builder
    }

    #[test]
    fn test_defaults() {
        let config = base().build().unwrap();
        assert_eq!(config.generalization, GeneralizationMethod::Label);
        assert_eq!(config.safety_method, SafetyMethod::Direct);
        assert_eq!(config.leaf_capacity, None);
        assert_eq!(config.triangulation_attempts, 5);
        assert_eq!(config.max_repair_iterations, 50);
        assert_eq!(config.plateau_limit, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scale_is_required() {
        let err: ConfigError = SelectionConfigBuilder::default().build().unwrap_err().into();
        assert!(matches!(err, ConfigError::Incomplete { .. }));
    }

    #[test]
    fn test_rejections() {
        let config = base().scale(12_345_u32).build().unwrap();
        assert_eq!(config.validate(), Err(ConfigError::UnsupportedScale { scale: 12_345 }));

        let config = base().leaf_capacity(0).build().unwrap();
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));

        let config = base().horizontal_spacing_mm(-1.0).build().unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSpacing { .. })));

        let config = base()
            .generalization(GeneralizationMethod::Radius { start: 5.0, end: 1.0 })
            .build()
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRadius { .. })));

        let config = base().plateau_limit(0_usize).build().unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroLimit {
                field: "plateau_limit"
            })
        );
    }

    #[test]
    fn test_effective_capacity() {
        let config = base().build().unwrap();
        assert_eq!(config.effective_capacity(0), 1);
        assert_eq!(config.effective_capacity(2_499), 1);
        assert_eq!(config.effective_capacity(25_000), 10);
        let fixed = base().leaf_capacity(7).build().unwrap();
        assert_eq!(fixed.effective_capacity(1_000_000), 7);
    }
}
