//! Depth tolerances by zone-of-confidence category.
//!
//! The surface safety check accepts an interpolated depth that is deeper
//! than the measured one by at most the vertical uncertainty of the
//! surrounding data. Categories `D` and `U` carry no usable bound.
//!
//! | category | tolerance (m) |
//! |---|---|
//! | A1 | 0.5 + 0.01·d |
//! | A2, B | 1.0 + 0.02·d |
//! | C | 2.0 + 0.05·d |
//! | D, U | none |

#![forbid(unsafe_code)]

use crate::core::vertex::AccuracyCategory;

/// Vertical tolerance at `depth` for `category`, `None` when the category
/// is unassessed or unreliable.
///
/// # Examples
///
/// ```rust
/// use sounding_selection::cartography::accuracy::depth_tolerance;
/// use sounding_selection::core::vertex::AccuracyCategory;
///
/// assert_eq!(depth_tolerance(AccuracyCategory::A1, 10.0), Some(0.6));
/// assert_eq!(depth_tolerance(AccuracyCategory::U, 10.0), None);
/// ```
#[must_use]
pub fn depth_tolerance(category: AccuracyCategory, depth: f64) -> Option<f64> {
    let (fixed, proportional) = match category {
        AccuracyCategory::A1 => (0.5, 0.01),
        AccuracyCategory::A2 | AccuracyCategory::B => (1.0, 0.02),
        AccuracyCategory::C => (2.0, 0.05),
        AccuracyCategory::D | AccuracyCategory::U => return None,
    };
    Some(depth.mul_add(proportional, fixed))
}

/// Worst known category among `categories`, or [`AccuracyCategory::U`] when
/// none is known.
#[must_use]
pub fn worst_category<I>(categories: I) -> AccuracyCategory
where
    I: IntoIterator<Item = Option<AccuracyCategory>>,
{
    categories
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(AccuracyCategory::U)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tolerance_table() {
        assert_relative_eq!(depth_tolerance(AccuracyCategory::A2, 50.0).unwrap(), 2.0);
        assert_relative_eq!(depth_tolerance(AccuracyCategory::B, 50.0).unwrap(), 2.0);
        assert_relative_eq!(depth_tolerance(AccuracyCategory::C, 20.0).unwrap(), 3.0);
        assert!(depth_tolerance(AccuracyCategory::D, 5.0).is_none());
    }

    #[test]
    fn test_worst_category() {
        let worst = worst_category([Some(AccuracyCategory::A1), None, Some(AccuracyCategory::C)]);
        assert_eq!(worst, AccuracyCategory::C);
        assert_eq!(worst_category([None, None, None]), AccuracyCategory::U);
    }
}
