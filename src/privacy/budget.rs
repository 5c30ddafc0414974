//! Privacy budget: per-feature clipping bounds and the epsilon split between
//! the mean and variance computations of a batch.

use crate::preprocessing::error::PreprocessingError;
use serde::{Deserialize, Serialize};

/// Known per-feature value bounds `[low, high]`.
///
/// Noise calibration needs bounds that do not depend on the data, so they
/// must be supplied up front.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl FeatureRange {
    /// Create a range from per-feature lower and upper bounds.
    ///
    /// # Errors
    /// Returns [`PreprocessingError`] if the vectors differ in length, are
    /// empty, contain non-finite bounds, or if `low[i] > high[i]`.
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Result<Self, PreprocessingError> {
        let range = Self { low, high };
        range.validate()?;
        Ok(range)
    }

    /// Same bounds for every one of `n_features` features.
    pub fn uniform(low: f64, high: f64, n_features: usize) -> Result<Self, PreprocessingError> {
        Self::new(vec![low; n_features], vec![high; n_features])
    }

    /// Re-check invariants, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), PreprocessingError> {
        if self.low.len() != self.high.len() {
            return Err(PreprocessingError::InvalidShape {
                expected: format!("{} upper bounds", self.low.len()),
                got: format!("{} upper bounds", self.high.len()),
            });
        }
        if self.low.is_empty() {
            return Err(PreprocessingError::InvalidParameter(
                "range must cover at least one feature".to_string(),
            ));
        }
        for (i, (&lo, &hi)) in self.low.iter().zip(&self.high).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(PreprocessingError::InvalidParameter(format!(
                    "range bounds for feature {i} must be finite, got [{lo}, {hi}]"
                )));
            }
            if lo > hi {
                return Err(PreprocessingError::InvalidParameter(format!(
                    "range for feature {i} has low {lo} above high {hi}"
                )));
            }
        }
        Ok(())
    }

    /// Number of features covered by the range.
    pub fn n_features(&self) -> usize {
        self.low.len()
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    /// `(low, high)` for one feature.
    ///
    /// # Panics
    /// If `feature >= self.n_features()`.
    pub fn bounds(&self, feature: usize) -> (f64, f64) {
        (self.low[feature], self.high[feature])
    }

    /// Fail with [`PreprocessingError::FeatureMismatch`] unless the range
    /// covers exactly `n_features` features.
    pub fn check_features(&self, n_features: usize) -> Result<(), PreprocessingError> {
        if self.n_features() != n_features {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features(),
                got_features: n_features,
            });
        }
        Ok(())
    }
}

/// Reject epsilons that are not strictly positive and finite.
pub fn validate_epsilon(epsilon: f64) -> Result<(), PreprocessingError> {
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(PreprocessingError::InvalidParameter(format!(
            "epsilon must be positive and finite, got {epsilon}"
        )));
    }
    Ok(())
}

/// Epsilon shares charged to the statistics of a single batch.
///
/// The two shares are disjoint and sum to the declared total, so running
/// both computations stays within the total under sequential composition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BudgetSplit {
    /// Epsilon for the mean computation.
    pub mean: f64,
    /// Epsilon for the variance computation, if variance is tracked.
    pub variance: Option<f64>,
}

impl BudgetSplit {
    /// Split `epsilon` for one batch.
    ///
    /// Without variance tracking the mean receives everything; with it the
    /// mean receives half and the variance the remainder.
    pub fn allocate(epsilon: f64, track_variance: bool) -> Self {
        if track_variance {
            let mean = epsilon / 2.0;
            Self {
                mean,
                variance: Some(epsilon - mean),
            }
        } else {
            Self {
                mean: epsilon,
                variance: None,
            }
        }
    }

    /// Total epsilon charged by this split.
    pub fn total(&self) -> f64 {
        self.mean + self.variance.unwrap_or(0.0)
    }
}
