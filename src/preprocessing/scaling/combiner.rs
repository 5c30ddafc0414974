//! Incremental combination of per-feature mean, variance and count.
//!
//! Two summaries computed over disjoint sets of samples are merged into the
//! summary of their union with the parallel update of Chan, Golub and LeVeque
//! ("Algorithms for computing the sample variance: analysis and
//! recommendations", The American Statistician 37(3), 1983):
//!
//! ```text
//! n      = n_a + n_b
//! mean   = (n_a * mean_a + n_b * mean_b) / n
//! r      = n_a / n_b
//! M2     = M2_a + M2_b + (r / n) * (sum_a / r - sum_b)^2
//! var    = M2 / n
//! ```
//!
//! where `M2 = var * count` is the unnormalised variance. Raw samples are never
//! revisited, so each batch only has to be summarised once.
//!
//! Every feature is merged on its own: counts may differ between features
//! when batches contain missing values.

use crate::preprocessing::error::PreprocessingError;
use ndarray::Array1;
use tracing::warn;

/// Per-feature running summary of every sample seen so far.
///
/// `variance` is `None` when variance is not tracked. A feature whose count
/// is zero has an undefined mean and variance, reported as `NaN`.
#[derive(Clone, Debug, PartialEq)]
pub struct RunningStatistics {
    mean: Array1<f64>,
    variance: Option<Array1<f64>>,
    count: Array1<u64>,
}

impl RunningStatistics {
    /// # Errors
    /// Returns [`PreprocessingError::InvalidShape`] unless all vectors have
    /// the same length.
    pub fn new(
        mean: Array1<f64>,
        variance: Option<Array1<f64>>,
        count: Array1<u64>,
    ) -> Result<Self, PreprocessingError> {
        let n = mean.len();
        let var_len = variance.as_ref().map_or(n, |v| v.len());
        if count.len() != n || var_len != n {
            return Err(PreprocessingError::InvalidShape {
                expected: format!("{n} entries per statistic"),
                got: format!("{} counts and {} variances", count.len(), var_len),
            });
        }
        Ok(Self {
            mean,
            variance,
            count,
        })
    }

    /// Summary of zero samples.
    pub fn empty(n_features: usize, track_variance: bool) -> Self {
        Self {
            mean: Array1::zeros(n_features),
            variance: track_variance.then(|| Array1::zeros(n_features)),
            count: Array1::zeros(n_features),
        }
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn variance(&self) -> Option<&Array1<f64>> {
        self.variance.as_ref()
    }

    pub fn count(&self) -> &Array1<u64> {
        &self.count
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Whether variance is tracked.
    pub fn tracks_variance(&self) -> bool {
        self.variance.is_some()
    }

    /// Indices of features that have not been observed yet.
    pub fn unobserved_features(&self) -> Vec<usize> {
        self.count
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == 0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Summary of the union of the samples behind `self` and `other`.
    ///
    /// Used to fold a batch into the running state, and to merge the states
    /// of estimators fed by separate workers.
    pub fn merge(&self, other: &RunningStatistics) -> Result<RunningStatistics, PreprocessingError> {
        combine(self, other)
    }
}

/// One feature's merged `(mean, variance, count)`.
fn combine_feature(
    (mean_old, var_old, count_old): (f64, Option<f64>, u64),
    (mean_new, var_new, count_new): (f64, Option<f64>, u64),
) -> Result<(f64, Option<f64>, u64), PreprocessingError> {
    let count = count_old.checked_add(count_new).ok_or_else(|| {
        PreprocessingError::NumericalError("sample count overflow".to_string())
    })?;
    let (n_old, n_new, n) = (count_old as f64, count_new as f64, count as f64);

    // A side without samples contributes nothing, even if its mean is NaN.
    let sum_old = if count_old == 0 { 0.0 } else { mean_old * n_old };
    let sum_new = if count_new == 0 { 0.0 } else { mean_new * n_new };

    let mean = if count == 0 {
        f64::NAN
    } else {
        (sum_old + sum_new) / n
    };

    let var = match (var_old, var_new) {
        (Some(var_old), Some(var_new)) => {
            let unnorm = if count_old == 0 && count_new == 0 {
                0.0
            } else if count_old == 0 {
                var_new * n_new
            } else if count_new == 0 {
                var_old * n_old
            } else {
                let ratio = n_old / n_new;
                var_old * n_old
                    + var_new * n_new
                    + ratio / n * (sum_old / ratio - sum_new).powi(2)
            };
            Some(if count == 0 { f64::NAN } else { unnorm / n })
        }
        _ => None,
    };

    Ok((mean, var, count))
}

/// Merge `batch` into `prior`.
///
/// # Errors
/// - [`PreprocessingError::FeatureMismatch`] if the feature counts differ.
/// - [`PreprocessingError::InvalidParameter`] if only one side tracks variance.
/// - [`PreprocessingError::NumericalError`] on count overflow.
pub fn combine(
    prior: &RunningStatistics,
    batch: &RunningStatistics,
) -> Result<RunningStatistics, PreprocessingError> {
    if prior.n_features() != batch.n_features() {
        return Err(PreprocessingError::FeatureMismatch {
            expected_features: prior.n_features(),
            got_features: batch.n_features(),
        });
    }
    if prior.tracks_variance() != batch.tracks_variance() {
        return Err(PreprocessingError::InvalidParameter(
            "cannot merge statistics with and without variance".to_string(),
        ));
    }

    let n_features = prior.n_features();
    let mut mean = Array1::zeros(n_features);
    let mut variance = prior.tracks_variance().then(|| Array1::zeros(n_features));
    let mut count = Array1::zeros(n_features);

    for i in 0..n_features {
        let (m, v, c) = combine_feature(
            (
                prior.mean[i],
                prior.variance.as_ref().map(|v| v[i]),
                prior.count[i],
            ),
            (
                batch.mean[i],
                batch.variance.as_ref().map(|v| v[i]),
                batch.count[i],
            ),
        )?;
        mean[i] = m;
        count[i] = c;
        if let (Some(out), Some(v)) = (variance.as_mut(), v) {
            out[i] = v;
        }
    }

    let merged = RunningStatistics {
        mean,
        variance,
        count,
    };
    let unobserved = merged.unobserved_features();
    if !unobserved.is_empty() {
        warn!(
            features = ?unobserved,
            "features without observations have an undefined mean"
        );
    }
    Ok(merged)
}
