//! Column-wise statistic sources.
//!
//! A [`StatisticSource`] produces one statistic per feature (axis 0) of a
//! batch, ignoring `NaN` cells feature by feature. Each call is charged the
//! epsilon it is given, so the scaler calls every method at most once per
//! batch.

use crate::preprocessing::error::PreprocessingError;
use crate::privacy::budget::FeatureRange;
use crate::privacy::mechanism::Laplace;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of per-feature, missing-value aware means and variances.
pub trait StatisticSource {
    /// Per-feature mean of the non-missing cells of `data`.
    ///
    /// A feature with no observed cell yields `NaN`.
    ///
    /// # Errors
    /// Returns [`PreprocessingError`] if `epsilon` is invalid or `range` does
    /// not cover the columns of `data`.
    fn col_mean(
        &mut self,
        data: ArrayView2<f64>,
        epsilon: f64,
        range: &FeatureRange,
    ) -> Result<Array1<f64>, PreprocessingError>;

    /// Per-feature population variance (ddof = 0) of the non-missing cells of `data`.
    ///
    /// A feature with no observed cell yields `NaN`.
    fn col_var(
        &mut self,
        data: ArrayView2<f64>,
        epsilon: f64,
        range: &FeatureRange,
    ) -> Result<Array1<f64>, PreprocessingError>;
}

impl<S: StatisticSource + ?Sized> StatisticSource for &mut S {
    fn col_mean(
        &mut self,
        data: ArrayView2<f64>,
        epsilon: f64,
        range: &FeatureRange,
    ) -> Result<Array1<f64>, PreprocessingError> {
        (**self).col_mean(data, epsilon, range)
    }

    fn col_var(
        &mut self,
        data: ArrayView2<f64>,
        epsilon: f64,
        range: &FeatureRange,
    ) -> Result<Array1<f64>, PreprocessingError> {
        (**self).col_var(data, epsilon, range)
    }
}

/// Number of non-missing cells in each column.
pub fn col_observed_count(data: ArrayView2<f64>) -> Array1<u64> {
    data.map_axis(Axis(0), |col| col.iter().filter(|v| !v.is_nan()).count() as u64)
}

fn observed<'a>(col: ArrayView1<'a, f64>) -> impl Iterator<Item = f64> + 'a {
    col.into_iter().copied().filter(|v| !v.is_nan())
}

/// `(n, mean, population variance)` of the given values, `NaN` stats when empty.
fn moments(values: impl Iterator<Item = f64>) -> (usize, f64, f64) {
    let values: Vec<f64> = values.collect();
    let n = values.len();
    if n == 0 {
        return (0, f64::NAN, f64::NAN);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    (n, mean, var)
}

/// Noise-free statistics.
///
/// Ignores the budget and the range. Useful as a reference when checking the
/// incremental merge, or when privacy is not required.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactStatistics;

impl StatisticSource for ExactStatistics {
    fn col_mean(
        &mut self,
        data: ArrayView2<f64>,
        _epsilon: f64,
        _range: &FeatureRange,
    ) -> Result<Array1<f64>, PreprocessingError> {
        Ok(data.map_axis(Axis(0), |col| moments(observed(col)).1))
    }

    fn col_var(
        &mut self,
        data: ArrayView2<f64>,
        _epsilon: f64,
        _range: &FeatureRange,
    ) -> Result<Array1<f64>, PreprocessingError> {
        Ok(data.map_axis(Axis(0), |col| moments(observed(col)).2))
    }
}

/// Laplace-mechanism statistics over values clipped to the feature range.
///
/// For `n` observed values of a feature bounded by `[low, high]`:
/// - mean: sensitivity `(high - low) / n`, result clamped to `[low, high]`;
/// - variance: sensitivity `((high - low) / n)^2 * (n - 1)`, result clamped
///   to `[0, (high - low)^2 / 4]`.
///
/// Every feature is charged the full epsilon of the call.
#[derive(Clone, Debug)]
pub struct LaplaceStatistics<R: Rng = StdRng> {
    rng: R,
}

impl LaplaceStatistics<StdRng> {
    /// Seed from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Deterministic noise, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> LaplaceStatistics<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn clipped<'a>(
        col: ArrayView1<'a, f64>,
        low: f64,
        high: f64,
    ) -> impl Iterator<Item = f64> + 'a {
        observed(col).map(move |v| v.clamp(low, high))
    }
}

impl<R: Rng> StatisticSource for LaplaceStatistics<R> {
    fn col_mean(
        &mut self,
        data: ArrayView2<f64>,
        epsilon: f64,
        range: &FeatureRange,
    ) -> Result<Array1<f64>, PreprocessingError> {
        range.check_features(data.ncols())?;
        let mut out = Array1::from_elem(data.ncols(), f64::NAN);
        for (j, col) in data.axis_iter(Axis(1)).enumerate() {
            let (low, high) = range.bounds(j);
            let (n, mean, _) = moments(Self::clipped(col, low, high));
            let mech = Laplace::new((high - low) / n.max(1) as f64, epsilon)?;
            if n > 0 {
                out[j] = mech.randomise(mean, &mut self.rng).clamp(low, high);
            }
        }
        Ok(out)
    }

    fn col_var(
        &mut self,
        data: ArrayView2<f64>,
        epsilon: f64,
        range: &FeatureRange,
    ) -> Result<Array1<f64>, PreprocessingError> {
        range.check_features(data.ncols())?;
        let mut out = Array1::from_elem(data.ncols(), f64::NAN);
        for (j, col) in data.axis_iter(Axis(1)).enumerate() {
            let (low, high) = range.bounds(j);
            let (n, _, var) = moments(Self::clipped(col, low, high));
            let width = high - low;
            let n_f = n.max(1) as f64;
            let sensitivity = (width / n_f).powi(2) * (n_f - 1.0);
            let mech = Laplace::new(sensitivity, epsilon)?;
            if n > 0 {
                out[j] = mech
                    .randomise(var, &mut self.rng)
                    .clamp(0.0, width * width / 4.0);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn range2() -> FeatureRange {
        FeatureRange::uniform(0.0, 10.0, 2).unwrap()
    }

    #[test]
    fn test_observed_count_skips_nan() {
        let data = array![[1.0, f64::NAN], [2.0, 3.0], [f64::NAN, f64::NAN]];
        let counts = col_observed_count(data.view());
        assert_eq!(counts.to_vec(), vec![2, 1]);
    }

    #[test]
    fn test_exact_mean_and_var_ignore_nan() {
        let data = array![[1.0, f64::NAN], [3.0, 4.0], [5.0, 8.0]];
        let mean = ExactStatistics.col_mean(data.view(), 1.0, &range2()).unwrap();
        let var = ExactStatistics.col_var(data.view(), 1.0, &range2()).unwrap();
        assert!((mean[0] - 3.0).abs() < 1e-12);
        assert!((mean[1] - 6.0).abs() < 1e-12);
        assert!((var[0] - 8.0 / 3.0).abs() < 1e-12);
        assert!((var[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_all_missing_column_is_nan() {
        let data = array![[1.0, f64::NAN], [2.0, f64::NAN]];
        let mean = ExactStatistics.col_mean(data.view(), 1.0, &range2()).unwrap();
        assert!(mean[1].is_nan());
    }

    #[test]
    fn test_laplace_output_respects_bounds() {
        let mut source = LaplaceStatistics::seeded(11);
        let data = array![[0.0, 10.0], [10.0, 10.0], [5.0, 0.0]];
        // Tiny epsilon means huge noise; clamping must still hold.
        for _ in 0..50 {
            let mean = source.col_mean(data.view(), 1e-3, &range2()).unwrap();
            let var = source.col_var(data.view(), 1e-3, &range2()).unwrap();
            assert!(mean.iter().all(|&m| (0.0..=10.0).contains(&m)));
            assert!(var.iter().all(|&v| (0.0..=25.0).contains(&v)));
        }
    }

    #[test]
    fn test_laplace_clips_out_of_range_values() {
        let mut source = LaplaceStatistics::seeded(5);
        let data = array![[100.0, -3.0], [100.0, -3.0]];
        // Large epsilon makes the noise negligible.
        let mean = source.col_mean(data.view(), 1e9, &range2()).unwrap();
        assert!((mean[0] - 10.0).abs() < 1e-6);
        assert!(mean[1].abs() < 1e-6);
    }

    #[test]
    fn test_laplace_large_epsilon_converges_to_exact() {
        let mut source = LaplaceStatistics::seeded(1);
        let data = array![[1.0, 2.0], [3.0, f64::NAN], [5.0, 6.0]];
        let mean = source.col_mean(data.view(), 1e9, &range2()).unwrap();
        let var = source.col_var(data.view(), 1e9, &range2()).unwrap();
        assert!((mean[0] - 3.0).abs() < 1e-6);
        assert!((mean[1] - 4.0).abs() < 1e-6);
        assert!((var[0] - 8.0 / 3.0).abs() < 1e-6);
        assert!((var[1] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_laplace_missing_column_is_nan() {
        let mut source = LaplaceStatistics::seeded(2);
        let data = array![[1.0, f64::NAN]];
        let mean = source.col_mean(data.view(), 1.0, &range2()).unwrap();
        assert!(mean[0].is_finite());
        assert!(mean[1].is_nan());
    }

    #[test]
    fn test_laplace_rejects_range_mismatch() {
        let mut source = LaplaceStatistics::seeded(2);
        let data = array![[1.0, 2.0, 3.0]];
        let result = source.col_mean(data.view(), 1.0, &range2());
        assert!(matches!(
            result,
            Err(PreprocessingError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_laplace_rejects_bad_epsilon() {
        let mut source = LaplaceStatistics::seeded(2);
        let data = array![[1.0, 2.0]];
        assert!(source.col_var(data.view(), 0.0, &range2()).is_err());
    }
}
