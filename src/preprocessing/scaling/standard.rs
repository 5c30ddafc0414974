//! Differentially private Standard Scaler.
//!
//! Transforms features by removing the mean and scaling to unit variance, where
//! the mean and variance are learned batch by batch under a privacy budget.
//!
//! ```text
//! z = (x - u) / s
//! ```
//!
//! Each call to `partial_fit` spends the configured `epsilon` once: the whole
//! budget goes to the mean when `with_std` is off, otherwise half to the mean
//! and half to the variance. Budgets are not amortised across calls.
//!
//! Missing values (`NaN`) are skipped per feature, so features may end up with
//! different sample counts.
//!
//! # Example
//! ```ignore
//! use dp_scaler::preprocessing::{FittedTransformer, IncrementalTransformer};
//! use dp_scaler::preprocessing::{PrivateStandardScaler, ScalerConfig};
//! use dp_scaler::privacy::FeatureRange;
//!
//! let config = ScalerConfig::new(1.0).with_range(FeatureRange::uniform(0.0, 100.0, 3)?);
//! let mut scaler = PrivateStandardScaler::new(config)?;
//!
//! for batch in batches {
//!     scaler.partial_fit(&batch)?;
//! }
//!
//! let fitted = scaler.fitted()?;
//! let scaled = fitted.transform(&data)?;
//! fitted.save_to_file("scaler.bin")?;
//! ```

use super::combiner::{combine, RunningStatistics};
use super::state::{SamplesSeen, ScalerState};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, IncrementalTransformer};
use crate::privacy::budget::{validate_epsilon, BudgetSplit, FeatureRange};
use crate::privacy::source::{col_observed_count, LaplaceStatistics, StatisticSource};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Configuration for [`PrivateStandardScaler`].
///
/// Fixed once handed to the scaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalerConfig {
    /// Privacy budget spent by every `partial_fit` call.
    pub epsilon: f64,
    /// Per-feature bounds of the data. Required unless both `with_mean` and
    /// `with_std` are off.
    pub range: Option<FeatureRange>,
    /// If true, center the data before scaling.
    pub with_mean: bool,
    /// If true, track the variance and scale the data to unit variance.
    pub with_std: bool,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            range: None,
            with_mean: true,
            with_std: true,
        }
    }
}

impl ScalerConfig {
    /// Default configuration with the given budget.
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            ..Self::default()
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the per-feature bounds of the data.
    pub fn with_range(mut self, range: FeatureRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Set whether to center data by mean.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    /// Set whether to scale data to unit variance.
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.with_std = with_std;
        self
    }

    /// Whether any privatized statistic is computed.
    ///
    /// The mean is tracked whenever the variance is, since the variance
    /// merge needs it.
    pub fn tracks_statistics(&self) -> bool {
        self.with_mean || self.with_std
    }

    /// # Errors
    /// Returns [`PreprocessingError::InvalidParameter`] for a non-positive or
    /// non-finite epsilon, or an invalid range.
    pub fn validate(&self) -> Result<(), PreprocessingError> {
        validate_epsilon(self.epsilon)?;
        if let Some(range) = &self.range {
            range.validate()?;
        }
        Ok(())
    }
}

/// Serializable parameters for a fitted scaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    /// Configuration options.
    pub config: ScalerConfig,
    /// Mean of each feature (None if no statistic was tracked).
    pub mean: Option<Vec<f64>>,
    /// Variance of each feature (None unless `with_std`).
    pub var: Option<Vec<f64>>,
    /// Scale of each feature (None unless `with_std`).
    pub scale: Option<Vec<f64>>,
    /// Non-missing values seen per feature.
    pub n_samples_seen: SamplesSeen,
    /// Number of features seen during fit.
    pub n_features: usize,
}

/// Standard scaler learning its statistics incrementally under differential privacy.
///
/// `S` supplies the per-batch privatized statistics; it defaults to
/// [`LaplaceStatistics`].
#[derive(Clone, Debug)]
pub struct PrivateStandardScaler<S: StatisticSource = LaplaceStatistics> {
    config: ScalerConfig,
    source: S,
    state: ScalerState,
    epsilon_spent: f64,
}

impl PrivateStandardScaler<LaplaceStatistics> {
    /// Scaler drawing Laplace noise from operating-system entropy.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::InvalidParameter`] if the configuration is invalid.
    pub fn new(config: ScalerConfig) -> Result<Self, PreprocessingError> {
        Self::with_source(config, LaplaceStatistics::from_entropy())
    }
}

impl<S: StatisticSource> PrivateStandardScaler<S> {
    /// Scaler computing its per-batch statistics with `source`.
    pub fn with_source(config: ScalerConfig, source: S) -> Result<Self, PreprocessingError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            state: ScalerState::Uninitialized,
            epsilon_spent: 0.0,
        })
    }

    pub fn config(&self) -> &ScalerConfig {
        &self.config
    }

    pub fn state(&self) -> &ScalerState {
        &self.state
    }

    /// Running per-feature mean, once any statistic has been tracked.
    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.state.mean()
    }

    /// Running per-feature variance, if `with_std`.
    pub fn var(&self) -> Option<&Array1<f64>> {
        self.state.var()
    }

    /// `sqrt(var)` with zeros replaced by 1, if `with_std`.
    pub fn scale(&self) -> Option<Array1<f64>> {
        self.state.scale()
    }

    pub fn n_samples_seen(&self) -> Option<SamplesSeen> {
        self.state.n_samples_seen()
    }

    pub fn n_features_in(&self) -> Option<usize> {
        self.state.n_features()
    }

    /// Total epsilon charged so far, summed over every call (sequential composition).
    pub fn epsilon_spent(&self) -> f64 {
        self.epsilon_spent
    }

    /// Merge the state of a scaler fed with other batches of the same data.
    ///
    /// Both scalers must share the same `with_mean` / `with_std` settings and,
    /// once fitted, the same number of features. Nothing changes on error.
    ///
    /// The privacy spend of `other` is added to this one. That is the
    /// sequential-composition bound, which stays valid when workers saw
    /// overlapping rows; for strictly disjoint rows it overstates the loss.
    pub fn merge(&mut self, other: &Self) -> Result<&mut Self, PreprocessingError> {
        if self.config.with_mean != other.config.with_mean
            || self.config.with_std != other.config.with_std
        {
            return Err(PreprocessingError::InvalidParameter(format!(
                "cannot merge scalers tracking different statistics \
                 (with_mean {} vs {}, with_std {} vs {})",
                self.config.with_mean,
                other.config.with_mean,
                self.config.with_std,
                other.config.with_std
            )));
        }
        if let Some(theirs) = other.state.n_features() {
            if let Some(ours) = self.state.n_features() {
                if ours != theirs {
                    return Err(PreprocessingError::FeatureMismatch {
                        expected_features: ours,
                        got_features: theirs,
                    });
                }
            }
            if self.config.tracks_statistics() {
                if let Some(range) = &self.config.range {
                    range.check_features(theirs)?;
                }
            }
        }

        let merged = match (&self.state, &other.state) {
            (_, ScalerState::Uninitialized) => self.state.clone(),
            (ScalerState::Uninitialized, theirs) => theirs.clone(),
            (ScalerState::Accumulating(ours), ScalerState::Accumulating(theirs)) => {
                ScalerState::Accumulating(ours.merge(theirs)?)
            }
            (ScalerState::Counting(ours), ScalerState::Counting(theirs)) => {
                ScalerState::Counting(add_counts(ours, theirs)?)
            }
            _ => return Err(state_mismatch()),
        };
        self.state = merged;
        self.epsilon_spent += other.epsilon_spent;
        Ok(self)
    }

    /// Validate `data` against the configuration and `prior`, then fold it in.
    fn update(&mut self, data: &Array2<f64>, from_scratch: bool) -> Result<(), PreprocessingError> {
        let fresh = ScalerState::Uninitialized;
        let Self {
            config,
            source,
            state,
            epsilon_spent,
        } = self;
        let prior = if from_scratch { &fresh } else { &*state };

        let range = validate_batch(config, prior, data.view())?;
        let batch_count = col_observed_count(data.view());

        let next = match range {
            None => {
                trace!(
                    n_samples = data.nrows(),
                    "no statistics tracked, counting samples only"
                );
                match prior {
                    ScalerState::Uninitialized => ScalerState::Counting(batch_count),
                    ScalerState::Counting(count) => {
                        ScalerState::Counting(add_counts(count, &batch_count)?)
                    }
                    ScalerState::Accumulating(_) => return Err(state_mismatch()),
                }
            }
            Some(range) => {
                let split = BudgetSplit::allocate(config.epsilon, config.with_std);
                debug!(
                    n_samples = data.nrows(),
                    n_features = data.ncols(),
                    epsilon_mean = split.mean,
                    epsilon_var = ?split.variance,
                    "partial_fit"
                );

                let mean = source.col_mean(data.view(), split.mean, range)?;
                let variance = match split.variance {
                    Some(eps) => match source.col_var(data.view(), eps, range) {
                        Ok(var) => Some(var),
                        Err(err) => {
                            *epsilon_spent += split.mean;
                            return Err(err);
                        }
                    },
                    None => None,
                };
                *epsilon_spent += split.total();

                let batch = RunningStatistics::new(mean, variance, batch_count)?;
                let merged = match prior {
                    ScalerState::Uninitialized => combine(
                        &RunningStatistics::empty(data.ncols(), config.with_std),
                        &batch,
                    )?,
                    ScalerState::Accumulating(stats) => combine(stats, &batch)?,
                    ScalerState::Counting(_) => return Err(state_mismatch()),
                };
                ScalerState::Accumulating(merged)
            }
        };

        *state = next;
        Ok(())
    }
}

/// Reject invalid input before any budget is spent.
///
/// Returns the range to use, or `None` when no statistic is tracked.
fn validate_batch<'c>(
    config: &'c ScalerConfig,
    prior: &ScalerState,
    data: ArrayView2<f64>,
) -> Result<Option<&'c FeatureRange>, PreprocessingError> {
    let (rows, cols) = data.dim();

    if rows == 0 {
        return Err(PreprocessingError::EmptyData(
            "Cannot fit PrivateStandardScaler on a batch without samples".to_string(),
        ));
    }
    if cols == 0 {
        return Err(PreprocessingError::EmptyData(
            "Cannot fit PrivateStandardScaler on a batch without features".to_string(),
        ));
    }
    if let Some(expected) = prior.n_features() {
        if expected != cols {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: expected,
                got_features: cols,
            });
        }
    }
    let consistent = match prior {
        ScalerState::Uninitialized => true,
        ScalerState::Counting(_) => !config.tracks_statistics(),
        ScalerState::Accumulating(stats) => {
            config.tracks_statistics() && stats.tracks_variance() == config.with_std
        }
    };
    if !consistent {
        return Err(state_mismatch());
    }
    if data.iter().any(|v| v.is_infinite()) {
        return Err(PreprocessingError::NumericalError(
            "batch contains infinite values".to_string(),
        ));
    }

    if !config.tracks_statistics() {
        return Ok(None);
    }
    let range = config.range.as_ref().ok_or_else(|| {
        PreprocessingError::MissingRange(
            "a per-feature range is required to compute private statistics".to_string(),
        )
    })?;
    range.check_features(cols)?;
    Ok(Some(range))
}

fn state_mismatch() -> PreprocessingError {
    PreprocessingError::InvalidParameter(
        "scaler state does not match the statistics its configuration tracks".to_string(),
    )
}

fn add_counts(a: &Array1<u64>, b: &Array1<u64>) -> Result<Array1<u64>, PreprocessingError> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.checked_add(*y))
        .collect::<Option<Vec<u64>>>()
        .map(Array1::from)
        .ok_or_else(|| PreprocessingError::NumericalError("sample count overflow".to_string()))
}

impl<S: StatisticSource> IncrementalTransformer for PrivateStandardScaler<S> {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Fitted = FittedStandardScaler;

    fn partial_fit(&mut self, data: &Self::Input) -> Result<&mut Self, PreprocessingError> {
        self.update(data, false)?;
        Ok(self)
    }

    fn fit(&mut self, data: &Self::Input) -> Result<&mut Self, PreprocessingError> {
        self.update(data, true)?;
        Ok(self)
    }

    fn reset(&mut self) {
        self.state = ScalerState::Uninitialized;
    }

    fn fitted(&self) -> Result<Self::Fitted, PreprocessingError> {
        let (n_features, n_samples_seen) = match (self.state.n_features(), self.n_samples_seen()) {
            (Some(n), Some(seen)) => (n, seen),
            _ => {
                return Err(PreprocessingError::NotFitted(
                    "PrivateStandardScaler has not seen any batch".to_string(),
                ))
            }
        };
        Ok(FittedStandardScaler {
            config: self.config.clone(),
            mean: self.mean().cloned(),
            var: self.var().cloned(),
            scale: self.scale(),
            n_samples_seen,
            n_features,
        })
    }
}

/// Fitted scaler ready for inference.
#[derive(Clone, Debug)]
pub struct FittedStandardScaler {
    config: ScalerConfig,
    mean: Option<Array1<f64>>,
    var: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
    n_samples_seen: SamplesSeen,
    n_features: usize,
}

impl FittedStandardScaler {
    pub fn config(&self) -> &ScalerConfig {
        &self.config
    }

    /// Get the mean values for each feature.
    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    pub fn var(&self) -> Option<&Array1<f64>> {
        self.var.as_ref()
    }

    /// Get the scale (standard deviation, zeros replaced by 1) for each feature.
    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.scale.as_ref()
    }

    pub fn n_samples_seen(&self) -> &SamplesSeen {
        &self.n_samples_seen
    }

    fn check_features(&self, cols: usize) -> Result<(), PreprocessingError> {
        if cols != self.n_features {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features,
                got_features: cols,
            });
        }
        Ok(())
    }

    fn centering(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref().filter(|_| self.config.with_mean)
    }

    fn scaling(&self) -> Option<&Array1<f64>> {
        self.scale.as_ref().filter(|_| self.config.with_std)
    }

    /// Transform `data` in place. `NaN` cells stay `NaN`.
    pub fn transform_inplace(&self, data: &mut Array2<f64>) -> Result<(), PreprocessingError> {
        self.check_features(data.ncols())?;
        if let Some(mean) = self.centering() {
            *data -= &mean.view().insert_axis(Axis(0));
        }
        if let Some(scale) = self.scaling() {
            *data /= &scale.view().insert_axis(Axis(0));
        }
        Ok(())
    }

    /// Reverse [`transform_inplace`](Self::transform_inplace).
    pub fn inverse_transform_inplace(&self, data: &mut Array2<f64>) -> Result<(), PreprocessingError> {
        self.check_features(data.ncols())?;
        if let Some(scale) = self.scaling() {
            *data *= &scale.view().insert_axis(Axis(0));
        }
        if let Some(mean) = self.centering() {
            *data += &mean.view().insert_axis(Axis(0));
        }
        Ok(())
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let mut result = data.clone();
        self.transform_inplace(&mut result)?;
        Ok(result)
    }

    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input, PreprocessingError> {
        let mut result = data.clone();
        self.inverse_transform_inplace(&mut result)?;
        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        StandardScalerParams {
            config: self.config.clone(),
            mean: self.mean.as_ref().map(Array1::to_vec),
            var: self.var.as_ref().map(Array1::to_vec),
            scale: self.scale.as_ref().map(Array1::to_vec),
            n_samples_seen: self.n_samples_seen.clone(),
            n_features: self.n_features,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        params.config.validate()?;
        let n_features = params.n_features;
        let to_array = |name: &str, values: Option<Vec<f64>>| match values {
            Some(v) if v.len() != n_features => Err(PreprocessingError::InvalidShape {
                expected: format!("{n_features} {name} values"),
                got: format!("{} {name} values", v.len()),
            }),
            other => Ok(other.map(Array1::from)),
        };
        let mean = to_array("mean", params.mean)?;
        let var = to_array("var", params.var)?;
        let scale = to_array("scale", params.scale)?;
        if params.config.with_std && scale.is_none() {
            return Err(PreprocessingError::InvalidParameter(
                "with_std requires a scale".to_string(),
            ));
        }
        if let SamplesSeen::PerFeature(counts) = &params.n_samples_seen {
            if counts.len() != n_features {
                return Err(PreprocessingError::InvalidShape {
                    expected: format!("{n_features} sample counts"),
                    got: format!("{} sample counts", counts.len()),
                });
            }
        }

        Ok(Self {
            config: params.config,
            mean,
            var,
            scale,
            n_samples_seen: params.n_samples_seen,
            n_features,
        })
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}
