//! Aggregate state of an incrementally fitted scaler.
//!
//! ```text
//! Uninitialized --partial_fit--> Accumulating --partial_fit--> Accumulating
//!       |
//!       +--partial_fit (no mean, no std)--> Counting --partial_fit--> Counting
//! ```

use super::combiner::RunningStatistics;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Number of samples seen, as reported to callers.
///
/// Counts are always kept per feature; they collapse to a single number when
/// every feature has seen the same number of non-missing values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplesSeen {
    /// Every feature has the same count.
    Uniform(u64),
    /// Counts differ between features because of missing values.
    PerFeature(Vec<u64>),
}

impl SamplesSeen {
    pub fn from_counts(counts: &Array1<u64>) -> Self {
        match counts.iter().next() {
            Some(&first) if counts.iter().all(|&c| c == first) => SamplesSeen::Uniform(first),
            _ => SamplesSeen::PerFeature(counts.to_vec()),
        }
    }

    /// Count for one feature.
    pub fn for_feature(&self, feature: usize) -> Option<u64> {
        match self {
            SamplesSeen::Uniform(n) => Some(*n),
            SamplesSeen::PerFeature(counts) => counts.get(feature).copied(),
        }
    }
}

/// Aggregate state of a scaler.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ScalerState {
    /// No batch has been seen.
    #[default]
    Uninitialized,
    /// Neither mean nor variance is tracked; only per-feature counts advance.
    Counting(Array1<u64>),
    /// Running mean (and variance, if tracked) of every batch seen.
    Accumulating(RunningStatistics),
}

impl ScalerState {
    pub fn is_initialized(&self) -> bool {
        !matches!(self, ScalerState::Uninitialized)
    }

    /// Number of features fixed by the first batch.
    pub fn n_features(&self) -> Option<usize> {
        match self {
            ScalerState::Uninitialized => None,
            ScalerState::Counting(count) => Some(count.len()),
            ScalerState::Accumulating(stats) => Some(stats.n_features()),
        }
    }

    pub fn count(&self) -> Option<&Array1<u64>> {
        match self {
            ScalerState::Uninitialized => None,
            ScalerState::Counting(count) => Some(count),
            ScalerState::Accumulating(stats) => Some(stats.count()),
        }
    }

    pub fn n_samples_seen(&self) -> Option<SamplesSeen> {
        self.count().map(SamplesSeen::from_counts)
    }

    pub fn statistics(&self) -> Option<&RunningStatistics> {
        match self {
            ScalerState::Accumulating(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.statistics().map(RunningStatistics::mean)
    }

    pub fn var(&self) -> Option<&Array1<f64>> {
        self.statistics().and_then(RunningStatistics::variance)
    }

    /// Standard deviation with zeros replaced by 1, if variance is tracked.
    ///
    /// Features that were never observed keep a `NaN` scale.
    pub fn scale(&self) -> Option<Array1<f64>> {
        self.var().map(|var| {
            var.mapv(|v| {
                let s = v.sqrt();
                if s == 0.0 {
                    1.0
                } else {
                    s
                }
            })
        })
    }

    /// Features with no observation so far, whose statistics are `NaN`.
    pub fn degenerate_features(&self) -> Vec<usize> {
        self.statistics()
            .map(RunningStatistics::unobserved_features)
            .unwrap_or_default()
    }
}
