//! # dp-scaler
//!
//! Differentially private standardization of tabular data, learned incrementally
//! from a stream of batches.
//!
//! ## Core Design Principles
//!
//! - **One pass per batch**: each batch is summarised once by a privatized
//!   statistic source and then merged into running aggregates; raw data is never
//!   revisited, so no budget is spent twice on the same rows.
//! - **Stable merging**: running mean and variance are combined with the
//!   Chan–Golub–LeVeque parallel update, feature by feature.
//! - **Missing values**: `NaN` cells are skipped per feature; sample counts are
//!   tracked per feature.
//! - **Explicit state**: the estimator is uninitialized, counting or accumulating,
//!   a tagged enum rather than lazily created fields.
//!
//! ## Quick Start
//!
//! ```rust
//! use dp_scaler::preprocessing::{FittedTransformer, IncrementalTransformer};
//! use dp_scaler::preprocessing::{PrivateStandardScaler, SamplesSeen, ScalerConfig};
//! use dp_scaler::privacy::{ExactStatistics, FeatureRange};
//! use ndarray::array;
//!
//! let config = ScalerConfig::new(1.0).with_range(FeatureRange::uniform(0.0, 10.0, 2).unwrap());
//! // `ExactStatistics` adds no noise; `PrivateStandardScaler::new` uses the Laplace mechanism.
//! let mut scaler = PrivateStandardScaler::with_source(config, ExactStatistics).unwrap();
//!
//! scaler.partial_fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
//! scaler.partial_fit(&array![[5.0, 6.0]]).unwrap();
//!
//! assert_eq!(scaler.n_samples_seen(), Some(SamplesSeen::Uniform(3)));
//! assert!((scaler.mean().unwrap()[0] - 3.0).abs() < 1e-12);
//!
//! let scaled = scaler.fitted().unwrap().transform(&array![[3.0, 4.0]]).unwrap();
//! assert!(scaled[[0, 0]].abs() < 1e-12);
//! ```
//!
//! ## Module Structure
//!
//! - `privacy`: Budget split, Laplace mechanism and statistic sources
//! - `preprocessing`: Incremental combiner, scaler state and the private standard scaler
//! - `serialization`: Parameter persistence

/// Privacy budget handling and privatized statistic sources.
pub mod privacy;

/// Data preprocessing transformers.
pub mod preprocessing;

/// Parameter persistence.
pub mod serialization;

pub use preprocessing::{
    FittedStandardScaler, FittedTransformer, IncrementalTransformer, PreprocessingError,
    PrivateStandardScaler, ScalerConfig,
};
pub use privacy::{ExactStatistics, FeatureRange, LaplaceStatistics, StatisticSource};
