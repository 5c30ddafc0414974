//! Data preprocessing transformers.
//!
//! # Core Traits
//!
//! - [`IncrementalTransformer`]: learns from a stream of batches
//! - [`FittedTransformer`]: fitted snapshot ready for inference and persistence
//!
//! # Available Transformers
//!
//! - [`PrivateStandardScaler`]: z-score normalization with statistics learned
//!   under a differential-privacy budget
//!
//! # Example
//!
//! ```ignore
//! use dp_scaler::preprocessing::{IncrementalTransformer, PrivateStandardScaler, ScalerConfig};
//! use dp_scaler::privacy::FeatureRange;
//!
//! let config = ScalerConfig::new(0.5).with_range(FeatureRange::uniform(0.0, 1.0, 4)?);
//! let mut scaler = PrivateStandardScaler::new(config)?;
//! scaler.partial_fit(&batch)?;
//!
//! let fitted = scaler.fitted()?;
//! fitted.save_to_file("scaler.bin")?;
//! let loaded = FittedStandardScaler::load_from_file("scaler.bin")?;
//! let scaled_test = loaded.transform(&test_data)?;
//! ```

pub mod error;
pub mod scaling;
pub mod traits;

pub use error::PreprocessingError;
pub use scaling::{
    FittedStandardScaler, PrivateStandardScaler, RunningStatistics, SamplesSeen, ScalerConfig,
    ScalerState, StandardScalerParams,
};
pub use traits::{FittedTransformer, IncrementalTransformer};
