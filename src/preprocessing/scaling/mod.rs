//! Scaling transformers for feature normalization.
//!
//! | Type | Role |
//! |------|------|
//! | [`PrivateStandardScaler`] | Incremental, differentially private z-score estimator |
//! | [`FittedStandardScaler`] | Snapshot used for transform / inverse transform |
//! | [`RunningStatistics`] | Mergeable per-feature mean, variance and count |
//! | [`ScalerState`] | Tagged aggregate state of the estimator |

pub mod combiner;
pub mod standard;
pub mod state;

pub use combiner::{combine, RunningStatistics};
pub use standard::{
    FittedStandardScaler, PrivateStandardScaler, ScalerConfig, StandardScalerParams,
};
pub use state::{SamplesSeen, ScalerState};
