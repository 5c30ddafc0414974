//! Privacy primitives used by the private scalers.
//!
//! - [`budget`]: per-feature clipping bounds and the per-batch epsilon split.
//! - [`mechanism`]: the Laplace mechanism.
//! - [`source`]: the [`StatisticSource`] seam between the scaler and whatever
//!   computes privatized column statistics, with a Laplace-based and an exact
//!   implementation.

pub mod budget;
pub mod mechanism;
pub mod source;

pub use budget::{validate_epsilon, BudgetSplit, FeatureRange};
pub use mechanism::Laplace;
pub use source::{col_observed_count, ExactStatistics, LaplaceStatistics, StatisticSource};
