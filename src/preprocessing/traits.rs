//! Core traits for preprocessing transformers.
//!
//! This module defines the two central traits:
//! - [`IncrementalTransformer`]: learns from a stream of batches; holds hyperparameters
//!   and the running state.
//! - [`FittedTransformer`]: a snapshot of learned parameters, ready for inference and
//!   serialization.

use crate::preprocessing::error::PreprocessingError;
use crate::serialization::SerializableParams;

/// Trait for transformers that learn their parameters batch by batch.
///
/// # Example
/// ```ignore
/// use dp_scaler::preprocessing::{IncrementalTransformer, PrivateStandardScaler, ScalerConfig};
///
/// let mut scaler = PrivateStandardScaler::new(config)?;
/// scaler.partial_fit(&first_batch)?;
/// scaler.partial_fit(&second_batch)?;
/// let fitted = scaler.fitted()?;
/// ```
pub trait IncrementalTransformer {
    /// Input data type.
    type Input;
    /// Output data type after transformation.
    type Output;
    /// Snapshot type produced from the running state.
    type Fitted: FittedTransformer<Input = Self::Input, Output = Self::Output>;

    /// Fold one more batch into the running state.
    ///
    /// # Errors
    /// Returns [`PreprocessingError`] if the batch or the configuration is
    /// invalid. The running state is left untouched in that case.
    fn partial_fit(&mut self, data: &Self::Input) -> Result<&mut Self, PreprocessingError>;

    /// Discard the running state and learn from `data` alone.
    ///
    /// Like [`partial_fit`](Self::partial_fit), a failure leaves the previous
    /// state in place.
    fn fit(&mut self, data: &Self::Input) -> Result<&mut Self, PreprocessingError>;

    /// Forget every batch seen so far.
    fn reset(&mut self);

    /// Snapshot of the parameters learned so far.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::NotFitted`] before the first batch.
    fn fitted(&self) -> Result<Self::Fitted, PreprocessingError>;

    /// Fit on `data` and transform it with the resulting parameters.
    fn fit_transform(&mut self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        self.fit(data)?;
        self.fitted()?.transform(data)
    }
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `save_to_file` / `load_from_file` write and check a versioned header;
///   `load_from_file` validates the decoded parameters through `from_params`.
pub trait FittedTransformer: Clone {
    /// Input data type for transformation.
    type Input;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Transform data using learned parameters.
    ///
    /// # Errors
    /// Returns [`PreprocessingError`] if the input shape doesn't match the
    /// expected number of features.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError>;

    /// Reverse the transformation.
    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input, PreprocessingError>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError>
    where
        Self: Sized;

    /// Save the fitted transformer to a file.
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let params = self.extract_params();
        let bytes = params.to_bytes().map_err(std::io::Error::other)?;
        std::fs::write(path, bytes)
    }

    /// Load a fitted transformer from a file.
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, PreprocessingError>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::Params::from_bytes(&bytes)?;
        Self::from_params(params)
    }

    /// Returns the number of features seen during fit.
    fn n_features_in(&self) -> usize;
}
