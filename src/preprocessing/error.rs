//! Error types for preprocessing operations.

use crate::serialization::FormatError;
use thiserror::Error;

/// Error type for preprocessing operations.
///
/// Every variant is raised before any scaler state is mutated or any privacy
/// budget is spent.
#[derive(Debug, Error)]
pub enum PreprocessingError {
    /// Shape mismatch between expected and actual array dimensions.
    #[error("Invalid shape: expected {expected}, got {got}")]
    InvalidShape { expected: String, got: String },
    /// Input contains values that cannot be processed (e.g. infinities).
    #[error("Numerical error: {0}")]
    NumericalError(String),
    /// Invalid hyperparameter value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// A privatized statistic was requested without known feature bounds.
    #[error("Missing range: {0}")]
    MissingRange(String),
    /// Parameters were requested from an estimator that has seen no data.
    #[error("Not fitted: {0}")]
    NotFitted(String),
    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(String),
    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),
    /// Feature dimension mismatch.
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
}

impl From<std::io::Error> for PreprocessingError {
    fn from(err: std::io::Error) -> Self {
        PreprocessingError::IoError(err.to_string())
    }
}

impl From<FormatError> for PreprocessingError {
    fn from(err: FormatError) -> Self {
        PreprocessingError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_shape() {
        let err = PreprocessingError::InvalidShape {
            expected: "2 bounds".to_string(),
            got: "3 bounds".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid shape: expected 2 bounds, got 3 bounds");
    }

    #[test]
    fn test_error_display_missing_range() {
        let err = PreprocessingError::MissingRange("column bounds".to_string());
        assert!(err.to_string().contains("Missing range"));
    }

    #[test]
    fn test_error_display_not_fitted() {
        let err = PreprocessingError::NotFitted("no batches".to_string());
        assert!(err.to_string().contains("Not fitted"));
    }

    #[test]
    fn test_error_display_feature_mismatch() {
        let err = PreprocessingError::FeatureMismatch {
            expected_features: 5,
            got_features: 3,
        };
        assert_eq!(
            err.to_string(),
            "Feature mismatch: expected 5 features, got 3"
        );
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: PreprocessingError = io_err.into();
        assert!(matches!(err, PreprocessingError::IoError(_)));
    }

    #[test]
    fn test_error_is_std_error() {
        let err = PreprocessingError::InvalidParameter("test".to_string());
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn test_error_from_format_error() {
        let err: PreprocessingError = FormatError::UnsupportedVersion {
            found: 9,
            supported: 1,
        }
        .into();
        match err {
            PreprocessingError::SerializationError(msg) => assert!(msg.contains("version 9")),
            other => panic!("expected a serialization error, got {:?}", other),
        }
    }
}
