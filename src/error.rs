//! Error types for estimator construction, training and scoring.

use thiserror::Error;

/// Everything that can go wrong when building or training an estimator.
///
/// All variants are usage or configuration errors surfaced to the caller;
/// nothing in the crate retries.
#[derive(Debug, Error)]
pub enum AsgdError {
    /// Invalid hyperparameter value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Row counts of features, labels or margin biases disagree.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Feature dimension mismatch.
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },

    /// Label outside the estimator's label space.
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration accepted by the type system but rejected at runtime.
    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    /// `partial_fit` was called before any initial step size was configured or calibrated.
    #[error("SGD step size is not set: configure `sgd_step_size0` or run step-size calibration first")]
    MissingStepSize,

    /// The geometric step-size search hit its iteration cap.
    #[error("Step-size calibration did not settle after {trials} trials (last candidate {step_size})")]
    CalibrationFailed { trials: usize, step_size: f64 },

    /// I/O error while reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration.
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AsgdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_parameter() {
        let err = AsgdError::InvalidParameter("n_iterations must be positive".to_string());
        assert!(err.to_string().contains("Invalid parameter"));
        assert!(err.to_string().contains("n_iterations"));
    }

    #[test]
    fn test_error_display_feature_mismatch() {
        let err = AsgdError::FeatureMismatch {
            expected_features: 3,
            got_features: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 3"));
        assert!(msg.contains("got 5"));
    }

    #[test]
    fn test_error_display_calibration_failed() {
        let err = AsgdError::CalibrationFailed {
            trials: 50,
            step_size: 0.125,
        };
        assert!(err.to_string().contains("50 trials"));
    }

    #[test]
    fn test_error_display_unsupported() {
        let err = AsgdError::Unsupported("feedback".to_string());
        assert!(err.to_string().starts_with("Unsupported configuration"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AsgdError = io_err.into();
        assert!(matches!(err, AsgdError::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: AsgdError = json_err.into();
        assert!(matches!(err, AsgdError::Json(_)));
    }
}
