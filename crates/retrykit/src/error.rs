//! Error types for retry policy configuration.
//!
//! The executor never produces these. A failed operation is always handed
//! back to the caller as its own error value; `PolicyError` only covers
//! problems with configuration loaded from text or the environment.

use thiserror::Error;

/// Result type alias for policy configuration.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// A retry policy configuration was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// Backoff factor must be finite and at least 1.0.
    #[error("backoff factor must be a finite number >= 1.0, got {0}")]
    InvalidBackoffFactor(f64),

    /// Jitter must lie within `[0.0, 1.0]`.
    #[error("jitter must be within [0.0, 1.0], got {0}")]
    InvalidJitter(f64),

    /// An environment variable was set but could not be parsed.
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidEnvVar {
        /// Name of the variable
        var: &'static str,
        /// Raw value that failed to parse
        value: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl PolicyError {
    pub(crate) fn env(var: &'static str, value: &str, reason: impl ToString) -> Self {
        PolicyError::InvalidEnvVar {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            PolicyError::InvalidBackoffFactor(0.5).to_string(),
            "backoff factor must be a finite number >= 1.0, got 0.5"
        );

        let err = PolicyError::env("RETRYKIT_MAX_RETRIES", "three", "invalid digit found in string");
        assert_eq!(
            err.to_string(),
            "invalid value for RETRYKIT_MAX_RETRIES: \"three\" (invalid digit found in string)"
        );
    }
}
