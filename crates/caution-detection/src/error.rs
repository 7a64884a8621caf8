//! Error types for the caution engine.
//!
//! Only configuration problems are reported as errors. Anomalies seen while
//! a race is running are logged and absorbed by the component that saw them.

use thiserror::Error;

/// Errors raised while building detectors or the threshold engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CautionError {
    /// A configuration record is internally inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A numeric setting lies outside its accepted range.
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Setting name.
        field: String,
        /// Rejected value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

impl CautionError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create an out of range error.
    #[must_use]
    pub fn out_of_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    /// Check `value` against the inclusive range `[min, max]`.
    ///
    /// NaN is always rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CautionError::OutOfRange`] when the value falls outside.
    pub fn ensure_within(field: &str, value: f64, min: f64, max: f64) -> CautionResult<()> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::out_of_range(field, value, min, max))
        }
    }
}

/// Result type for caution engine construction.
pub type CautionResult<T> = Result<T, CautionError>;
