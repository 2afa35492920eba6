//! Validation utilities for recording rows and settings
//!
//! Field-level checks shared by ingestion and configuration:
//! - sampling rates
//! - channel identifiers
//! - finite waveform samples

use crate::config::constants::validation;
use std::fmt;

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of valid range
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },
    /// Required field missing or empty
    RequiredFieldMissing(String),
    /// String length violation
    InvalidLength {
        field: String,
        actual: usize,
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Non-finite sample inside a waveform
    NonFiniteSample {
        field: String,
        index: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange { field, value, min, max } => {
                write!(f, "Field '{}' value '{}' is out of range [{}, {}]", field, value, min, max)
            }
            ValidationError::RequiredFieldMissing(field) => {
                write!(f, "Required field '{}' is missing", field)
            }
            ValidationError::InvalidLength { field, actual, min, max } => {
                let bounds = match (min, max) {
                    (Some(min), Some(max)) => format!("[{}, {}]", min, max),
                    (Some(min), None) => format!(">= {}", min),
                    (None, Some(max)) => format!("<= {}", max),
                    (None, None) => "unknown".to_string(),
                };
                write!(f, "Field '{}' length {} is invalid, expected {}", field, actual, bounds)
            }
            ValidationError::NonFiniteSample { field, index } => {
                write!(f, "Field '{}' holds a non-finite sample at index {}", field, index)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate string length
pub fn validate_string_length(value: &str, min: usize, max: usize, field: &str) -> ValidationResult<()> {
    if value.len() < min || value.len() > max {
        return Err(ValidationError::InvalidLength {
            field: field.to_string(),
            actual: value.len(),
            min: Some(min),
            max: Some(max),
        });
    }
    Ok(())
}

/// Sampling rates must be positive and finite
pub fn validate_signal_rate(rate_hz: f64, field: &str) -> ValidationResult<()> {
    if !rate_hz.is_finite() || rate_hz <= 0.0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: rate_hz.to_string(),
            min: "0 (exclusive)".to_string(),
            max: "finite".to_string(),
        });
    }
    Ok(())
}

/// Channel identifiers are non-blank and bounded in length
pub fn validate_channel_name(channel: &str) -> ValidationResult<()> {
    if channel.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing("channel".to_string()));
    }
    validate_string_length(channel, 1, validation::MAX_CHANNEL_NAME_LENGTH, "channel")
}

/// Every sample must be finite
pub fn validate_finite_samples(samples: &[f64], field: &str) -> ValidationResult<()> {
    match samples.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ValidationError::NonFiniteSample {
            field: field.to_string(),
            index,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_rate_validation() {
        assert!(validate_signal_rate(1000.0, "signal_rate").is_ok());
        assert!(validate_signal_rate(0.0, "signal_rate").is_err());
        assert!(validate_signal_rate(-5.0, "signal_rate").is_err());
        assert!(validate_signal_rate(f64::NAN, "signal_rate").is_err());
    }

    #[test]
    fn test_channel_name_validation() {
        assert!(validate_channel_name("R APB").is_ok());
        assert_eq!(
            validate_channel_name("  "),
            Err(ValidationError::RequiredFieldMissing("channel".to_string()))
        );
        let long = "x".repeat(validation::MAX_CHANNEL_NAME_LENGTH + 1);
        assert!(validate_channel_name(&long).is_err());
    }

    #[test]
    fn test_finite_samples() {
        assert!(validate_finite_samples(&[1.0, -2.0], "values").is_ok());
        assert_eq!(
            validate_finite_samples(&[1.0, f64::INFINITY], "values"),
            Err(ValidationError::NonFiniteSample { field: "values".to_string(), index: 1 })
        );
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::OutOfRange {
            field: "test".to_string(),
            value: "150".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        };

        let display = format!("{}", error);
        assert!(display.contains("test"));
        assert!(display.contains("150"));
        assert!(display.contains("100"));
    }
}
