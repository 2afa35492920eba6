//! Conversion utilities for waveform display
//!
//! Elapsed-time axes and amplitude helpers used when laying out traces.
//! Rates are samples per second, times are milliseconds.

use crate::config::constants::analysis::MILLIS_PER_SECOND;
use std::fmt;

/// Conversion error types
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Invalid input value for conversion
    InvalidInput {
        function: String,
        input: String,
        reason: String,
    },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::InvalidInput { function, input, reason } => {
                write!(f, "Invalid input for {}: {} ({})", function, input, reason)
            }
        }
    }
}

impl std::error::Error for ConversionError {}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;

fn check_rate(function: &str, rate_hz: f64) -> ConversionResult<()> {
    if !rate_hz.is_finite() || rate_hz <= 0.0 {
        return Err(ConversionError::InvalidInput {
            function: function.to_string(),
            input: rate_hz.to_string(),
            reason: "Sampling rate must be positive and finite".to_string(),
        });
    }
    Ok(())
}

/// Elapsed-time axis for `len` samples, in milliseconds.
///
/// The rate is checked even when `len` is zero.
pub fn elapsed_axis_ms(len: usize, rate_hz: f64) -> ConversionResult<Vec<f64>> {
    check_rate("elapsed_axis_ms", rate_hz)?;
    Ok((0..len)
        .map(|i| i as f64 / rate_hz * MILLIS_PER_SECOND)
        .collect())
}

/// Largest absolute sample, 0.0 for an empty slice
pub fn max_abs(samples: &[f64]) -> f64 {
    samples.iter().map(|v| v.abs()).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_axis() {
        assert_eq!(elapsed_axis_ms(2, 1000.0).unwrap(), vec![0.0, 1.0]);
        assert_eq!(elapsed_axis_ms(3, 2000.0).unwrap(), vec![0.0, 0.5, 1.0]);
        assert!(elapsed_axis_ms(0, 1000.0).unwrap().is_empty());
    }

    #[test]
    fn test_rate_must_be_positive() {
        assert!(elapsed_axis_ms(0, 0.0).is_err());
        assert!(elapsed_axis_ms(4, -10.0).is_err());
        assert!(elapsed_axis_ms(4, f64::NAN).is_err());
        assert!(elapsed_axis_ms(1, f64::INFINITY).is_err());
    }

    #[test]
    fn test_max_abs() {
        assert_eq!(max_abs(&[]), 0.0);
        assert_eq!(max_abs(&[1.0, -2.5, 2.0]), 2.5);
    }
}
