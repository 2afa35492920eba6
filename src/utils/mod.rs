//! Common utility functions for NervioViz
//!
//! - Elapsed-time axes for waveform display
//! - Field validation shared by ingestion and configuration

pub mod conversion;
pub mod validation;

pub use conversion::{elapsed_axis_ms, max_abs, ConversionError, ConversionResult};

pub use validation::{
    validate_channel_name,
    validate_finite_samples,
    validate_signal_rate,
    validate_string_length,
    ValidationError,
    ValidationResult,
};
