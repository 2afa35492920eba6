// src/error.rs
//! Unified error handling for NervioViz Core
//!
//! Every failure that can leave the library (ingestion, configuration, export,
//! malformed caller input) is converted into [`NervioError`]. Each variant
//! carries an [`ErrorContext`] naming the component and operation that failed
//! so the presentation layer can report something useful.
//!
//! The trend engine itself never fails for data-shape reasons: absent tables,
//! empty waveforms and unknown channels all produce well-defined output.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use serde::{Deserialize, Serialize};

/// Unified error type for the whole crate
#[derive(Debug, Clone)]
pub enum NervioError {
    /// Configuration loading or validation errors
    Configuration {
        component: String,
        reason: String,
        context: ErrorContext,
    },

    /// Recording ingestion errors
    Ingest {
        source_path: Option<String>,
        error: Arc<dyn Error + Send + Sync>,
        context: ErrorContext,
    },

    /// Invalid caller-supplied data (unknown metric name, duplicate rows, ...)
    InvalidData {
        data_type: String,
        reason: String,
        expected: Option<String>,
        actual: Option<String>,
        context: ErrorContext,
    },

    /// Trend/statistics processing errors
    Processing {
        stage: ProcessingStage,
        reason: String,
        context: ErrorContext,
    },

    /// CSV export errors
    Export {
        format: ExportFormat,
        reason: String,
        context: ErrorContext,
    },
}

/// Processing stages for error tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStage {
    WaveformLayout,
}

/// Export formats for error tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
}

/// Error context for debugging and analysis
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub thread_id: Option<String>,
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            thread_id: Self::current_thread_id(),
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
        }
    }

    /// Create error context with file and line information
    pub fn with_location(
        component: &str,
        operation: &str,
        file: &'static str,
        line: u32,
    ) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    fn current_thread_id() -> Option<String> {
        std::thread::current().name().map(|s| s.to_string())
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

impl fmt::Display for NervioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NervioError::Configuration { component, reason, context } => {
                write!(f, "[CONFIG] Configuration error in {}: {} ({})",
                       component, reason, context.operation)
            }
            NervioError::Ingest { source_path, error, context } => {
                match source_path {
                    Some(path) => write!(f, "[INGEST] Failed to load {}: {} ({})",
                                         path, error, context.operation),
                    None => write!(f, "[INGEST] Failed to load recording: {} ({})",
                                   error, context.operation),
                }
            }
            NervioError::InvalidData { data_type, reason, expected, actual, context } => {
                match (expected, actual) {
                    (Some(exp), Some(act)) => write!(f, "[DATA] Invalid {}: {} (expected: {}, got: {}) ({})",
                                                     data_type, reason, exp, act, context.operation),
                    _ => write!(f, "[DATA] Invalid {}: {} ({})", data_type, reason, context.operation),
                }
            }
            NervioError::Processing { stage, reason, context } => {
                write!(f, "[PROCESSING] {:?} stage error: {} ({})",
                       stage, reason, context.operation)
            }
            NervioError::Export { format, reason, context } => {
                write!(f, "[EXPORT] {} export failed: {} ({})", format, reason, context.operation)
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl Error for NervioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NervioError::Ingest { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl NervioError {
    /// Context attached to this error
    pub fn context(&self) -> &ErrorContext {
        match self {
            NervioError::Configuration { context, .. }
            | NervioError::Ingest { context, .. }
            | NervioError::InvalidData { context, .. }
            | NervioError::Processing { context, .. }
            | NervioError::Export { context, .. } => context,
        }
    }
}

/// Conversion from ingestion errors
impl From<crate::ingest::IngestError> for NervioError {
    fn from(err: crate::ingest::IngestError) -> Self {
        let context = error_context!("ingest", "load_recording");
        NervioError::Ingest {
            source_path: err.path().map(|p| p.display().to_string()),
            error: Arc::new(err),
            context,
        }
    }
}

/// Conversion from configuration errors
impl From<crate::config::ConfigError> for NervioError {
    fn from(err: crate::config::ConfigError) -> Self {
        NervioError::Configuration {
            component: "config_loader".to_string(),
            reason: err.to_string(),
            context: error_context!("config", "load_viewer_config"),
        }
    }
}

/// Result type alias for NervioViz operations
pub type NervioResult<T> = Result<T, NervioError>;

/// Error builder for convenient error construction
pub struct NervioErrorBuilder {
    component: String,
    operation: String,
}

impl NervioErrorBuilder {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn processing(self, stage: ProcessingStage, reason: &str) -> NervioError {
        NervioError::Processing {
            stage,
            reason: reason.to_string(),
            context: ErrorContext::new(&self.component, &self.operation),
        }
    }

    pub fn invalid_data(self, data_type: &str, reason: &str) -> NervioError {
        NervioError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.to_string(),
            expected: None,
            actual: None,
            context: ErrorContext::new(&self.component, &self.operation),
        }
    }

    pub fn invalid_value(
        self,
        data_type: &str,
        reason: &str,
        expected: &str,
        actual: &str,
    ) -> NervioError {
        NervioError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.to_string(),
            expected: Some(expected.to_string()),
            actual: Some(actual.to_string()),
            context: ErrorContext::new(&self.component, &self.operation),
        }
    }

    pub fn export(self, format: ExportFormat, reason: &str) -> NervioError {
        NervioError::Export {
            format,
            reason: reason.to_string(),
            context: ErrorContext::new(&self.component, &self.operation),
        }
    }
}
