// src/config/mod.rs
//! Viewer configuration: analysis defaults, export format and logging

pub mod constants;
pub mod loader;
pub mod schema_validator;

pub use loader::{ConfigError, ConfigLoader};
pub use schema_validator::{SchemaValidator, ValidationError};

use crate::logging::LogConfig;
use crate::processing::{ChannelGrouping, Metric, Modality};
use serde::{Deserialize, Serialize};

/// Complete viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub logging: LogConfig,
}

/// Defaults applied when a view request leaves a choice open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "defaults::metric")]
    pub default_metric: Metric,

    #[serde(default = "defaults::modality")]
    pub default_modality: Modality,

    /// Channel-name prefix of the secondary display column
    #[serde(default = "defaults::secondary_prefix")]
    pub secondary_prefix: String,

    /// Stacked traces are spaced by this factor times the peak amplitude
    #[serde(default = "defaults::trace_offset_factor")]
    pub trace_offset_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "defaults::delimiter")]
    pub delimiter: char,

    /// Digits after the decimal point; shortest round-trip form when unset
    #[serde(default)]
    pub float_precision: Option<usize>,

    #[serde(default = "defaults::include_header")]
    pub include_header: bool,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;
    use crate::processing::{Metric, Modality};

    pub fn metric() -> Metric { Metric::L1 }
    pub fn modality() -> Modality { Modality::Mep }
    pub fn secondary_prefix() -> String { layout::DEFAULT_SECONDARY_PREFIX.to_string() }
    pub fn trace_offset_factor() -> f64 { analysis::DEFAULT_TRACE_OFFSET_FACTOR }

    pub fn delimiter() -> char { export::DEFAULT_DELIMITER }
    pub fn include_header() -> bool { export::DEFAULT_INCLUDE_HEADER }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            default_metric: defaults::metric(),
            default_modality: defaults::modality(),
            secondary_prefix: defaults::secondary_prefix(),
            trace_offset_factor: defaults::trace_offset_factor(),
        }
    }
}

impl AnalysisSettings {
    pub fn grouping(&self) -> ChannelGrouping {
        ChannelGrouping::new(&self.secondary_prefix)
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            delimiter: defaults::delimiter(),
            float_precision: None,
            include_header: defaults::include_header(),
        }
    }
}

impl ViewerConfig {
    /// Validate configuration consistency
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let factor = self.analysis.trace_offset_factor;
        if !(constants::analysis::MIN_TRACE_OFFSET_FACTOR..=constants::analysis::MAX_TRACE_OFFSET_FACTOR)
            .contains(&factor)
        {
            errors.push(format!(
                "Trace offset factor {} outside [{}, {}]",
                factor,
                constants::analysis::MIN_TRACE_OFFSET_FACTOR,
                constants::analysis::MAX_TRACE_OFFSET_FACTOR
            ));
        }

        if self.analysis.secondary_prefix.contains(self.export.delimiter) {
            errors.push(format!(
                "Secondary prefix '{}' contains the export delimiter '{}'",
                self.analysis.secondary_prefix, self.export.delimiter
            ));
        }

        if let Some(precision) = self.export.float_precision {
            if precision as i64 > constants::export::MAX_FLOAT_PRECISION {
                errors.push(format!("Float precision {} is too large", precision));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Configuration summary for display/logging
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            default_metric: self.analysis.default_metric,
            default_modality: self.analysis.default_modality,
            trace_offset_factor: self.analysis.trace_offset_factor,
            delimiter: self.export.delimiter,
            log_level: self.logging.level.to_string(),
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub default_metric: Metric,
    pub default_modality: Modality,
    pub trace_offset_factor: f64,
    pub delimiter: char,
    pub log_level: String,
}
