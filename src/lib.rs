//! NervioViz-Core: trend and statistics engine for intraoperative neuromonitoring
//!
//! This library turns per-surgery tables of multi-channel MEP and SSEP
//! waveforms into plot-ready trend data. It features:
//!
//! - Typed recording model with JSON ingestion
//! - Per-row reductions (L1, peak-to-peak, RMS, mean, median, max)
//! - Per-channel trend assembly honoring a caller-supplied channel order
//! - Cross-channel min/max/mean summaries and global stats labels
//! - Stacked waveform layout and CSV export
//! - Layered TOML configuration and structured logging
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nervioviz_core::ingest::load_recording;
//! use nervioviz_core::processing::{ChannelOrder, Metric, TrendEngine, ViewRequest};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let recording = load_recording("recording.json")?;
//!     let engine = TrendEngine::default();
//!
//!     let request = ViewRequest::new()
//!         .surgery("17")
//!         .metric(Metric::PeakToPeak)
//!         .channel_order(ChannelOrder::new(["L APB", "R APB"]));
//!
//!     for series in engine.trend(&recording, &request).series {
//!         println!("{}: {:?}", series.title, series.values);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod processing;
pub mod signal;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{AnalysisSettings, ConfigLoader, ExportSettings, ViewerConfig};
pub use error::{NervioError, NervioResult};
pub use ingest::{load_recording, IngestError, Recording};
pub use processing::{
    calculate_l1, compute_metric, compute_stats, summarize_across_channels, ChannelOrder, Metric, Modality,
    TrendEngine, ViewRequest,
};
pub use signal::{SignalRow, SignalTable, SurgeryId, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Trend and statistics engine for MEP/SSEP neuromonitoring recordings".to_string(),
        features: vec![
            "JSON recording ingestion".to_string(),
            "Per-row waveform reductions".to_string(),
            "Per-channel trends and cross-channel summaries".to_string(),
            "Stacked waveform layout".to_string(),
            "CSV export".to_string(),
        ],
        parallel: cfg!(feature = "parallel"),
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
    /// Rows are reduced on the rayon pool
    pub parallel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert_eq!(info.name, NAME);
        assert_eq!(info.version, VERSION);
        assert!(!info.features.is_empty());
    }

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "nervioviz-core");
    }
}
