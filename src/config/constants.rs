// src/config/constants.rs
//! Configuration constants and defaults

/// Channel layout constants
pub mod layout {
    /// Channels starting with this prefix (case-insensitive) go to the secondary column
    pub const DEFAULT_SECONDARY_PREFIX: &str = "r";
    pub const MAX_PREFIX_LENGTH: usize = 16;
}

/// Trend and waveform analysis constants
pub mod analysis {
    pub const DEFAULT_METRIC: &str = "l1";
    pub const DEFAULT_MODALITY: &str = "mep";

    /// Stacked traces are spaced by this factor times the largest amplitude
    pub const DEFAULT_TRACE_OFFSET_FACTOR: f64 = 1.2;
    pub const MIN_TRACE_OFFSET_FACTOR: f64 = 0.1;
    pub const MAX_TRACE_OFFSET_FACTOR: f64 = 10.0;

    pub const MILLIS_PER_SECOND: f64 = 1000.0;

    pub const METRIC_NAMES: [&str; 6] = ["l1", "p2p", "rms", "mean", "median", "max"];
    pub const MODALITY_NAMES: [&str; 4] = ["mep", "ssep_upper", "ssep_lower", "ssep"];
}

/// CSV export constants
pub mod export {
    pub const DEFAULT_DELIMITER: char = ',';
    pub const DEFAULT_INCLUDE_HEADER: bool = false;
    pub const MAX_FLOAT_PRECISION: i64 = 17;
    pub const ALLOWED_DELIMITERS: [&str; 4] = [",", ";", "\t", "|"];
}

/// Recording document layout
pub mod ingest {
    pub const MEP_KEY: &str = "mep_data";
    pub const SSEP_UPPER_KEY: &str = "ssep_upper_data";
    pub const SSEP_LOWER_KEY: &str = "ssep_lower_data";
    pub const SURGERY_KEY: &str = "surgerydata";
    pub const LEGACY_SURGERY_KEY: &str = "_surgerydata";

    pub const REQUIRED_KEYS: [&str; 4] = [MEP_KEY, SSEP_UPPER_KEY, SSEP_LOWER_KEY, SURGERY_KEY];

    pub const REQUIRED_COLUMNS: [&str; 10] = [
        "surgery_id",
        "timestamp",
        "channel",
        "values",
        "stimulus",
        "signal_rate",
        "baseline_timestamp",
        "baseline_values",
        "baseline_stimulus",
        "baseline_signal_rate",
    ];
}

/// Logging defaults
pub mod logging {
    pub const DEFAULT_LEVEL: &str = "info";
    pub const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    pub const FORMATS: [&str; 3] = ["json", "pretty", "compact"];
}

/// File system paths
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/nervioviz/config.toml";
    pub const USER_CONFIG_DIR: &str = ".config/nervioviz";
    pub const USER_CONFIG_FILE: &str = "config.toml";
    pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
    pub const LOCAL_CONFIG_FILE: &str = "nervioviz.toml";

    /// Environment overrides look like `NERVIOVIZ_ANALYSIS__DEFAULT_METRIC`
    pub const ENV_PREFIX: &str = "NERVIOVIZ_";
    pub const ENV_SECTION_SEPARATOR: &str = "__";

    pub const WATCH_DEBOUNCE_MS: u64 = 500;
}

/// Validation constants
pub mod validation {
    pub const MAX_CONFIG_FILE_SIZE_BYTES: u64 = 1_048_576;
    pub const MAX_CHANNEL_NAME_LENGTH: usize = 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_consistency() {
        assert!(analysis::MIN_TRACE_OFFSET_FACTOR < analysis::DEFAULT_TRACE_OFFSET_FACTOR);
        assert!(analysis::DEFAULT_TRACE_OFFSET_FACTOR < analysis::MAX_TRACE_OFFSET_FACTOR);
        assert!(analysis::METRIC_NAMES.contains(&analysis::DEFAULT_METRIC));
        assert!(analysis::MODALITY_NAMES.contains(&analysis::DEFAULT_MODALITY));
        assert!(logging::LEVELS.contains(&logging::DEFAULT_LEVEL));
        assert!(layout::DEFAULT_SECONDARY_PREFIX.len() <= layout::MAX_PREFIX_LENGTH);
    }

    #[test]
    fn test_required_keys_cover_surgery_table() {
        assert!(ingest::REQUIRED_KEYS.contains(&ingest::SURGERY_KEY));
        assert_eq!(ingest::REQUIRED_COLUMNS.len(), 10);
    }
}
