//! Structured logging setup
//!
//! Library code only emits `tracing` events. Binaries call [`init_logging`]
//! once to install a subscriber:
//!
//! ```rust,ignore
//! use nervioviz_core::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development());
//! tracing::info!(rows = 42, "recording loaded");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line, colored
    #[default]
    Pretty,
    /// One line per event
    Compact,
}

/// Logging section of the viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Include file:line of each event
    pub source_location: bool,
    pub thread_ids: bool,
    pub thread_names: bool,
    /// Emit span enter/exit events
    pub span_events: bool,
    /// Directive string such as `nervioviz_core=debug`; overrides `level`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            source_location: false,
            thread_ids: false,
            thread_names: false,
            span_events: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Verbose, pretty, with source locations
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            source_location: true,
            thread_names: true,
            span_events: true,
            ..Default::default()
        }
    }

    /// JSON at info level
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            ..Default::default()
        }
    }

    /// Errors only
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            ..Default::default()
        }
    }

    /// Filter built from `filter`, then `RUST_LOG`, then `level`
    pub fn env_filter(&self) -> EnvFilter {
        match self.filter {
            Some(ref custom) => {
                EnvFilter::try_new(custom).unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))
            }
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.to_string())),
        }
    }
}

fn span_events(config: &LogConfig) -> fmt::format::FmtSpan {
    if config.span_events {
        fmt::format::FmtSpan::FULL
    } else {
        fmt::format::FmtSpan::NONE
    }
}

fn fmt_layer(config: &LogConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    // Events go to stderr so stdout stays free for report output.
    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_thread_ids(config.thread_ids)
        .with_thread_names(config.thread_names)
        .with_span_events(span_events(config));

    match config.format {
        LogFormat::Json => base.json().with_filter(config.env_filter()).boxed(),
        LogFormat::Pretty => base.pretty().with_filter(config.env_filter()).boxed(),
        LogFormat::Compact => base.compact().with_filter(config.env_filter()).boxed(),
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the earlier one
/// stays in place.
pub fn init_logging(config: &LogConfig) -> bool {
    let subscriber = tracing_subscriber::registry().with(fmt_layer(config));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_display() {
        assert_eq!(format!("{}", LogLevel::Debug), "debug");
        assert_eq!(format!("{}", LogLevel::Error), "error");
    }

    #[test]
    fn test_config_presets() {
        let dev = LogConfig::development();
        assert_eq!(dev.level, LogLevel::Debug);
        assert!(dev.source_location);

        assert_eq!(LogConfig::production().format, LogFormat::Json);
        assert_eq!(LogConfig::quiet().level, LogLevel::Error);
    }

    #[test]
    fn test_partial_toml_section() {
        let config: LogConfig = toml::from_str("level = \"warn\"\nformat = \"compact\"").unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_init_twice_keeps_first_subscriber() {
        init_logging(&LogConfig::quiet());
        assert!(!init_logging(&LogConfig::quiet()));
    }
}
