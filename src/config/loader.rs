// src/config/loader.rs
//! Layered configuration loader with validation and hot reload

use crate::config::{constants::{paths, validation}, schema_validator::SchemaValidator, ViewerConfig};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Configuration loader with hot reload capabilities
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    schema_validator: SchemaValidator,
    current_config: Arc<RwLock<ViewerConfig>>,
    change_notifier: Option<mpsc::Sender<ViewerConfig>>,
    _file_watcher: Option<notify::RecommendedWatcher>,
}

fn join_errors(errors: &[crate::config::schema_validator::ValidationError]) -> String {
    errors.iter().map(|e| format!("\n  {}", e)).collect()
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    Parse(String),

    #[error("Configuration validation errors: {}", join_errors(.0))]
    Validation(Vec<crate::config::schema_validator::ValidationError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File watcher error: {0}")]
    Watcher(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl ConfigLoader {
    /// Create a loader over the standard search paths
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Create loader with custom paths, lowest precedence first
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            schema_validator: SchemaValidator::new(),
            current_config: Arc::new(RwLock::new(ViewerConfig::default())),
            change_notifier: None,
            _file_watcher: None,
        }
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load viewer configuration with validation
    pub fn load_viewer_config(&mut self) -> Result<ViewerConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        self.store(config.clone());
        Ok(config)
    }

    /// Get current configuration
    pub fn get_current_config(&self) -> ViewerConfig {
        match self.current_config.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, config: ViewerConfig) {
        match self.current_config.write() {
            Ok(mut current) => *current = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    /// Setup hot reload with change notifications
    pub fn enable_hot_reload(
        &mut self,
        callback: impl Fn(ViewerConfig) + Send + 'static,
    ) -> Result<(), ConfigError> {
        let (tx, rx) = mpsc::channel::<ViewerConfig>();
        self.change_notifier = Some(tx.clone());

        let config_ref = self.current_config.clone();
        thread::spawn(move || {
            while let Ok(new_config) = rx.recv() {
                match config_ref.write() {
                    Ok(mut current) => *current = new_config.clone(),
                    Err(poisoned) => *poisoned.into_inner() = new_config.clone(),
                }
                callback(new_config);
            }
        });

        self.setup_file_watcher(tx)
    }

    /// Reload configuration manually
    pub fn reload(&mut self) -> Result<ViewerConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        self.store(config.clone());

        if let Some(ref notifier) = self.change_notifier {
            let _ = notifier.send(config.clone());
        }

        Ok(config)
    }

    /// Validate a configuration file without loading it
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let toml_value = self.load_config_file(path)?;

        self.schema_validator
            .validate_config(&toml_value)
            .map_err(ConfigError::Validation)?;

        self.schema_validator
            .validate_dependencies(&toml_value)
            .map_err(ConfigError::Validation)?;

        Ok(())
    }

    /// Export current configuration to file
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let config = self.get_current_config();
        let toml_content =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::Parse(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Get configuration file modification times
    pub fn get_config_timestamps(&self) -> Vec<(PathBuf, Option<SystemTime>)> {
        self.config_paths
            .iter()
            .map(|path| {
                let timestamp = std::fs::metadata(path)
                    .and_then(|meta| meta.modified())
                    .ok();
                (path.clone(), timestamp)
            })
            .collect()
    }

    fn load_and_merge_configs(&self) -> Result<ViewerConfig, ConfigError> {
        let mut merged_config = toml::Value::Table(toml::value::Table::new());

        let default_config = toml::Value::try_from(ViewerConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        merge_toml_values(&mut merged_config, default_config);

        for config_path in &self.config_paths {
            match self.load_config_file(config_path) {
                Ok(file_config) => {
                    tracing::debug!(path = %config_path.display(), "merged configuration file");
                    merge_toml_values(&mut merged_config, file_config);
                }
                Err(ConfigError::FileNotFound(_)) => continue, // optional layer
                Err(e) => return Err(e),
            }
        }

        apply_environment_overrides(&mut merged_config, std::env::vars());

        self.schema_validator
            .validate_config(&merged_config)
            .map_err(ConfigError::Validation)?;

        self.schema_validator
            .validate_dependencies(&merged_config)
            .map_err(ConfigError::Validation)?;

        let config: ViewerConfig = merged_config
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(format!("Failed to deserialize config: {}", e)))?;

        Ok(config)
    }

    fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<toml::Value, ConfigError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let size = std::fs::metadata(path)?.len();
        if size > validation::MAX_CONFIG_FILE_SIZE_BYTES {
            tracing::warn!(path = %path.display(), size, "configuration file too large, skipped");
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;

        Ok(config)
    }

    fn setup_file_watcher(&mut self, tx: mpsc::Sender<ViewerConfig>) -> Result<(), ConfigError> {
        use notify::{DebouncedEvent, RecursiveMode, Watcher};

        let (watch_tx, watch_rx) = mpsc::channel();
        let mut watcher = notify::watcher(watch_tx, Duration::from_millis(paths::WATCH_DEBOUNCE_MS))
            .map_err(|e| ConfigError::Watcher(e.to_string()))?;

        let mut watched_paths = std::collections::HashSet::new();
        for path in &self.config_paths {
            if let Some(parent) = path.parent().filter(|p| p.is_dir()) {
                if watched_paths.insert(parent.to_path_buf()) {
                    if let Err(e) = watcher.watch(parent, RecursiveMode::NonRecursive) {
                        tracing::warn!(path = %parent.display(), error = %e, "cannot watch configuration directory");
                    }
                }
            }
        }

        let config_paths = self.config_paths.clone();

        thread::spawn(move || {
            while let Ok(event) = watch_rx.recv() {
                match event {
                    DebouncedEvent::Write(path) | DebouncedEvent::Create(path) => {
                        if config_paths.iter().any(|p| p == &path) {
                            let loader = ConfigLoader::with_paths(config_paths.clone());

                            match loader.load_and_merge_configs() {
                                Ok(new_config) => {
                                    tracing::info!(path = %path.display(), "configuration reloaded");
                                    let _ = tx.send(new_config);
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "failed to reload configuration");
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        });

        self._file_watcher = Some(watcher);
        Ok(())
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut config_paths = vec![PathBuf::from(paths::SYSTEM_CONFIG_PATH)];

        if let Some(home_dir) = dirs::home_dir() {
            config_paths.push(home_dir.join(paths::USER_CONFIG_DIR).join(paths::USER_CONFIG_FILE));
        }

        config_paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        config_paths.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));

        config_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

/// Apply `NERVIOVIZ_<SECTION>__<FIELD>` variables onto the merged document
fn apply_environment_overrides<I>(config: &mut toml::Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(paths::ENV_PREFIX) else {
            continue;
        };

        let path: Vec<String> = rest
            .split(paths::ENV_SECTION_SEPARATOR)
            .map(|part| part.to_lowercase())
            .collect();
        if path.iter().any(String::is_empty) {
            continue;
        }

        tracing::debug!(key = %key, "applying environment override");
        set_nested_value(config, &path, parse_env_value(&value));
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else {
        toml::Value::String(value.to_string())
    }
}

fn set_nested_value(config: &mut toml::Value, path: &[String], value: toml::Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = config;
    for part in parents {
        let toml::Value::Table(table) = current else {
            return;
        };
        current = table
            .entry(part.clone())
            .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
    }

    if let toml::Value::Table(table) = current {
        table.insert(last.clone(), value);
    }
}

// Cross-platform directory discovery
mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var_os("USERPROFILE").map(PathBuf::from)
        }
        #[cfg(not(target_os = "windows"))]
        {
            std::env::var_os("HOME").map(PathBuf::from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{Metric, Modality};
    use serial_test::serial;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_config_loader_creation() {
        let loader = ConfigLoader::new();
        assert!(!loader.config_paths().is_empty());
        assert_eq!(loader.config_paths()[0], PathBuf::from(paths::SYSTEM_CONFIG_PATH));
    }

    #[test]
    #[serial]
    fn test_missing_files_yield_defaults() {
        let dir = TempDir::new().unwrap();
        let mut loader = ConfigLoader::with_paths(vec![dir.path().join("absent.toml")]);
        let config = loader.load_viewer_config().unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    #[serial]
    fn test_later_files_take_precedence() {
        let dir = TempDir::new().unwrap();
        let base = write_file(&dir, "base.toml", "[analysis]\ndefault_metric = \"rms\"\ntrace_offset_factor = 2.0\n");
        let local = write_file(&dir, "local.toml", "[analysis]\ndefault_metric = \"max\"\n");

        let mut loader = ConfigLoader::with_paths(vec![base, local]);
        let config = loader.load_viewer_config().unwrap();

        assert_eq!(config.analysis.default_metric, Metric::Max);
        assert_eq!(config.analysis.trace_offset_factor, 2.0);
        assert_eq!(loader.get_current_config(), config);
    }

    #[test]
    fn test_config_file_validation() {
        let loader = ConfigLoader::with_paths(Vec::new());

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[analysis]
default_modality = "ssep_upper"
trace_offset_factor = 1.5

[logging]
level = "debug"
        "#
        )
        .unwrap();

        assert!(loader.validate_config_file(temp_file.path()).is_ok());
    }

    #[test]
    fn test_invalid_config_validation() {
        let loader = ConfigLoader::with_paths(Vec::new());

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[analysis]
trace_offset_factor = 500.0
        "#
        )
        .unwrap();

        assert!(matches!(
            loader.validate_config_file(temp_file.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_unparsable_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let broken = write_file(&dir, "broken.toml", "[analysis\n");
        let mut loader = ConfigLoader::with_paths(vec![broken]);
        assert!(matches!(loader.load_viewer_config(), Err(ConfigError::Parse(_))));
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        std::env::set_var("NERVIOVIZ_ANALYSIS__DEFAULT_MODALITY", "ssep");
        std::env::set_var("NERVIOVIZ_ANALYSIS__TRACE_OFFSET_FACTOR", "2");

        let mut loader = ConfigLoader::with_paths(Vec::new());
        let config = loader.load_viewer_config();

        std::env::remove_var("NERVIOVIZ_ANALYSIS__DEFAULT_MODALITY");
        std::env::remove_var("NERVIOVIZ_ANALYSIS__TRACE_OFFSET_FACTOR");

        let config = config.unwrap();
        assert_eq!(config.analysis.default_modality, Modality::Ssep);
        assert_eq!(config.analysis.trace_offset_factor, 2.0);
    }

    #[test]
    fn test_override_paths_keep_underscores_in_field_names() {
        let mut value = toml::Value::try_from(ViewerConfig::default()).unwrap();
        apply_environment_overrides(
            &mut value,
            vec![
                ("NERVIOVIZ_EXPORT__INCLUDE_HEADER".to_string(), "true".to_string()),
                ("OTHER_EXPORT__INCLUDE_HEADER".to_string(), "false".to_string()),
                ("NERVIOVIZ___BROKEN".to_string(), "1".to_string()),
            ],
        );

        let config: ViewerConfig = value.try_into().unwrap();
        assert!(config.export.include_header);
    }

    #[test]
    fn test_config_export() {
        let loader = ConfigLoader::with_paths(Vec::new());
        let temp_file = NamedTempFile::new().unwrap();

        assert!(loader.export_config(temp_file.path()).is_ok());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("[analysis]"));
        assert!(content.contains("trace_offset_factor"));
    }
}
