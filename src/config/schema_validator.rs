// src/config/schema_validator.rs
//! Configuration schema validation

use crate::config::constants::*;
use std::collections::HashMap;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub value: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error for '{}': {} (value: {})", self.field, self.message, self.value)
    }
}

impl std::error::Error for ValidationError {}

/// Schema validator for the merged TOML document
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    constraints: HashMap<String, FieldConstraint>,
}

/// Field validation constraints
#[derive(Debug, Clone)]
pub enum FieldConstraint {
    Range { min: f64, max: f64 },
    IntRange { min: i64, max: i64 },
    OneOf(Vec<String>),
    MaxLength(usize),
    Custom(fn(&str) -> bool),
}

fn one_of(options: &[&str]) -> FieldConstraint {
    FieldConstraint::OneOf(options.iter().map(|s| s.to_string()).collect())
}

fn valid_filter(directives: &str) -> bool {
    tracing_subscriber::EnvFilter::try_new(directives).is_ok()
}

impl SchemaValidator {
    /// Create new schema validator with default constraints
    pub fn new() -> Self {
        let mut constraints = HashMap::new();

        // Analysis constraints
        constraints.insert("analysis.default_metric".to_string(),
                           one_of(&analysis::METRIC_NAMES));

        constraints.insert("analysis.default_modality".to_string(),
                           one_of(&analysis::MODALITY_NAMES));

        constraints.insert("analysis.trace_offset_factor".to_string(),
                           FieldConstraint::Range {
                               min: analysis::MIN_TRACE_OFFSET_FACTOR,
                               max: analysis::MAX_TRACE_OFFSET_FACTOR,
                           });

        constraints.insert("analysis.secondary_prefix".to_string(),
                           FieldConstraint::MaxLength(layout::MAX_PREFIX_LENGTH));

        // Export constraints
        constraints.insert("export.delimiter".to_string(),
                           one_of(&export::ALLOWED_DELIMITERS));

        constraints.insert("export.float_precision".to_string(),
                           FieldConstraint::IntRange { min: 0, max: export::MAX_FLOAT_PRECISION });

        // Logging constraints
        constraints.insert("logging.level".to_string(), one_of(&logging::LEVELS));
        constraints.insert("logging.format".to_string(), one_of(&logging::FORMATS));
        constraints.insert("logging.filter".to_string(), FieldConstraint::Custom(valid_filter));

        Self { constraints }
    }

    /// Validate configuration value against schema
    pub fn validate_field(&self, field_path: &str, value: &toml::Value) -> Result<(), ValidationError> {
        if let Some(constraint) = self.constraints.get(field_path) {
            self.check_constraint(field_path, value, constraint)
        } else {
            Ok(()) // Unknown fields are allowed for extensibility
        }
    }

    /// Validate entire configuration
    pub fn validate_config(&self, config: &toml::Value) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        self.validate_recursive("", config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Check cross-field dependencies
    pub fn validate_dependencies(&self, config: &toml::Value) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        // A prefix containing the delimiter would split exported channel labels
        if let (Some(prefix), Some(delimiter)) = (
            self.get_nested_value(config, "analysis.secondary_prefix").and_then(|v| v.as_str()),
            self.get_nested_value(config, "export.delimiter").and_then(|v| v.as_str()),
        ) {
            if !delimiter.is_empty() && prefix.contains(delimiter) {
                errors.push(ValidationError {
                    field: "analysis.secondary_prefix".to_string(),
                    message: "Secondary prefix must not contain the export delimiter".to_string(),
                    value: format!("prefix: {:?}, delimiter: {:?}", prefix, delimiter),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_recursive(&self, prefix: &str, value: &toml::Value, errors: &mut Vec<ValidationError>) {
        match value {
            toml::Value::Table(table) => {
                for (key, val) in table {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };

                    if let Err(err) = self.validate_field(&path, val) {
                        errors.push(err);
                    }

                    if val.is_table() {
                        self.validate_recursive(&path, val, errors);
                    }
                }
            }
            _ => {
                if let Err(err) = self.validate_field(prefix, value) {
                    errors.push(err);
                }
            }
        }
    }

    fn check_constraint(&self, field: &str, value: &toml::Value, constraint: &FieldConstraint) -> Result<(), ValidationError> {
        let fail = |message: String, value: String| ValidationError {
            field: field.to_string(),
            message,
            value,
        };

        match constraint {
            FieldConstraint::Range { min, max } => {
                let number = value.as_float().or_else(|| value.as_integer().map(|i| i as f64));
                match number {
                    Some(val) if val < *min || val > *max || val.is_nan() => {
                        return Err(fail(format!("Value must be between {} and {}", min, max), val.to_string()));
                    }
                    Some(_) => {}
                    None => return Err(fail("Value must be numeric".to_string(), value.to_string())),
                }
            }
            FieldConstraint::IntRange { min, max } => {
                match value.as_integer() {
                    Some(val) if val < *min || val > *max => {
                        return Err(fail(format!("Value must be between {} and {}", min, max), val.to_string()));
                    }
                    Some(_) => {}
                    None => return Err(fail("Value must be an integer".to_string(), value.to_string())),
                }
            }
            FieldConstraint::OneOf(options) => {
                if let Some(val) = value.as_str() {
                    let val_lower = val.to_lowercase();
                    if !options.iter().any(|opt| opt.to_lowercase() == val_lower) {
                        return Err(fail(
                            format!(
                                "Value must be one of: {}",
                                options.iter().map(|s| format!("{:?}", s)).collect::<Vec<_>>().join(", ")
                            ),
                            val.to_string(),
                        ));
                    }
                }
            }
            FieldConstraint::MaxLength(max_len) => {
                if let Some(val) = value.as_str() {
                    if val.len() > *max_len {
                        return Err(fail(format!("Maximum length is {}", max_len), val.to_string()));
                    }
                }
            }
            FieldConstraint::Custom(validator) => {
                if let Some(val) = value.as_str() {
                    if !validator(val) {
                        return Err(fail("Custom validation failed".to_string(), val.to_string()));
                    }
                }
            }
        }
        Ok(())
    }

    fn get_nested_value<'a>(&self, config: &'a toml::Value, path: &str) -> Option<&'a toml::Value> {
        let mut current = config;

        for part in path.split('.') {
            current = current.as_table()?.get(part)?;
        }

        Some(current)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}
