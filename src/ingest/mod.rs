//! Recording ingestion
//!
//! A recording is one JSON document holding the MEP table, the upper and
//! lower SSEP tables and the surgery metadata:
//!
//! ```json
//! {
//!   "mep_data": [ { "surgery_id": 17, "timestamp": 0, "channel": "APB", ... } ],
//!   "ssep_upper_data": [],
//!   "ssep_lower_data": [],
//!   "surgerydata": { "17": { "date": "2024-03-01" } }
//! }
//! ```

mod schema;

use crate::config::constants::ingest::{
    LEGACY_SURGERY_KEY, MEP_KEY, REQUIRED_KEYS, SSEP_LOWER_KEY, SSEP_UPPER_KEY, SURGERY_KEY,
};
use crate::processing::selection::{combine_regions, Modality};
use crate::signal::{SignalTable, SurgeryCatalog};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("recording file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("recording is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("recording must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("recording is missing keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("{table} must be a list of row objects")]
    NotATable { table: String },

    #[error("{table} rows are missing columns: {}", .columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("invalid surgery metadata: {0}")]
    InvalidSurgeryMeta(String),

    #[error("{table} row {row}: {reason}")]
    InvalidRow {
        table: String,
        row: usize,
        reason: String,
    },
}

impl IngestError {
    /// File the error refers to, when there is one
    pub fn path(&self) -> Option<&Path> {
        match self {
            IngestError::FileNotFound(path) | IngestError::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Row counts per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordingSummary {
    pub mep_rows: usize,
    pub ssep_upper_rows: usize,
    pub ssep_lower_rows: usize,
    pub surgeries: usize,
}

/// All tables of one recording
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    pub mep: SignalTable,
    pub ssep_upper: SignalTable,
    pub ssep_lower: SignalTable,
    pub surgeries: SurgeryCatalog,
}

impl Recording {
    /// Decode a recording document
    pub fn from_json_str(text: &str) -> Result<Self, IngestError> {
        let document: Value = serde_json::from_str(text)?;
        Self::from_json_value(&document)
    }

    pub fn from_json_value(document: &Value) -> Result<Self, IngestError> {
        let Value::Object(fields) = document else {
            return Err(IngestError::NotAnObject(schema::kind_of(document)));
        };

        let surgery_value = fields.get(SURGERY_KEY).or_else(|| fields.get(LEGACY_SURGERY_KEY));
        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|key| match **key {
                SURGERY_KEY => surgery_value.is_none(),
                key => !fields.contains_key(key),
            })
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::MissingKeys(missing));
        }

        let table = |key: &str| schema::parse_signal_table(key, fields.get(key).unwrap_or(&Value::Null));
        let recording = Recording {
            mep: table(MEP_KEY)?,
            ssep_upper: table(SSEP_UPPER_KEY)?,
            ssep_lower: table(SSEP_LOWER_KEY)?,
            surgeries: schema::parse_surgery_catalog(surgery_value.unwrap_or(&Value::Null))?,
        };

        let summary = recording.summary();
        tracing::info!(
            mep_rows = summary.mep_rows,
            ssep_upper_rows = summary.ssep_upper_rows,
            ssep_lower_rows = summary.ssep_lower_rows,
            surgeries = summary.surgeries,
            "recording decoded"
        );
        Ok(recording)
    }

    /// Source table of a modality; the combined SSEP table is built on demand
    pub fn table(&self, modality: Modality) -> Cow<'_, SignalTable> {
        match modality {
            Modality::Mep => Cow::Borrowed(&self.mep),
            Modality::SsepUpper => Cow::Borrowed(&self.ssep_upper),
            Modality::SsepLower => Cow::Borrowed(&self.ssep_lower),
            Modality::Ssep => Cow::Owned(combine_regions(Some(&self.ssep_upper), Some(&self.ssep_lower))),
        }
    }

    pub fn summary(&self) -> RecordingSummary {
        RecordingSummary {
            mep_rows: self.mep.len(),
            ssep_upper_rows: self.ssep_upper.len(),
            ssep_lower_rows: self.ssep_lower.len(),
            surgeries: self.surgeries.len(),
        }
    }
}

/// Read and decode a recording file
pub fn load_recording<P: AsRef<Path>>(path: P) -> Result<Recording, IngestError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(IngestError::FileNotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), bytes = text.len(), "loading recording");
    Recording::from_json_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Region;
    use serde_json::json;

    fn row(channel: &str) -> Value {
        json!({
            "surgery_id": "S1", "timestamp": 0, "channel": channel, "values": [1.0],
            "stimulus": null, "signal_rate": 1000, "baseline_timestamp": null,
            "baseline_values": [], "baseline_stimulus": null, "baseline_signal_rate": null
        })
    }

    #[test]
    fn test_missing_keys_in_fixed_order() {
        let err = Recording::from_json_value(&json!({"ssep_upper_data": []})).unwrap_err();
        match err {
            IngestError::MissingKeys(keys) => {
                assert_eq!(keys, vec!["mep_data", "ssep_lower_data", "surgerydata"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            Recording::from_json_str("[1, 2]"),
            Err(IngestError::NotAnObject("list"))
        ));
        assert!(matches!(Recording::from_json_str("{"), Err(IngestError::Parse(_))));
    }

    #[test]
    fn test_legacy_surgery_key() {
        let recording = Recording::from_json_value(&json!({
            "mep_data": [row("APB")],
            "ssep_upper_data": [row("N20")],
            "ssep_lower_data": [row("P37")],
            "_surgerydata": {"S1": {"date": "2024-03-01"}}
        }))
        .unwrap();

        assert_eq!(recording.surgeries.ids(), vec!["S1".into()]);
        assert_eq!(recording.summary().mep_rows, 1);

        let combined = recording.table(Modality::Ssep);
        let regions: Vec<_> = combined.iter().map(|r| r.region).collect();
        assert_eq!(regions, vec![Some(Region::Upper), Some(Region::Lower)]);
        assert!(matches!(recording.table(Modality::Mep), Cow::Borrowed(_)));
    }

    #[test]
    fn test_signed_zero_timestamps_are_duplicates() {
        let mut negative = row("A");
        negative["timestamp"] = json!(-0.0);
        let err = Recording::from_json_value(&json!({
            "mep_data": [negative, row("A")],
            "ssep_upper_data": [],
            "ssep_lower_data": [],
            "surgerydata": {}
        }))
        .unwrap_err();

        match err {
            IngestError::InvalidRow { table, row, reason } => {
                assert_eq!(table, "mep_data");
                assert_eq!(row, 1);
                assert!(reason.contains("duplicate"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_recording("does/not/exist.json").unwrap_err();
        assert_eq!(err.path(), Some(Path::new("does/not/exist.json")));
        assert!(err.to_string().contains("not found"));
    }
}
