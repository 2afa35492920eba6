//! Shape checks and typed decoding of the recording document

use super::IngestError;
use crate::config::constants::ingest::REQUIRED_COLUMNS;
use crate::signal::table::first_duplicate;
use crate::signal::{SignalRow, SignalTable, SurgeryCatalog, SurgeryMeta};
use crate::utils::validation::{validate_channel_name, validate_finite_samples, validate_signal_rate};
use serde_json::{Map, Value};

fn invalid_row(table: &str, row: usize, reason: impl Into<String>) -> IngestError {
    IngestError::InvalidRow {
        table: table.to_string(),
        row,
        reason: reason.into(),
    }
}

fn check_columns(table: &str, record: &Map<String, Value>) -> Result<(), IngestError> {
    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !record.contains_key(**column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    Err(IngestError::MissingColumns {
        table: table.to_string(),
        columns: missing,
    })
}

fn check_row(table: &str, index: usize, row: &SignalRow) -> Result<(), IngestError> {
    let reason = |e: crate::utils::ValidationError| invalid_row(table, index, e.to_string());

    validate_channel_name(&row.channel).map_err(reason)?;
    validate_signal_rate(row.signal_rate, "signal_rate").map_err(reason)?;
    if let Some(rate) = row.baseline_signal_rate {
        validate_signal_rate(rate, "baseline_signal_rate").map_err(reason)?;
    }
    if !row.timestamp.value().is_finite() {
        return Err(invalid_row(table, index, "timestamp must be finite"));
    }
    validate_finite_samples(&row.values, "values").map_err(reason)?;
    validate_finite_samples(&row.baseline_values, "baseline_values").map_err(reason)?;
    Ok(())
}

/// Decode one signal table: a list of row records, or `null` for no rows
pub(crate) fn parse_signal_table(table: &str, value: &Value) -> Result<SignalTable, IngestError> {
    let records = match value {
        Value::Null => return Ok(SignalTable::empty()),
        Value::Array(records) => records,
        _ => {
            return Err(IngestError::NotATable {
                table: table.to_string(),
            })
        }
    };

    let mut rows = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let Value::Object(fields) = record else {
            return Err(invalid_row(table, index, "row is not an object"));
        };
        check_columns(table, fields)?;

        let row: SignalRow = serde_json::from_value(record.clone())
            .map_err(|e| invalid_row(table, index, e.to_string()))?;
        check_row(table, index, &row)?;
        rows.push(row);
    }

    if let Some(index) = first_duplicate(&rows) {
        return Err(invalid_row(table, index, "duplicate (surgery_id, timestamp, channel)"));
    }

    Ok(SignalTable::from_rows_unchecked(rows))
}

fn parse_meta(record: Value) -> Result<SurgeryMeta, IngestError> {
    serde_json::from_value(record).map_err(|e| IngestError::InvalidSurgeryMeta(e.to_string()))
}

/// Decode surgery metadata: an object keyed by surgery id, or a list of
/// records that each carry `surgery_id`
pub(crate) fn parse_surgery_catalog(value: &Value) -> Result<SurgeryCatalog, IngestError> {
    let entries = match value {
        Value::Null => Vec::new(),
        Value::Array(records) => records
            .iter()
            .cloned()
            .map(parse_meta)
            .collect::<Result<Vec<_>, _>>()?,
        Value::Object(by_id) => by_id
            .iter()
            .map(|(id, fields)| {
                let Value::Object(fields) = fields else {
                    return Err(IngestError::InvalidSurgeryMeta(format!(
                        "entry for surgery {} is not an object",
                        id
                    )));
                };
                let mut fields = fields.clone();
                fields.insert("surgery_id".to_string(), Value::String(id.clone()));
                parse_meta(Value::Object(fields))
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(IngestError::InvalidSurgeryMeta(format!(
                "expected an object or a list, found {}",
                kind_of(other)
            )))
        }
    };

    Ok(SurgeryCatalog::new(entries))
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(channel: &str, timestamp: f64) -> Value {
        json!({
            "surgery_id": 17,
            "timestamp": timestamp,
            "channel": channel,
            "values": [1.0, -1.0],
            "stimulus": {"intensity_ma": 20},
            "signal_rate": 1000.0,
            "baseline_timestamp": null,
            "baseline_values": null,
            "baseline_stimulus": null,
            "baseline_signal_rate": null
        })
    }

    #[test]
    fn test_parse_rows() {
        let table = parse_signal_table("mep_data", &json!([record("APB", 0.0), record("TA", 0.0)])).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].surgery_id.as_str(), "17");
        assert!(table.rows()[1].baseline_values.is_empty());
    }

    #[test]
    fn test_null_table_is_empty() {
        assert!(parse_signal_table("ssep_upper_data", &Value::Null).unwrap().is_empty());
        assert!(matches!(
            parse_signal_table("ssep_upper_data", &json!("rows")),
            Err(IngestError::NotATable { .. })
        ));
    }

    #[test]
    fn test_missing_columns_sorted() {
        let mut row = record("APB", 0.0);
        let fields = row.as_object_mut().unwrap();
        fields.remove("values");
        fields.remove("baseline_stimulus");

        match parse_signal_table("mep_data", &json!([row])) {
            Err(IngestError::MissingColumns { table, columns }) => {
                assert_eq!(table, "mep_data");
                assert_eq!(columns, vec!["baseline_stimulus", "values"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_row_shape_errors() {
        let mut bad_rate = record("APB", 0.0);
        bad_rate["signal_rate"] = json!(0.0);
        assert!(matches!(
            parse_signal_table("mep_data", &json!([bad_rate])),
            Err(IngestError::InvalidRow { row: 0, .. })
        ));

        let mut text_values = record("APB", 0.0);
        text_values["values"] = json!(["a"]);
        assert!(parse_signal_table("mep_data", &json!([text_values])).is_err());

        let duplicate = json!([record("APB", 1.0), record("TA", 1.0), record("APB", 1.0)]);
        assert!(matches!(
            parse_signal_table("mep_data", &duplicate),
            Err(IngestError::InvalidRow { row: 2, .. })
        ));
    }

    #[test]
    fn test_surgery_catalog_orientations() {
        let by_id = parse_surgery_catalog(&json!({
            "17": {"date": "2024-03-01", "protocol": "spine"},
            "18": {"date": "2024-03-02", "surgeon": "A"}
        }))
        .unwrap();
        assert_eq!(by_id.len(), 2);
        let second = by_id.get(&"18".into()).unwrap();
        assert_eq!(second.extra.get("surgeon"), Some(&json!("A")));

        let records = parse_surgery_catalog(&json!([{"surgery_id": 5, "protocol": "cranial"}])).unwrap();
        assert_eq!(records.get(&"5".into()).and_then(|m| m.protocol.as_deref()), Some("cranial"));

        assert!(matches!(parse_surgery_catalog(&json!(3)), Err(IngestError::InvalidSurgeryMeta(_))));
        assert!(parse_surgery_catalog(&json!([{"date": "2024"}])).is_err());
    }
}
