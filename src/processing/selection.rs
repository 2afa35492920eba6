//! Data-source selection: modality, surgery and time filters
//!
//! All filters are pure; the source table is never modified.

use super::reduction::MetricTable;
use crate::error::{NervioError, NervioErrorBuilder};
use crate::signal::{Region, SignalRow, SignalTable, SurgeryId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Which raw table feeds the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Mep,
    SsepUpper,
    SsepLower,
    /// Upper and lower SSEP combined, upper first
    Ssep,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Mep => "mep",
            Modality::SsepUpper => "ssep_upper",
            Modality::SsepLower => "ssep_lower",
            Modality::Ssep => "ssep",
        }
    }

    /// Display title of a channel plotted under this modality
    pub fn channel_title(self, channel: &str, region: Option<Region>) -> String {
        match (self, region) {
            (Modality::SsepUpper, _) => format!("Upper: {}", channel),
            (Modality::SsepLower, _) => format!("Lower: {}", channel),
            (Modality::Ssep, Some(region)) => format!("{}: {}", region, channel),
            _ => channel.to_string(),
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = NervioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mep" => Ok(Modality::Mep),
            "ssep_upper" => Ok(Modality::SsepUpper),
            "ssep_lower" => Ok(Modality::SsepLower),
            "ssep" => Ok(Modality::Ssep),
            other => Err(NervioErrorBuilder::new("selection", "parse_modality").invalid_value(
                "modality",
                "unknown modality",
                "mep|ssep_upper|ssep_lower|ssep",
                other,
            )),
        }
    }
}

fn filtered<F>(table: Option<&SignalTable>, keep: F) -> SignalTable
where
    F: Fn(&SignalRow) -> bool,
{
    let rows = SignalTable::rows_of(table)
        .iter()
        .filter(|row| keep(row))
        .cloned()
        .collect();
    // a subset of a valid table keeps unique keys
    SignalTable::from_rows_unchecked(rows)
}

/// Rows of one surgery, optionally up to and including `until`
pub fn select_rows(
    table: Option<&SignalTable>,
    surgery_id: &SurgeryId,
    until: Option<Timestamp>,
) -> SignalTable {
    let selected = filtered(table, |row| {
        &row.surgery_id == surgery_id && until.map_or(true, |bound| row.timestamp <= bound)
    });
    tracing::debug!(surgery = %surgery_id, rows = selected.len(), "selected surgery rows");
    selected
}

/// Rows with `start <= timestamp <= end`; a reversed window selects nothing
pub fn select_interval(table: Option<&SignalTable>, start: Timestamp, end: Timestamp) -> SignalTable {
    filtered(table, |row| start <= row.timestamp && row.timestamp <= end)
}

/// Rows of one surgery at one instant, restricted to `channels`
pub fn select_snapshot(
    table: Option<&SignalTable>,
    surgery_id: &SurgeryId,
    timestamp: Timestamp,
    channels: &[String],
) -> SignalTable {
    let wanted: HashSet<&str> = channels.iter().map(String::as_str).collect();
    filtered(table, |row| {
        &row.surgery_id == surgery_id && row.timestamp == timestamp && wanted.contains(row.channel.as_str())
    })
}

/// Concatenate upper then lower SSEP rows, tagging each with its region
pub fn combine_regions(upper: Option<&SignalTable>, lower: Option<&SignalTable>) -> SignalTable {
    let tagged = |rows: &[SignalRow], region: Region| -> Vec<SignalRow> {
        rows.iter().cloned().map(|row| row.with_region(region)).collect()
    };

    let mut rows = tagged(SignalTable::rows_of(upper), Region::Upper);
    rows.extend(tagged(SignalTable::rows_of(lower), Region::Lower));
    SignalTable::from_rows_unchecked(rows)
}

/// Keep only metric rows of visible channels
pub fn filter_channels(table: MetricTable, visible: Option<&[String]>) -> MetricTable {
    match visible {
        None => table,
        Some(visible) => {
            let visible: HashSet<&str> = visible.iter().map(String::as_str).collect();
            let rows = table
                .rows
                .into_iter()
                .filter(|row| visible.contains(row.channel.as_str()))
                .collect();
            MetricTable { metric: table.metric, rows }
        }
    }
}
