// src/signal/table.rs
//! Signal tables and surgery metadata

use super::types::{Region, SignalRow, SurgeryId, Timestamp};
use crate::error::{NervioErrorBuilder, NervioResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Ordered collection of rows for one modality
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalTable {
    rows: Vec<SignalRow>,
}

impl SignalTable {
    /// Build a table, rejecting duplicate (surgery, timestamp, channel, region) keys
    pub fn new(rows: Vec<SignalRow>) -> NervioResult<Self> {
        if let Some(index) = first_duplicate(&rows) {
            let row = &rows[index];
            return Err(NervioErrorBuilder::new("signal_table", "new").invalid_value(
                "signal row",
                "duplicate (surgery_id, timestamp, channel) key",
                "unique key per row",
                &format!("{} @ {} / {} (row {})", row.surgery_id, row.timestamp, row.channel, index),
            ));
        }
        Ok(Self { rows })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Rows of an optional table; absent tables read as empty.
    pub fn rows_of(table: Option<&SignalTable>) -> &[SignalRow] {
        table.map(|t| t.rows.as_slice()).unwrap_or(&[])
    }

    pub(crate) fn from_rows_unchecked(rows: Vec<SignalRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SignalRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SignalRow> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<SignalRow> {
        self.rows
    }

    /// Distinct channels in first-occurrence order
    pub fn channels(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert(row.channel.as_str()))
            .map(|row| row.channel.clone())
            .collect()
    }

    /// Distinct channels of one region in first-occurrence order
    pub fn channels_in_region(&self, region: Region) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| row.region == Some(region))
            .filter(|row| seen.insert(row.channel.as_str()))
            .map(|row| row.channel.clone())
            .collect()
    }

    /// Distinct surgery ids in first-occurrence order
    pub fn surgery_ids(&self) -> Vec<SurgeryId> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert(&row.surgery_id))
            .map(|row| row.surgery_id.clone())
            .collect()
    }

    /// Sorted distinct timestamps recorded for a surgery
    pub fn timestamps(&self, surgery_id: &SurgeryId) -> Vec<Timestamp> {
        self.rows
            .iter()
            .filter(|row| &row.surgery_id == surgery_id)
            .map(|row| row.timestamp)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl<'a> IntoIterator for &'a SignalTable {
    type Item = &'a SignalRow;
    type IntoIter = std::slice::Iter<'a, SignalRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

pub(crate) fn first_duplicate(rows: &[SignalRow]) -> Option<usize> {
    let mut keys = HashSet::with_capacity(rows.len());
    rows.iter().position(|row| {
        !keys.insert((&row.surgery_id, row.timestamp, row.channel.as_str(), row.region))
    })
}

/// Descriptive record for one surgery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgeryMeta {
    pub surgery_id: SurgeryId,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SurgeryMeta {
    pub fn new(surgery_id: impl Into<SurgeryId>) -> Self {
        Self {
            surgery_id: surgery_id.into(),
            date: None,
            protocol: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Surgery metadata keyed by surgery id, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurgeryCatalog {
    entries: Vec<SurgeryMeta>,
}

impl SurgeryCatalog {
    pub fn new(entries: Vec<SurgeryMeta>) -> Self {
        Self { entries }
    }

    pub fn get(&self, surgery_id: &SurgeryId) -> Option<&SurgeryMeta> {
        self.entries.iter().find(|meta| &meta.surgery_id == surgery_id)
    }

    pub fn ids(&self) -> Vec<SurgeryId> {
        self.entries.iter().map(|meta| meta.surgery_id.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SurgeryMeta> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
