//! Per-row reductions: one scalar metric per waveform
//!
//! Every reduction maps an empty sequence to `0.0`; no division by zero can
//! occur and no NaN is produced for degenerate rows.

use crate::error::{NervioError, NervioErrorBuilder};
use crate::signal::{Region, SignalRow, SignalTable, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scalar metric computed from a waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    L1,
    #[serde(rename = "p2p")]
    PeakToPeak,
    Rms,
    Mean,
    Median,
    Max,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::L1,
        Metric::PeakToPeak,
        Metric::Rms,
        Metric::Mean,
        Metric::Median,
        Metric::Max,
    ];

    /// Name of the metric column in output tables
    pub fn column_name(self) -> &'static str {
        match self {
            Metric::L1 => "l1",
            Metric::PeakToPeak => "p2p",
            Metric::Rms => "rms",
            Metric::Mean => "mean",
            Metric::Median => "median",
            Metric::Max => "max",
        }
    }

    pub fn reduce(self, values: &[f64]) -> f64 {
        match self {
            Metric::L1 => l1_norm(values),
            Metric::PeakToPeak => peak_to_peak(values),
            Metric::Rms => rms(values),
            Metric::Mean => mean(values),
            Metric::Median => median(values),
            Metric::Max => max(values),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Metric {
    type Err = NervioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l1" | "l1_norm" => Ok(Metric::L1),
            "p2p" | "peak_to_peak" => Ok(Metric::PeakToPeak),
            "rms" => Ok(Metric::Rms),
            "mean" => Ok(Metric::Mean),
            "median" => Ok(Metric::Median),
            "max" => Ok(Metric::Max),
            other => Err(NervioErrorBuilder::new("reduction", "parse_metric").invalid_value(
                "metric",
                "unknown metric name",
                "l1|p2p|rms|mean|median|max",
                other,
            )),
        }
    }
}

/// Sum of absolute values
pub fn l1_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v.abs()).sum()
}

/// Max minus min
pub fn peak_to_peak(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    hi - lo
}

/// Root mean square
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = values.iter().map(|&v| v * v).sum();
    (sum_squares / values.len() as f64).sqrt()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Middle of the sorted sequence, averaging the two middle samples for even lengths
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn max(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// One metric value for a (timestamp, channel) row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub timestamp: Timestamp,
    pub channel: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

impl MetricRow {
    pub fn new(timestamp: impl Into<Timestamp>, channel: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            channel: channel.into(),
            value,
            region: None,
        }
    }
}

/// Output of [`compute_metric`]: one row per input row, input order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTable {
    pub metric: Metric,
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    pub fn empty(metric: Metric) -> Self {
        Self { metric, rows: Vec::new() }
    }

    pub fn columns(&self) -> [&'static str; 3] {
        ["timestamp", "channel", self.metric.column_name()]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Mean, median and max of one row's waveform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRow {
    pub timestamp: Timestamp,
    pub channel: String,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsTable {
    pub rows: Vec<StatsRow>,
}

impl StatsTable {
    pub const COLUMNS: [&'static str; 5] = ["timestamp", "channel", "mean", "median", "max"];

    pub fn columns(&self) -> [&'static str; 5] {
        Self::COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn map_rows<T, F>(rows: &[SignalRow], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&SignalRow) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        rows.par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        rows.iter().map(f).collect()
    }
}

/// Reduce every row of `table` with `metric`.
///
/// Absent or empty input yields an empty table with the same columns.
pub fn compute_metric(table: Option<&SignalTable>, metric: Metric) -> MetricTable {
    let rows = SignalTable::rows_of(table);
    if rows.is_empty() {
        return MetricTable::empty(metric);
    }

    let rows = map_rows(rows, |row| MetricRow {
        timestamp: row.timestamp,
        channel: row.channel.clone(),
        value: metric.reduce(&row.values),
        region: row.region,
    });

    tracing::debug!(metric = %metric, rows = rows.len(), "computed metric table");
    MetricTable { metric, rows }
}

/// L1 norm of every row
pub fn calculate_l1(table: Option<&SignalTable>) -> MetricTable {
    compute_metric(table, Metric::L1)
}

/// Mean, median and max of every row
pub fn compute_stats(table: Option<&SignalTable>) -> StatsTable {
    let rows = SignalTable::rows_of(table);
    if rows.is_empty() {
        return StatsTable::default();
    }

    let rows = map_rows(rows, |row| StatsRow {
        timestamp: row.timestamp,
        channel: row.channel.clone(),
        mean: mean(&row.values),
        median: median(&row.values),
        max: max(&row.values),
        region: row.region,
    });

    tracing::debug!(rows = rows.len(), "computed stats table");
    StatsTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_symmetric_pair() {
        let v = [-2.0, 2.0];
        assert_eq!(l1_norm(&v), 4.0);
        assert_eq!(peak_to_peak(&v), 4.0);
        assert!(approx_eq(rms(&v), 2.0_f64.sqrt()));
    }

    #[test]
    fn test_empty_sequence_is_zero_for_every_metric() {
        for metric in Metric::ALL {
            assert_eq!(metric.reduce(&[]), 0.0, "{metric}");
        }
    }

    #[test]
    fn test_median_interpolates_even_length() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
    }

    #[test]
    fn test_max_of_negative_sequence() {
        assert_eq!(max(&[-3.0, -1.0, -2.0]), -1.0);
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("P2P".parse::<Metric>().unwrap(), Metric::PeakToPeak);
        assert_eq!("peak_to_peak".parse::<Metric>().unwrap(), Metric::PeakToPeak);
        assert_eq!("l1_norm".parse::<Metric>().unwrap(), Metric::L1);
        assert!("area".parse::<Metric>().is_err());
    }

    #[test]
    fn test_compute_metric_preserves_row_order() {
        let table = SignalTable::new(vec![
            SignalRow::new("S1", 2, "B", vec![1.0, -1.0], 1000.0),
            SignalRow::new("S1", 1, "A", vec![3.0], 1000.0),
            SignalRow::new("S1", 0, "C", vec![], 1000.0),
        ])
        .unwrap();

        let out = compute_metric(Some(&table), Metric::L1);
        let channels: Vec<_> = out.rows.iter().map(|r| r.channel.as_str()).collect();
        assert_eq!(channels, vec!["B", "A", "C"]);
        assert_eq!(out.rows[0].value, 2.0);
        assert_eq!(out.rows[2].value, 0.0);
    }

    #[test]
    fn test_empty_input_keeps_schema() {
        let out = calculate_l1(None);
        assert!(out.is_empty());
        assert_eq!(out.columns(), ["timestamp", "channel", "l1"]);

        let stats = compute_stats(Some(&SignalTable::empty()));
        assert!(stats.is_empty());
        assert_eq!(stats.columns(), ["timestamp", "channel", "mean", "median", "max"]);
    }

    #[test]
    fn test_stats_rows() {
        let rows = (0..5)
            .map(|i| {
                let i = i as f64;
                SignalRow::new("S1", i, "ch", vec![i, i + 1.0, i + 2.0], 1000.0)
            })
            .collect();
        let table = SignalTable::new(rows).unwrap();
        let stats = compute_stats(Some(&table));

        assert_eq!(stats.rows[0].mean, 1.0);
        assert_eq!(stats.rows[4].median, 5.0);
        assert_eq!(stats.rows[2].max, 4.0);
    }
}
