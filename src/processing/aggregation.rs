//! Cross-channel aggregation for the trend overview

use super::reduction::{MetricTable, StatsTable};
use crate::signal::Timestamp;
use serde::Serialize;
use std::collections::BTreeMap;

/// Min, max and mean of the metric across channels, per timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossChannelSummary {
    pub timestamps: Vec<Timestamp>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
    pub mean: Vec<f64>,
}

impl CrossChannelSummary {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// (min, max, mean) at a timestamp, if any channel reported one
    pub fn at(&self, timestamp: Timestamp) -> Option<(f64, f64, f64)> {
        let index = self.timestamps.binary_search(&timestamp).ok()?;
        Some((self.min[index], self.max[index], self.mean[index]))
    }
}

// Rounding in the sum can push the mean a ulp past the extremes.
fn bounded_mean(mean: f64, lo: f64, hi: f64) -> f64 {
    if lo <= hi {
        mean.clamp(lo, hi)
    } else {
        mean
    }
}

/// Collapse a metric table over its channel dimension.
///
/// Channels missing at a timestamp are left out of that timestamp's group.
pub fn summarize_across_channels(table: &MetricTable) -> CrossChannelSummary {
    let mut groups: BTreeMap<Timestamp, Vec<f64>> = BTreeMap::new();
    for row in &table.rows {
        groups.entry(row.timestamp).or_default().push(row.value);
    }

    let mut summary = CrossChannelSummary::default();
    for (timestamp, values) in groups {
        let (lo, hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        summary.timestamps.push(timestamp);
        summary.min.push(lo);
        summary.max.push(hi);
        summary.mean.push(bounded_mean(mean, lo, hi));
    }

    tracing::debug!(metric = %table.metric, timestamps = summary.len(), "summarized across channels");
    summary
}

/// Global extremes and mean over every stats cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlobalStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

pub fn summarize_stats(table: &StatsTable) -> Option<GlobalStats> {
    if table.is_empty() {
        return None;
    }

    let cells = table.rows.iter().flat_map(|row| [row.mean, row.median, row.max]);
    let (mut min, mut max, mut sum, mut count) = (f64::INFINITY, f64::NEG_INFINITY, 0.0, 0usize);
    for cell in cells {
        min = min.min(cell);
        max = max.max(cell);
        sum += cell;
        count += 1;
    }

    Some(GlobalStats {
        min,
        max,
        mean: bounded_mean(sum / count as f64, min, max),
    })
}
