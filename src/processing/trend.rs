//! Per-channel trend assembly
//!
//! Turns a metric (or stats) table into one time series per channel, in the
//! order the caller asked for. Channels named in the order but missing from
//! the data are dropped; data channels the order does not mention follow in
//! first-occurrence order. A channel without rows yields no series at all.
//! Region-tagged rows sharing a channel name form one series per region.

use super::reduction::{MetricRow, MetricTable, StatsRow, StatsTable};
use crate::config::constants::layout;
use crate::signal::{Region, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Caller-supplied display order of channel identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOrder(Vec<String>);

impl ChannelOrder {
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(channels.into_iter().map(Into::into).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Rows that belong to a (timestamp, channel, region) cell
pub trait ChannelKeyed {
    fn timestamp(&self) -> Timestamp;
    fn channel(&self) -> &str;
    fn region(&self) -> Option<Region>;
}

impl ChannelKeyed for MetricRow {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn channel(&self) -> &str {
        &self.channel
    }

    fn region(&self) -> Option<Region> {
        self.region
    }
}

impl ChannelKeyed for StatsRow {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn channel(&self) -> &str {
        &self.channel
    }

    fn region(&self) -> Option<Region> {
        self.region
    }
}

/// Distinct channels in first-occurrence order
pub fn distinct_channels<'a, I>(channels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    channels
        .into_iter()
        .filter(|channel| seen.insert(*channel))
        .map(str::to_string)
        .collect()
}

/// Final display order: ordered channels present in the data, then the rest
pub fn resolve_channel_order<'a, I>(channels: I, order: &ChannelOrder) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let present = distinct_channels(channels);
    let present_set: HashSet<&str> = present.iter().map(String::as_str).collect();

    let mut placed = HashSet::new();
    let mut resolved: Vec<String> = order
        .as_slice()
        .iter()
        .filter(|channel| present_set.contains(channel.as_str()))
        .filter(|channel| placed.insert(channel.as_str()))
        .cloned()
        .collect();

    for channel in &present {
        if !placed.contains(channel.as_str()) {
            resolved.push(channel.clone());
        }
    }
    resolved
}

/// Rows grouped per resolved channel, each group sorted by timestamp.
///
/// A channel present in several regions yields one group per region, in
/// first-occurrence order of the region.
pub fn group_by_channel<'r, R>(rows: &'r [R], order: &ChannelOrder) -> Vec<(String, Option<Region>, Vec<&'r R>)>
where
    R: ChannelKeyed,
{
    let mut buckets: HashMap<&str, Vec<(Option<Region>, Vec<&R>)>> = HashMap::new();
    for row in rows {
        let regions = buckets.entry(row.channel()).or_default();
        match regions.iter_mut().find(|(region, _)| *region == row.region()) {
            Some((_, group)) => group.push(row),
            None => regions.push((row.region(), vec![row])),
        }
    }

    resolve_channel_order(rows.iter().map(|row| row.channel()), order)
        .into_iter()
        .flat_map(|channel| {
            let regions = buckets.remove(channel.as_str()).unwrap_or_default();
            regions.into_iter().map(move |(region, mut group)| {
                group.sort_by_key(|row| row.timestamp());
                (channel.clone(), region, group)
            })
        })
        .collect()
}

/// Which side of the layout a channel is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayGroup {
    Primary,
    Secondary,
}

/// Case-insensitive channel-name prefix classification.
///
/// Purely a layout aid; never affects metric values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGrouping {
    secondary_prefix: String,
}

impl ChannelGrouping {
    pub fn new(secondary_prefix: &str) -> Self {
        Self {
            secondary_prefix: secondary_prefix.to_lowercase(),
        }
    }

    pub fn classify(&self, channel: &str) -> DisplayGroup {
        if !self.secondary_prefix.is_empty()
            && channel.to_lowercase().starts_with(&self.secondary_prefix)
        {
            DisplayGroup::Secondary
        } else {
            DisplayGroup::Primary
        }
    }
}

impl Default for ChannelGrouping {
    fn default() -> Self {
        Self::new(layout::DEFAULT_SECONDARY_PREFIX)
    }
}

/// One channel's metric over time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSeries {
    pub channel: String,
    pub region: Option<Region>,
    pub title: String,
    pub group: DisplayGroup,
    pub timestamps: Vec<Timestamp>,
    pub values: Vec<f64>,
}

impl ChannelSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One channel's mean/median/max over time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSeries {
    pub channel: String,
    pub region: Option<Region>,
    pub title: String,
    pub group: DisplayGroup,
    pub timestamps: Vec<Timestamp>,
    pub mean: Vec<f64>,
    pub median: Vec<f64>,
    pub max: Vec<f64>,
}

pub fn assemble_channel_series(
    table: &MetricTable,
    order: &ChannelOrder,
    grouping: &ChannelGrouping,
) -> Vec<ChannelSeries> {
    let series: Vec<ChannelSeries> = group_by_channel(&table.rows, order)
        .into_iter()
        .map(|(channel, region, rows)| ChannelSeries {
            region,
            group: grouping.classify(&channel),
            title: channel.clone(),
            timestamps: rows.iter().map(|row| row.timestamp).collect(),
            values: rows.iter().map(|row| row.value).collect(),
            channel,
        })
        .collect();

    tracing::debug!(metric = %table.metric, channels = series.len(), "assembled channel series");
    series
}

pub fn assemble_stats_series(
    table: &StatsTable,
    order: &ChannelOrder,
    grouping: &ChannelGrouping,
) -> Vec<StatsSeries> {
    group_by_channel(&table.rows, order)
        .into_iter()
        .map(|(channel, region, rows)| StatsSeries {
            region,
            group: grouping.classify(&channel),
            title: channel.clone(),
            timestamps: rows.iter().map(|row| row.timestamp).collect(),
            mean: rows.iter().map(|row| row.mean).collect(),
            median: rows.iter().map(|row| row.median).collect(),
            max: rows.iter().map(|row| row.max).collect(),
            channel,
        })
        .collect()
}
