//! View requests and the trend engine
//!
//! A [`ViewRequest`] captures everything a plot needs to be recomputed:
//! modality, surgery, time window, channel order, visible channels and
//! metric. [`TrendEngine`] turns a recording plus a request into plot-ready
//! series. Nothing is cached; identical inputs yield identical outputs.

use super::aggregation::{summarize_across_channels, summarize_stats, CrossChannelSummary, GlobalStats};
use super::reduction::{compute_metric, compute_stats, Metric, StatsTable};
use super::selection::{filter_channels, select_interval, select_rows, select_snapshot, Modality};
use super::trend::{
    assemble_channel_series, assemble_stats_series, resolve_channel_order, ChannelOrder, ChannelSeries,
    StatsSeries,
};
use super::waveform::{stack_waveforms, WaveformStack};
use crate::config::AnalysisSettings;
use crate::error::{NervioErrorBuilder, NervioResult};
use crate::ingest::Recording;
use crate::signal::{SignalTable, SurgeryId, Timestamp};
use serde::Serialize;
use std::collections::HashSet;

/// Immutable description of one plot refresh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewRequest {
    modality: Option<Modality>,
    surgery: Option<SurgeryId>,
    until: Option<Timestamp>,
    interval: Option<(Timestamp, Timestamp)>,
    channel_order: ChannelOrder,
    visible_channels: Option<Vec<String>>,
    metric: Option<Metric>,
}

impl ViewRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modality(mut self, modality: Modality) -> Self {
        self.modality = Some(modality);
        self
    }

    pub fn surgery(mut self, surgery: impl Into<SurgeryId>) -> Self {
        self.surgery = Some(surgery.into());
        self
    }

    /// Keep rows with `timestamp <= until`
    pub fn until(mut self, until: impl Into<Timestamp>) -> Self {
        self.until = Some(until.into());
        self
    }

    /// Keep rows with `start <= timestamp <= end`
    pub fn interval(mut self, start: impl Into<Timestamp>, end: impl Into<Timestamp>) -> Self {
        self.interval = Some((start.into(), end.into()));
        self
    }

    pub fn channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    /// Restrict output to these channels; all channels are shown when unset
    pub fn visible_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visible_channels = Some(channels.into_iter().map(Into::into).collect());
        self
    }

    pub fn metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn surgery_id(&self) -> Option<&SurgeryId> {
        self.surgery.as_ref()
    }

    pub fn order(&self) -> &ChannelOrder {
        &self.channel_order
    }
}

/// Per-channel metric series plus the cross-channel overview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendView {
    pub modality: Modality,
    pub metric: Metric,
    pub series: Vec<ChannelSeries>,
    pub summary: CrossChannelSummary,
}

/// Per-channel mean/median/max series plus global labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsView {
    pub modality: Modality,
    pub series: Vec<StatsSeries>,
    pub global: Option<GlobalStats>,
}

/// Computes views from a recording and a request
#[derive(Debug, Clone, Default)]
pub struct TrendEngine {
    settings: AnalysisSettings,
}

impl TrendEngine {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    fn modality(&self, request: &ViewRequest) -> Modality {
        request.modality.unwrap_or(self.settings.default_modality)
    }

    fn select(&self, recording: &Recording, request: &ViewRequest) -> SignalTable {
        let source = recording.table(self.modality(request));

        let selected = match (&request.surgery, request.until) {
            (Some(surgery), until) => select_rows(Some(&*source), surgery, until),
            (None, Some(until)) => select_interval(Some(&*source), Timestamp(f64::NEG_INFINITY), until),
            (None, None) => source.into_owned(),
        };

        match request.interval {
            Some((start, end)) => select_interval(Some(&selected), start, end),
            None => selected,
        }
    }

    /// Metric trend of every visible channel
    pub fn trend(&self, recording: &Recording, request: &ViewRequest) -> TrendView {
        let modality = self.modality(request);
        let metric = request.metric.unwrap_or(self.settings.default_metric);
        let selected = self.select(recording, request);

        let table = filter_channels(
            compute_metric(Some(&selected), metric),
            request.visible_channels.as_deref(),
        );
        let mut series = assemble_channel_series(&table, &request.channel_order, &self.settings.grouping());
        for s in &mut series {
            s.title = modality.channel_title(&s.channel, s.region);
        }
        let summary = summarize_across_channels(&table);

        tracing::debug!(%modality, %metric, channels = series.len(), "trend view computed");
        TrendView { modality, metric, series, summary }
    }

    /// Mean, median and max trend of every visible channel
    pub fn stats(&self, recording: &Recording, request: &ViewRequest) -> StatsView {
        let modality = self.modality(request);
        let selected = self.select(recording, request);

        let mut table = compute_stats(Some(&selected));
        if let Some(visible) = &request.visible_channels {
            let visible: HashSet<&str> = visible.iter().map(String::as_str).collect();
            table = StatsTable {
                rows: table.rows.into_iter().filter(|row| visible.contains(row.channel.as_str())).collect(),
            };
        }

        let mut series = assemble_stats_series(&table, &request.channel_order, &self.settings.grouping());
        for s in &mut series {
            s.title = modality.channel_title(&s.channel, s.region);
        }
        let global = summarize_stats(&table);

        tracing::debug!(%modality, channels = series.len(), "stats view computed");
        StatsView { modality, series, global }
    }

    /// Stacked waveforms of one surgery at one instant.
    ///
    /// SSEP rows without a baseline borrow the MEP baseline of the same
    /// surgery and channel.
    pub fn waveforms(
        &self,
        recording: &Recording,
        request: &ViewRequest,
        timestamp: Timestamp,
    ) -> NervioResult<WaveformStack> {
        let modality = self.modality(request);
        let surgery = request.surgery.as_ref().ok_or_else(|| {
            NervioErrorBuilder::new("view", "waveforms").invalid_data("surgery_id", "a surgery must be selected")
        })?;

        let source = recording.table(modality);
        let channels: Vec<String> = match &request.visible_channels {
            Some(visible) => visible.clone(),
            None => source.channels(),
        };
        let snapshot = select_snapshot(Some(&*source), surgery, timestamp, &channels);
        let ordered = resolve_channel_order(snapshot.iter().map(|row| row.channel.as_str()), &request.channel_order);

        let baseline_source = match modality {
            Modality::Mep => None,
            _ => Some(&recording.mep),
        };
        stack_waveforms(&snapshot, &ordered, baseline_source, self.settings.trace_offset_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::trend::DisplayGroup;
    use crate::signal::SignalRow;

    fn recording() -> Recording {
        Recording {
            mep: SignalTable::new(vec![
                SignalRow::new("S1", 0, "L APB", vec![1.0, -1.0], 1000.0),
                SignalRow::new("S1", 0, "R APB", vec![3.0], 1000.0),
                SignalRow::new("S1", 1, "L APB", vec![2.0], 1000.0),
                SignalRow::new("S2", 0, "L APB", vec![9.0], 1000.0),
            ])
            .unwrap(),
            ssep_upper: SignalTable::new(vec![SignalRow::new("S1", 0, "N20", vec![1.0], 1000.0)]).unwrap(),
            ssep_lower: SignalTable::new(vec![SignalRow::new("S1", 0, "P37", vec![2.0], 1000.0)]).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_trend_defaults_to_l1_mep() {
        let view = TrendEngine::default().trend(&recording(), &ViewRequest::new().surgery("S1"));
        assert_eq!(view.metric, Metric::L1);
        assert_eq!(view.series.len(), 2);
        assert_eq!(view.series[0].values, vec![2.0, 2.0]);
        assert_eq!(view.series[1].group, DisplayGroup::Secondary);
        assert_eq!(view.summary.at(Timestamp(0.0)), Some((2.0, 3.0, 2.5)));
    }

    #[test]
    fn test_visible_channels_drive_summary() {
        let request = ViewRequest::new().surgery("S1").visible_channels(["R APB"]);
        let view = TrendEngine::default().trend(&recording(), &request);
        assert_eq!(view.series.len(), 1);
        assert_eq!(view.summary.at(Timestamp(0.0)), Some((3.0, 3.0, 3.0)));
    }

    #[test]
    fn test_ssep_titles() {
        let engine = TrendEngine::default();
        let upper = engine.trend(&recording(), &ViewRequest::new().modality(Modality::SsepUpper).surgery("S1"));
        assert_eq!(upper.series[0].title, "Upper: N20");

        let combined = engine.stats(&recording(), &ViewRequest::new().modality(Modality::Ssep).surgery("S1"));
        let titles: Vec<_> = combined.series.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Upper: N20", "Lower: P37"]);
    }

    #[test]
    fn test_combined_ssep_keeps_regions_apart() {
        let rec = Recording {
            ssep_upper: SignalTable::new(vec![SignalRow::new("S1", 0, "Cz", vec![1.0], 1000.0)]).unwrap(),
            ssep_lower: SignalTable::new(vec![SignalRow::new("S1", 0, "Cz", vec![9.0], 1000.0)]).unwrap(),
            ..Default::default()
        };
        let request = ViewRequest::new().modality(Modality::Ssep).surgery("S1");
        let engine = TrendEngine::default();

        let view = engine.trend(&rec, &request);
        let titles: Vec<_> = view.series.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Upper: Cz", "Lower: Cz"]);
        assert_eq!(view.series[0].values, vec![1.0]);
        assert_eq!(view.series[1].values, vec![9.0]);
        assert_eq!(view.series[1].timestamps, vec![Timestamp(0.0)]);
        assert_eq!(view.summary.at(Timestamp(0.0)), Some((1.0, 9.0, 5.0)));

        let stats = engine.stats(&rec, &request);
        assert_eq!(stats.series.len(), 2);
        assert_eq!(stats.series[1].title, "Lower: Cz");
    }

    #[test]
    fn test_interval_and_until() {
        let engine = TrendEngine::default();
        let early = engine.trend(&recording(), &ViewRequest::new().surgery("S1").until(0));
        assert_eq!(early.summary.len(), 1);

        let windowed = engine.trend(&recording(), &ViewRequest::new().surgery("S1").interval(1, 5));
        assert_eq!(windowed.series.len(), 1);
        assert_eq!(windowed.series[0].timestamps, vec![Timestamp(1.0)]);
    }

    #[test]
    fn test_views_are_repeatable() {
        let engine = TrendEngine::default();
        let rec = recording();
        let request = ViewRequest::new().surgery("S1").metric(Metric::Rms);
        assert_eq!(engine.trend(&rec, &request), engine.trend(&rec, &request));
        assert_eq!(engine.stats(&rec, &request), engine.stats(&rec, &request));
    }

    #[test]
    fn test_waveforms_need_surgery() {
        let engine = TrendEngine::default();
        assert!(engine.waveforms(&recording(), &ViewRequest::new(), Timestamp(0.0)).is_err());

        let stack = engine
            .waveforms(&recording(), &ViewRequest::new().surgery("S1"), Timestamp(0.0))
            .unwrap();
        assert_eq!(stack.traces.len(), 2);
        assert!((stack.offset_step - 3.6).abs() < 1e-12);
    }
}
