// src/processing/mod.rs
//! Trend and statistics pipeline for neuromonitoring recordings
//!
//! selection -> reduction -> per-channel assembly -> cross-channel
//! aggregation, plus waveform stacking and CSV export of the results.

pub mod aggregation;
pub mod export;
pub mod reduction;
pub mod selection;
pub mod trend;
pub mod view;
pub mod waveform;

pub use aggregation::{summarize_across_channels, summarize_stats, CrossChannelSummary, GlobalStats};
pub use export::CsvExporter;
pub use reduction::{
    calculate_l1, compute_metric, compute_stats, Metric, MetricRow, MetricTable, StatsRow, StatsTable,
};
pub use selection::{combine_regions, filter_channels, select_interval, select_rows, select_snapshot, Modality};
pub use trend::{
    assemble_channel_series, assemble_stats_series, resolve_channel_order, ChannelGrouping, ChannelOrder,
    ChannelSeries, DisplayGroup, StatsSeries,
};
pub use view::{StatsView, TrendEngine, TrendView, ViewRequest};
pub use waveform::{stack_waveforms, Trace, TraceData, WaveformStack};
