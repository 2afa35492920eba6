//! Stacked waveform layout for a single recording instant
//!
//! Each channel's trace and its baseline are shifted vertically by a multiple
//! of a common step so traces never overlap. Sample indices are converted to
//! elapsed milliseconds with the row's sampling rate.

use crate::error::{NervioErrorBuilder, NervioResult, ProcessingStage};
use crate::signal::{Region, SignalRow, SignalTable};
use crate::utils::conversion::{elapsed_axis_ms, max_abs};
use serde::Serialize;

/// Sampled curve in display coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceData {
    pub time_ms: Vec<f64>,
    pub amplitude: Vec<f64>,
}

impl TraceData {
    fn shifted(values: &[f64], rate_hz: f64, offset: f64) -> NervioResult<Self> {
        let time_ms = elapsed_axis_ms(values.len(), rate_hz).map_err(|e| {
            NervioErrorBuilder::new("waveform", "stack_waveforms")
                .processing(ProcessingStage::WaveformLayout, &e.to_string())
        })?;
        Ok(Self {
            time_ms,
            amplitude: values.iter().map(|v| v + offset).collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.amplitude.is_empty()
    }
}

/// One channel's waveform and baseline at a stack slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub channel: String,
    pub region: Option<Region>,
    pub label: String,
    pub offset: f64,
    pub signal: TraceData,
    pub baseline: TraceData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WaveformStack {
    pub offset_step: f64,
    pub traces: Vec<Trace>,
}

// Stack slots: plain channel order, or upper channels then lower channels
// when the snapshot carries region tags.
fn slots(snapshot: &SignalTable, ordered_channels: &[String]) -> Vec<(String, Option<Region>)> {
    let tagged = snapshot.iter().any(|row| row.region.is_some());
    if !tagged {
        return ordered_channels.iter().map(|ch| (ch.clone(), None)).collect();
    }

    [Region::Upper, Region::Lower]
        .into_iter()
        .flat_map(|region| {
            let present = snapshot.channels_in_region(region);
            ordered_channels
                .iter()
                .filter(move |ch| present.contains(ch))
                .map(move |ch| (ch.clone(), Some(region)))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn fallback_baseline<'a>(row: &SignalRow, source: Option<&'a SignalTable>) -> Option<&'a SignalRow> {
    SignalTable::rows_of(source)
        .iter()
        .find(|other| other.surgery_id == row.surgery_id && other.channel == row.channel)
}

/// Lay out the traces of `snapshot` in `ordered_channels` order.
///
/// Rows with an empty baseline borrow the baseline of the first row in
/// `baseline_source` with the same surgery and channel.
pub fn stack_waveforms(
    snapshot: &SignalTable,
    ordered_channels: &[String],
    baseline_source: Option<&SignalTable>,
    offset_factor: f64,
) -> NervioResult<WaveformStack> {
    if snapshot.is_empty() {
        return Ok(WaveformStack::default());
    }

    let peak = snapshot
        .iter()
        .map(|row| max_abs(&row.values).max(max_abs(&row.baseline_values)))
        .fold(0.0, f64::max);
    let unit = if peak > 0.0 { peak } else { 1.0 };
    let offset_step = unit * offset_factor;

    let mut traces = Vec::new();
    for (slot, (channel, region)) in slots(snapshot, ordered_channels).into_iter().enumerate() {
        let Some(row) = snapshot
            .iter()
            .find(|row| row.channel == channel && row.region == region)
        else {
            continue;
        };

        let offset = slot as f64 * offset_step;
        let (baseline_values, baseline_rate) = if row.baseline_values.is_empty() {
            match fallback_baseline(row, baseline_source) {
                Some(other) => (other.baseline_values.as_slice(), other.effective_baseline_rate()),
                None => (&[][..], row.effective_baseline_rate()),
            }
        } else {
            (row.baseline_values.as_slice(), row.effective_baseline_rate())
        };

        traces.push(Trace {
            label: format!("{} ({}Hz)", channel, row.signal_rate),
            signal: TraceData::shifted(&row.values, row.signal_rate, offset)?,
            baseline: TraceData::shifted(baseline_values, baseline_rate, offset)?,
            channel,
            region,
            offset,
        });
    }

    tracing::debug!(traces = traces.len(), offset_step, "stacked waveforms");
    Ok(WaveformStack { offset_step, traces })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_follow_channel_slots() {
        let snapshot = SignalTable::new(vec![
            SignalRow::new("S1", 0, "A", vec![1.0, -2.0], 1000.0).with_baseline(vec![0.5], None),
            SignalRow::new("S1", 0, "C", vec![0.0, 1.0], 1000.0),
        ])
        .unwrap();
        let order = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let stack = stack_waveforms(&snapshot, &order, None, 1.2).unwrap();
        assert!((stack.offset_step - 2.4).abs() < 1e-12);
        assert_eq!(stack.traces.len(), 2);
        assert_eq!(stack.traces[0].offset, 0.0);
        // "B" has no row but still holds its slot
        assert!((stack.traces[1].offset - 4.8).abs() < 1e-12);
        assert_eq!(stack.traces[0].signal.time_ms, vec![0.0, 1.0]);
        assert_eq!(stack.traces[0].label, "A (1000Hz)");
    }

    #[test]
    fn test_flat_snapshot_uses_unit_peak() {
        let snapshot = SignalTable::new(vec![SignalRow::new("S1", 0, "A", vec![0.0, 0.0], 500.0)]).unwrap();
        let stack = stack_waveforms(&snapshot, &["A".to_string()], None, 1.2).unwrap();
        assert!((stack.offset_step - 1.2).abs() < 1e-12);
        assert_eq!(stack.traces[0].signal.time_ms, vec![0.0, 2.0]);
    }

    #[test]
    fn test_regions_stack_upper_then_lower() {
        let snapshot = SignalTable::new(vec![
            SignalRow::new("S1", 0, "P37", vec![1.0], 1000.0).with_region(Region::Lower),
            SignalRow::new("S1", 0, "N20", vec![1.0], 1000.0).with_region(Region::Upper),
        ])
        .unwrap();
        let order = vec!["P37".to_string(), "N20".to_string()];

        let stack = stack_waveforms(&snapshot, &order, None, 1.0).unwrap();
        let channels: Vec<_> = stack.traces.iter().map(|t| t.channel.as_str()).collect();
        assert_eq!(channels, vec!["N20", "P37"]);
    }

    #[test]
    fn test_empty_baseline_falls_back_to_source() {
        let snapshot = SignalTable::new(vec![SignalRow::new("S1", 3, "APB", vec![1.0], 1000.0)]).unwrap();
        let source = SignalTable::new(vec![
            SignalRow::new("S1", 0, "APB", vec![], 1000.0).with_baseline(vec![0.1, 0.2, 0.3], Some(2000.0)),
        ])
        .unwrap();

        let stack = stack_waveforms(&snapshot, &["APB".to_string()], Some(&source), 1.2).unwrap();
        let baseline = &stack.traces[0].baseline;
        assert_eq!(baseline.amplitude.len(), 3);
        assert_eq!(baseline.time_ms, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_invalid_rate_is_processing_error() {
        let snapshot = SignalTable::new(vec![SignalRow::new("S1", 0, "A", vec![1.0], 0.0)]).unwrap();
        assert!(stack_waveforms(&snapshot, &["A".to_string()], None, 1.2).is_err());
    }
}
