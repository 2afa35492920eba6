// tests/property_tests.rs
//! Property checks for reductions, ordering and aggregation

use nervioviz_core::processing::reduction::{l1_norm, peak_to_peak, rms};
use nervioviz_core::processing::{
    compute_metric, resolve_channel_order, summarize_across_channels, ChannelOrder, Metric, MetricRow, MetricTable,
};
use nervioviz_core::signal::{SignalRow, SignalTable, Timestamp};
use proptest::prelude::*;
use std::collections::HashSet;

fn samples() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e3..1.0e3f64, 0..64)
}

fn channel_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-E]", 0..12)
}

proptest! {
    #[test]
    fn l1_ignores_order(v in samples()) {
        let mut reversed = v.clone();
        reversed.reverse();
        let (a, b) = (l1_norm(&v), l1_norm(&reversed));
        prop_assert!((a - b).abs() <= 1e-9 * a.max(1.0));
    }

    #[test]
    fn p2p_is_range(v in prop::collection::vec(-1.0e3..1.0e3f64, 1..64)) {
        let hi = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = v.iter().copied().fold(f64::INFINITY, f64::min);
        prop_assert_eq!(peak_to_peak(&v), hi - lo);
        prop_assert!(peak_to_peak(&v) >= 0.0);
    }

    #[test]
    fn rms_zero_only_for_silence(v in prop::collection::vec(-50i32..50, 1..64)) {
        let v: Vec<f64> = v.into_iter().map(f64::from).collect();
        let value = rms(&v);
        prop_assert!(value >= 0.0);
        prop_assert_eq!(value == 0.0, v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn metric_tables_are_idempotent(values in prop::collection::vec(samples(), 0..8)) {
        let rows = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| SignalRow::new("S1", i as f64, "A", v, 1000.0))
            .collect();
        let table = SignalTable::new(rows).unwrap();
        for metric in Metric::ALL {
            prop_assert_eq!(compute_metric(Some(&table), metric), compute_metric(Some(&table), metric));
        }
    }

    #[test]
    fn resolved_order_is_permutation(data in channel_names(), order in channel_names()) {
        let resolved = resolve_channel_order(data.iter().map(String::as_str), &ChannelOrder::new(order));

        let present: HashSet<&str> = data.iter().map(String::as_str).collect();
        let resolved_set: HashSet<&str> = resolved.iter().map(String::as_str).collect();
        prop_assert_eq!(resolved.len(), resolved_set.len());
        prop_assert_eq!(resolved_set, present);
    }

    #[test]
    fn summary_mean_within_bounds(values in prop::collection::vec(-1.0e6..1.0e6f64, 1..16)) {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, &value)| MetricRow::new(Timestamp(0.0), format!("ch{}", i), value))
            .collect();
        let summary = summarize_across_channels(&MetricTable { metric: Metric::Mean, rows });
        prop_assert_eq!(summary.len(), 1);
        prop_assert!(summary.min[0] <= summary.mean[0]);
        prop_assert!(summary.mean[0] <= summary.max[0]);
    }

    #[test]
    fn summary_is_bit_reproducible(values in prop::collection::vec((0u8..4, -1.0e6..1.0e6f64), 0..32)) {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, &(ts, value))| MetricRow::new(f64::from(ts), format!("ch{}", i % 5), value))
            .collect();
        let table = MetricTable { metric: Metric::L1, rows };

        let (first, second) = (summarize_across_channels(&table), summarize_across_channels(&table));
        prop_assert_eq!(&first.timestamps, &second.timestamps);
        for (a, b) in [(&first.min, &second.min), (&first.max, &second.max), (&first.mean, &second.mean)] {
            let bits = |v: &Vec<f64>| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
            prop_assert_eq!(bits(a), bits(b));
        }
    }
}

#[test]
fn every_metric_is_zero_on_empty_input() {
    for metric in Metric::ALL {
        assert_eq!(metric.reduce(&[]), 0.0);
    }
}
