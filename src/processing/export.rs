//! CSV export of visible series
//!
//! Curves are written one after another as `label,x,y` rows, the way the
//! plot context menu copies "visible data" to the clipboard. Labels holding
//! the delimiter, a quote or a line break are quoted.

use super::aggregation::{CrossChannelSummary, GlobalStats};
use super::trend::{ChannelSeries, StatsSeries};
use super::waveform::WaveformStack;
use crate::config::ExportSettings;
use crate::error::{ExportFormat, NervioErrorBuilder, NervioResult};
use crate::signal::SurgeryCatalog;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::io::Write;

/// Formats (x, y) pairs according to [`ExportSettings`]
#[derive(Debug, Clone)]
pub struct CsvExporter {
    settings: ExportSettings,
}

impl CsvExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    /// Same settings without the header row, for sections appended to an
    /// already started CSV
    pub fn continuation(&self) -> Self {
        Self::new(ExportSettings {
            include_header: false,
            ..self.settings.clone()
        })
    }

    fn number(&self, value: f64) -> String {
        match self.settings.float_precision {
            Some(precision) => format!("{:.*}", precision, value),
            None => value.to_string(),
        }
    }

    fn field<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let needs_quotes = text
            .chars()
            .any(|c| c == self.settings.delimiter || c == '"' || c == '\n' || c == '\r');
        if needs_quotes {
            Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
        } else {
            Cow::Borrowed(text)
        }
    }

    fn push_header(&self, out: &mut String, columns: [&str; 3]) {
        if self.settings.include_header {
            out.push_str(&columns.join(&self.settings.delimiter.to_string()));
            out.push('\n');
        }
    }

    // An absent x leaves the middle column empty.
    fn push_row(&self, out: &mut String, label: &str, x: Option<f64>, y: f64) {
        let delimiter = self.settings.delimiter;
        let x = x.map(|x| self.number(x)).unwrap_or_default();
        let _ = writeln!(out, "{}{}{}{}{}", self.field(label), delimiter, x, delimiter, self.number(y));
    }

    /// Every channel curve, concatenated
    pub fn channel_series(&self, series: &[ChannelSeries]) -> String {
        let mut out = String::new();
        self.push_header(&mut out, ["channel", "timestamp", "value"]);
        for s in series {
            for (x, &y) in s.timestamps.iter().zip(&s.values) {
                self.push_row(&mut out, &s.title, Some(x.value()), y);
            }
        }
        out
    }

    /// Mean, median and max curves of every channel
    pub fn stats_series(&self, series: &[StatsSeries]) -> String {
        let mut out = String::new();
        self.push_header(&mut out, ["curve", "timestamp", "value"]);
        for s in series {
            for (name, values) in [("mean", &s.mean), ("median", &s.median), ("max", &s.max)] {
                let label = format!("{}/{}", s.title, name);
                for (x, &y) in s.timestamps.iter().zip(values) {
                    self.push_row(&mut out, &label, Some(x.value()), y);
                }
            }
        }
        out
    }

    /// Global min/max/mean labels of the stats view, one row each with no x
    pub fn global_stats(&self, global: &GlobalStats) -> String {
        let mut out = String::new();
        self.push_header(&mut out, ["curve", "timestamp", "value"]);
        for (name, value) in [("global/min", global.min), ("global/max", global.max), ("global/mean", global.mean)] {
            self.push_row(&mut out, name, None, value);
        }
        out
    }

    /// Min, max and average curves of the overview plot
    pub fn summary(&self, summary: &CrossChannelSummary) -> String {
        let mut out = String::new();
        self.push_header(&mut out, ["curve", "timestamp", "value"]);
        for (name, values) in [("min", &summary.min), ("max", &summary.max), ("avg", &summary.mean)] {
            for (x, &y) in summary.timestamps.iter().zip(values) {
                self.push_row(&mut out, name, Some(x.value()), y);
            }
        }
        out
    }

    /// Signal and baseline curves of every stacked trace, x in milliseconds
    pub fn waveforms(&self, stack: &WaveformStack) -> String {
        let mut out = String::new();
        self.push_header(&mut out, ["curve", "time_ms", "amplitude"]);
        for trace in &stack.traces {
            for (name, data) in [("signal", &trace.signal), ("baseline", &trace.baseline)] {
                let label = format!("{}/{}", trace.label, name);
                for (&x, &y) in data.time_ms.iter().zip(&data.amplitude) {
                    self.push_row(&mut out, &label, Some(x), y);
                }
            }
        }
        out
    }

    /// Surgery listing: id, date and protocol per row
    pub fn surgeries(&self, catalog: &SurgeryCatalog) -> String {
        let mut out = String::new();
        self.push_header(&mut out, ["surgery_id", "date", "protocol"]);
        let delimiter = self.settings.delimiter;
        for meta in catalog.iter() {
            let _ = writeln!(
                out,
                "{}{}{}{}{}",
                self.field(meta.surgery_id.as_str()),
                delimiter,
                self.field(meta.date.as_deref().unwrap_or("")),
                delimiter,
                self.field(meta.protocol.as_deref().unwrap_or(""))
            );
        }
        out
    }

    /// Write already formatted CSV text to `writer`
    pub fn write_csv<W: Write>(&self, mut writer: W, csv: &str) -> NervioResult<()> {
        writer
            .write_all(csv.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| NervioErrorBuilder::new("export", "write_csv").export(ExportFormat::Csv, &e.to_string()))
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new(ExportSettings::default())
    }
}
