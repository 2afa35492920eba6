//! Command-line reports over a recording file.
//!
//! Usage:
//!     nervioviz-report recording.json surgeries
//!     nervioviz-report recording.json trend --surgery 17 --metric p2p --order "L APB,R APB"
//!     nervioviz-report recording.json stats --modality ssep --surgery 17
//!     nervioviz-report recording.json waveforms --surgery 17 --at 120

use clap::{Args, Parser, Subcommand};
use nervioviz_core::config::{ConfigLoader, ViewerConfig};
use nervioviz_core::logging::{init_logging, LogLevel};
use nervioviz_core::processing::{ChannelOrder, CsvExporter, Metric, Modality, TrendEngine, ViewRequest};
use nervioviz_core::{load_recording, NervioResult, Timestamp};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "nervioviz-report")]
#[command(about = "Trend and statistics reports for neuromonitoring recordings")]
struct Cli {
    /// Recording file (JSON)
    recording: PathBuf,

    /// Configuration file; replaces the standard search paths
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List surgeries with date and protocol
    Surgeries,
    /// Per-channel metric series and cross-channel summary as CSV
    Trend(ViewArgs),
    /// Per-channel mean/median/max series and global labels as CSV
    Stats(ViewArgs),
    /// Stacked waveforms at one timestamp as CSV
    Waveforms {
        #[command(flatten)]
        view: ViewArgs,

        /// Timestamp of the snapshot
        #[arg(long)]
        at: f64,
    },
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// mep, ssep_upper, ssep_lower or ssep
    #[arg(long)]
    modality: Option<Modality>,

    #[arg(long)]
    surgery: Option<String>,

    /// Keep rows up to and including this timestamp
    #[arg(long)]
    until: Option<f64>,

    #[arg(long, requires = "to")]
    from: Option<f64>,

    #[arg(long, requires = "from")]
    to: Option<f64>,

    /// l1, p2p, rms, mean, median or max
    #[arg(long)]
    metric: Option<Metric>,

    /// Display order, comma separated
    #[arg(long, value_delimiter = ',')]
    order: Vec<String>,

    /// Visible channels, comma separated
    #[arg(long, value_delimiter = ',')]
    channels: Option<Vec<String>>,
}

impl ViewArgs {
    fn request(&self) -> ViewRequest {
        let mut request = ViewRequest::new().channel_order(ChannelOrder::new(self.order.iter().cloned()));
        if let Some(modality) = self.modality {
            request = request.modality(modality);
        }
        if let Some(surgery) = &self.surgery {
            request = request.surgery(surgery.as_str());
        }
        if let Some(until) = self.until {
            request = request.until(until);
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            request = request.interval(from, to);
        }
        if let Some(metric) = self.metric {
            request = request.metric(metric);
        }
        if let Some(channels) = &self.channels {
            request = request.visible_channels(channels.iter().cloned());
        }
        request
    }
}

fn load_config(cli: &Cli) -> NervioResult<ViewerConfig> {
    let mut loader = match &cli.config {
        Some(path) => ConfigLoader::with_paths(vec![path.clone()]),
        None => ConfigLoader::new(),
    };
    Ok(loader.load_viewer_config()?)
}

fn run(cli: Cli) -> NervioResult<()> {
    let mut config = load_config(&cli)?;
    if cli.verbose {
        config.logging.level = LogLevel::Debug;
    }
    init_logging(&config.logging);
    tracing::debug!(config = ?config.summary(), "configuration loaded");

    let recording = load_recording(&cli.recording)?;
    let engine = TrendEngine::new(config.analysis.clone());
    let exporter = CsvExporter::new(config.export.clone());

    let csv = match &cli.command {
        Command::Surgeries => exporter.surgeries(&recording.surgeries),
        Command::Trend(args) => {
            let view = engine.trend(&recording, &args.request());
            let mut csv = exporter.channel_series(&view.series);
            csv.push_str(&exporter.continuation().summary(&view.summary));
            csv
        }
        Command::Stats(args) => {
            let view = engine.stats(&recording, &args.request());
            let mut csv = exporter.stats_series(&view.series);
            if let Some(global) = &view.global {
                csv.push_str(&exporter.continuation().global_stats(global));
            }
            csv
        }
        Command::Waveforms { view, at } => {
            let stack = engine.waveforms(&recording, &view.request(), Timestamp::from(*at))?;
            exporter.waveforms(&stack)
        }
    };

    exporter.write_csv(std::io::stdout().lock(), &csv)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "report failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
