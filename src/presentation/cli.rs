// Command-line interface - subcommands and overrides for the layered config
use crate::infrastructure::archive::LogFormat;
use crate::infrastructure::config::{LoggerConfig, SourceKind};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Trisonica anemometer logger and log inspector", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log a live (or replayed) stream to CSV with periodic statistics checkpoints.
    Log(LogArgs),
    /// Detect, parse and summarize archived log files.
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Default)]
pub struct LogArgs {
    /// Config file; defaults to `config/logger.*` when present.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,
    /// Serial device or capture file.
    #[arg(long)]
    pub port: Option<String>,
    #[arg(long)]
    pub baud: Option<u32>,
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    /// Hide the raw line stream on the dashboard.
    #[arg(long)]
    pub hide_raw: bool,
    /// Do not write the statistics checkpoint log.
    #[arg(long)]
    pub no_stats: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Stdin,
    Replay,
    Serial,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Stdin => SourceKind::Stdin,
            SourceArg::Replay => SourceKind::Replay,
            SourceArg::Serial => SourceKind::Serial,
        }
    }
}

impl LogArgs {
    /// Flags win over file and environment values.
    pub fn apply(&self, config: &mut LoggerConfig) {
        if let Some(source) = self.source {
            config.source.kind = source.into();
        }
        if let Some(port) = &self.port {
            config.source.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.source.baud_rate = baud;
        }
        if let Some(log_dir) = &self.log_dir {
            config.output.log_dir = log_dir.clone();
        }
        if self.hide_raw {
            config.output.show_raw_data = false;
        }
        if self.no_stats {
            config.output.save_statistics = false;
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Skip detection and parse every file as this format.
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Tagged,
    Json,
}

impl From<FormatArg> for LogFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => LogFormat::Csv,
            FormatArg::Tagged => LogFormat::Tagged,
            FormatArg::Json => LogFormat::Json,
        }
    }
}
