//! CLI argument definitions for the `airq` loader.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "airq",
    version,
    about = "Air-quality sensor loader - stream delimited readings into a store",
    long_about = "Stream a delimited air-quality sensor file into a newline-delimited\n\
                  JSON store in fixed-size batches.\n\n\
                  Headers are normalized, decimal commas and missing-reading sentinels\n\
                  are coerced, and date and time columns are merged into one timestamp."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Prefix pretty and compact log lines with a timestamp.
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,

    /// Log when each span closes, with its busy and idle time.
    #[arg(long = "log-spans", global = true)]
    pub log_spans: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a sensor file into the store in batches.
    Load(LoadArgs),

    /// Show how a sensor file's headers and first rows are decoded.
    Inspect(InspectArgs),
}

/// Input file and decoding flags shared by every command.
///
/// Flags left unset fall back to the `--config` file, then to the defaults.
#[derive(Args)]
pub struct SourceArgs {
    /// Delimited sensor file to read.
    #[arg(value_name = "CSV", env = "CSV_FILE_PATH")]
    pub input: PathBuf,

    /// JSON file with ingest options.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Field delimiter (default: ';').
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Literal that marks a missing reading (default: -200).
    #[arg(long = "sentinel", value_name = "VALUE", allow_hyphen_values = true)]
    pub sentinel: Option<String>,

    /// Normalized header of the date column (default: date).
    #[arg(long = "date-column", value_name = "NAME")]
    pub date_column: Option<String>,

    /// Normalized header of the time column (default: time).
    #[arg(long = "time-column", value_name = "NAME")]
    pub time_column: Option<String>,

    /// Field name of the merged timestamp (default: timestamp).
    #[arg(long = "timestamp-column", value_name = "NAME")]
    pub timestamp_column: Option<String>,

    /// chrono format of the date column (default: %d/%m/%Y).
    #[arg(long = "date-format", value_name = "FORMAT")]
    pub date_format: Option<String>,

    /// Treat double quotes as ordinary characters.
    #[arg(long = "no-quoting")]
    pub no_quoting: bool,
}

#[derive(Parser)]
pub struct LoadArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Newline-delimited JSON store to write to.
    ///
    /// A store that already holds data is left untouched unless `--append`
    /// or `--truncate` is given.
    #[arg(long = "store", value_name = "PATH", default_value = "readings.jsonl")]
    pub store: PathBuf,

    /// Records per batch (default: 500).
    #[arg(long = "batch-size", value_name = "N")]
    pub batch_size: Option<usize>,

    /// Decode and batch without writing the store.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Add to a store that already holds data.
    #[arg(long = "append", conflicts_with = "truncate")]
    pub append: bool,

    /// Replace the store's existing contents.
    #[arg(long = "truncate")]
    pub truncate: bool,
}

#[derive(Parser)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of decoded records to show.
    #[arg(long = "limit", value_name = "N", default_value_t = 10)]
    pub limit: usize,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
