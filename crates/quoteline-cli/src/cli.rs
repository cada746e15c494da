//! CLI argument definitions for quoteline.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Fetch snapshots, build the quote table, and write session charts |
//! | `schedule` | List the query instants a run would fetch |
//! | `calendar` | Inspect trading days and holidays |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | none | JSON config file; built-in defaults otherwise |
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Fail when a run records fetch or render problems |
//! | `-v` | warn | Raise log verbosity (`-v` info, `-vv` debug); `RUST_LOG` wins |
//!
//! # Examples
//!
//! ```bash
//! # Default range from the config
//! quoteline run
//!
//! # One afternoon, two instruments, charts under ./charts
//! quoteline run --start "2024-08-27 13:30" --end "2024-08-27 15:00" \
//!     --instrument rb2410 --instrument hc2410 --output-dir charts
//!
//! # What would be fetched
//! quoteline schedule --start "2024-08-27 09:00" --end "2024-08-27 12:00" --format table
//!
//! # Is a date tradable?
//! quoteline calendar --date 2024-10-01
//! ```

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

/// Trading-session chart builder for timestamped quote snapshots.
#[derive(Debug, Parser)]
#[command(
    name = "quoteline",
    author,
    version,
    about = "Fetch timestamped quote snapshots and chart them per trading session"
)]
pub struct Cli {
    /// JSON configuration file. Missing keys take built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat fetch failures, missing instruments and render failures as errors (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Increase log verbosity. Logs go to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch snapshots over a time range and write one chart per instrument.
    ///
    /// # Examples
    ///
    ///   quoteline run
    ///   quoteline run --start "2024-08-27 21:00" --end "2024-08-27 23:30"
    ///   quoteline run --instrument rb2410 --output-dir charts
    Run(RunArgs),

    /// List the trading instants that a run over the range would query.
    Schedule(ScheduleArgs),

    /// Check whether a date trades, or list a year's holidays.
    Calendar(CalendarArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Only chart these instrument ids. Repeatable; defaults to every id seen.
    #[arg(long = "instrument", value_name = "ID")]
    pub instruments: Vec<String>,

    /// Directory for chart files (overrides `output_dir`).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Snapshot endpoint prefix (overrides `base_url`).
    #[arg(long)]
    pub base_url: Option<String>,
}

/// Arguments for the `schedule` command.
#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Include the snapshot URL for every instant.
    #[arg(long, default_value_t = false)]
    pub urls: bool,
}

/// Inclusive time range shared by `run` and `schedule`.
#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Range start, e.g. "2024-08-27 09:00". Defaults to `default_start`.
    #[arg(long)]
    pub start: Option<String>,

    /// Range end, inclusive. Defaults to `default_end`.
    #[arg(long)]
    pub end: Option<String>,
}

/// Arguments for the `calendar` command.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["date", "year"])))]
pub struct CalendarArgs {
    /// Calendar date to check (YYYY-MM-DD).
    #[arg(long)]
    pub date: Option<String>,

    /// Year whose holidays to list.
    #[arg(long)]
    pub year: Option<i32>,
}
