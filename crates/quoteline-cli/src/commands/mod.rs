mod calendar;
mod run;
mod schedule;

use quoteline_core::{PipelineConfig, QuoteTime};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command, RangeArgs};
use crate::error::CliError;

/// Counts that `--strict` turns into a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Problems {
    pub fetch_failures: usize,
    pub instrument_problems: usize,
}

impl Problems {
    pub const fn is_clean(self) -> bool {
        self.fetch_failures == 0 && self.instrument_problems == 0
    }

    /// `Ok` unless `--strict` is set and something went wrong.
    pub fn enforce(self, strict: bool) -> Result<(), CliError> {
        if strict && !self.is_clean() {
            return Err(CliError::StrictModeViolation {
                fetch_failures: self.fetch_failures,
                instrument_problems: self.instrument_problems,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CommandOutput {
    pub command: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub data: Value,
    #[serde(skip)]
    pub problems: Problems,
}

impl CommandOutput {
    pub fn ok(command: &'static str, data: Value) -> Self {
        Self {
            command,
            warnings: Vec::new(),
            data,
            problems: Problems::default(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_problems(mut self, problems: Problems) -> Self {
        self.problems = problems;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    let config = load_config(cli)?;

    match &cli.command {
        Command::Run(args) => run::run(args, config).await,
        Command::Schedule(args) => schedule::run(args, &config),
        Command::Calendar(args) => calendar::run(args, &config),
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig, CliError> {
    match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            Ok(PipelineConfig::from_path(path)?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Command-line range, falling back to the configured defaults.
fn resolve_range(
    args: &RangeArgs,
    config: &PipelineConfig,
) -> Result<(QuoteTime, QuoteTime), CliError> {
    let start = match &args.start {
        Some(raw) => QuoteTime::parse(raw)?,
        None => config.default_start,
    };
    let end = match &args.end {
        Some(raw) => QuoteTime::parse(raw)?,
        None => config.default_end,
    };
    Ok((start, end))
}
