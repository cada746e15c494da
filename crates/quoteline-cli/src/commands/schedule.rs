use quoteline_core::{snapshot_url, PipelineConfig, QuerySchedule, QuoteTime};
use serde::Serialize;

use crate::cli::ScheduleArgs;
use crate::error::CliError;

use super::{resolve_range, CommandOutput};

#[derive(Debug, Serialize)]
struct ScheduledInstant {
    at: QuoteTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScheduleResponseData {
    start: QuoteTime,
    end: QuoteTime,
    step_minutes: u32,
    count: usize,
    instants: Vec<ScheduledInstant>,
}

pub fn run(args: &ScheduleArgs, config: &PipelineConfig) -> Result<CommandOutput, CliError> {
    let (start, end) = resolve_range(&args.range, config)?;
    let calendar = config.build_calendar()?;
    let schedule = QuerySchedule::new(&calendar, start, end, config.step())?;
    schedule.coverage_check()?;

    let instants: Vec<ScheduledInstant> = schedule
        .collect_instants()?
        .into_iter()
        .map(|at| ScheduledInstant {
            at,
            url: args.urls.then(|| snapshot_url(&config.base_url, at)),
        })
        .collect();

    let mut warnings = Vec::new();
    if start > end {
        warnings.push(format!("start {start} is after end {end}; nothing scheduled"));
    }

    let data = serde_json::to_value(ScheduleResponseData {
        start,
        end,
        step_minutes: config.step_minutes,
        count: instants.len(),
        instants,
    })?;
    Ok(CommandOutput::ok("schedule", data).with_warnings(warnings))
}
