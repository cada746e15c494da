use quoteline_core::{
    InstrumentOutcome, Pipeline, PipelineConfig, RunReport, RunRequest, RunStatus,
};

use crate::cli::RunArgs;
use crate::error::CliError;

use super::{resolve_range, CommandOutput, Problems};

pub async fn run(args: &RunArgs, mut config: PipelineConfig) -> Result<CommandOutput, CliError> {
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    config.validate()?;

    let (start, end) = resolve_range(&args.range, &config)?;
    let mut request = RunRequest::new(start, end);
    if !args.instruments.is_empty() {
        request = request.with_instruments(args.instruments.iter().cloned());
    }

    let pipeline = Pipeline::from_config(&config)?;
    let report = pipeline.run(&request).await?;

    let warnings = report_warnings(&report);
    let problems = report_problems(&report);
    let data = serde_json::to_value(&report)?;

    Ok(CommandOutput::ok("run", data)
        .with_warnings(warnings)
        .with_problems(problems))
}

/// Missing instruments and failed charts count; instruments without sessions do not.
fn report_problems(report: &RunReport) -> Problems {
    Problems {
        fetch_failures: report.fetch_failures.len(),
        instrument_problems: report
            .outcomes
            .iter()
            .filter(|outcome| {
                matches!(
                    outcome,
                    InstrumentOutcome::Missing { .. } | InstrumentOutcome::RenderFailed { .. }
                )
            })
            .count(),
    }
}

fn report_warnings(report: &RunReport) -> Vec<String> {
    let mut warnings = Vec::new();
    if report.status == RunStatus::NothingToDo {
        warnings.push(String::from("no data collected; nothing was rendered"));
    }
    if !report.fetch_failures.is_empty() {
        warnings.push(format!(
            "{} of {} snapshots were unavailable",
            report.fetch_failures.len(),
            report.instants_scheduled
        ));
    }
    if report.rows_dropped > 0 {
        warnings.push(format!("{} malformed rows were dropped", report.rows_dropped));
    }
    for outcome in &report.outcomes {
        match outcome {
            InstrumentOutcome::Missing { id } => {
                warnings.push(format!("instrument '{id}' not found in collected data"));
            }
            InstrumentOutcome::RenderFailed { id, error } => {
                warnings.push(format!("chart for '{id}' failed: {error}"));
            }
            InstrumentOutcome::Rendered { .. } | InstrumentOutcome::NoSessions { .. } => {}
        }
    }
    warnings
}
