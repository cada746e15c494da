use quoteline_core::{HolidayLookup, PipelineConfig, QuoteTime, TradingWindow};
use serde::Serialize;
use time::Weekday;

use crate::cli::CalendarArgs;
use crate::error::CliError;

use super::CommandOutput;

#[derive(Debug, Serialize)]
struct DayResponseData {
    date: String,
    weekday: String,
    weekend: bool,
    holiday: bool,
    trading_day: bool,
    trading_windows: Vec<TradingWindow>,
}

#[derive(Debug, Serialize)]
struct YearResponseData {
    year: i32,
    count: usize,
    holidays: Vec<String>,
}

pub fn run(args: &CalendarArgs, config: &PipelineConfig) -> Result<CommandOutput, CliError> {
    let calendar = config.build_calendar()?;

    let data = match (&args.date, args.year) {
        (Some(raw), _) => {
            let day = QuoteTime::parse(raw)?.date();
            let holiday = calendar.holidays().is_holiday(day)?;
            serde_json::to_value(DayResponseData {
                date: day.to_string(),
                weekday: day.weekday().to_string(),
                weekend: matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday),
                holiday,
                trading_day: calendar.is_trading_day(day)?,
                trading_windows: calendar.windows().to_vec(),
            })?
        }
        (None, Some(year)) => {
            let holidays: Vec<String> = calendar
                .holidays()
                .holidays_for_year(year)?
                .iter()
                .map(ToString::to_string)
                .collect();
            serde_json::to_value(YearResponseData {
                year,
                count: holidays.len(),
                holidays,
            })?
        }
        // clap requires one of --date / --year.
        (None, None) => serde_json::Value::Null,
    };

    Ok(CommandOutput::ok("calendar", data))
}
