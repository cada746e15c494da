//! Pipeline configuration.
//!
//! A single [`PipelineConfig`] value carries every tunable. It is read from a
//! JSON file where every key is optional; omitted keys take the defaults below.
//!
//! ```json
//! {
//!   "base_url": "http://150.158.125.175:8080/QH20D/",
//!   "step_minutes": 5,
//!   "trading_windows": ["09:00-11:30", "13:30-15:00", "21:00-23:30"],
//!   "output_dir": "plots",
//!   "holidays": { "2027": ["2027-01-01"] }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::macros::{datetime, format_description};
use time::{Date, Duration};

use crate::fetcher::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT};
use crate::{
    validate_windows, ConfigError, HolidayTable, QuoteTime, RowNormalizer, RowSchema,
    TradingCalendar, TradingWindow, ValidationError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub step_minutes: u32,
    pub trading_windows: Vec<TradingWindow>,
    pub schema: RowSchema,
    pub output_dir: PathBuf,
    pub default_start: QuoteTime,
    pub default_end: QuoteTime,
    pub session_gap_minutes: u32,
    /// Extra holidays by year, added on top of the built-in table.
    /// Listing a year (even with no dates) marks it as covered.
    pub holidays: BTreeMap<i32, Vec<String>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            step_minutes: 5,
            trading_windows: TradingWindow::defaults(),
            schema: RowSchema::default(),
            output_dir: PathBuf::from("plots"),
            default_start: QuoteTime::new(datetime!(2024-08-27 9:00)),
            default_end: QuoteTime::new(datetime!(2024-08-27 23:00)),
            session_gap_minutes: 60,
            holidays: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::EmptyBaseUrl);
        }
        if self.step_minutes == 0 {
            return Err(ValidationError::InvalidStep { seconds: 0 });
        }
        if self.session_gap_minutes == 0 {
            return Err(ValidationError::InvalidSessionGap);
        }
        validate_windows(&self.trading_windows)?;
        self.schema.validate()?;
        self.extra_holidays()?;
        Ok(())
    }

    pub fn step(&self) -> Duration {
        Duration::minutes(i64::from(self.step_minutes))
    }

    pub fn session_gap(&self) -> Duration {
        Duration::minutes(i64::from(self.session_gap_minutes))
    }

    /// Built-in mainland table extended with the configured years.
    pub fn holiday_table(&self) -> Result<HolidayTable, ValidationError> {
        self.extra_holidays()?
            .into_iter()
            .try_fold(HolidayTable::china(), |table, (year, dates)| {
                table.with_year(year, dates)
            })
    }

    pub fn build_calendar(&self) -> Result<TradingCalendar, ValidationError> {
        TradingCalendar::new(
            self.trading_windows.clone(),
            Arc::new(self.holiday_table()?),
        )
    }

    pub fn normalizer(&self) -> Result<RowNormalizer, ValidationError> {
        RowNormalizer::new(self.schema)
    }

    fn extra_holidays(&self) -> Result<Vec<(i32, Vec<Date>)>, ValidationError> {
        let mut years = Vec::with_capacity(self.holidays.len());
        for (year, raw_dates) in &self.holidays {
            let dates = raw_dates
                .iter()
                .map(|raw| parse_holiday(*year, raw))
                .collect::<Result<Vec<_>, _>>()?;
            years.push((*year, dates));
        }
        Ok(years)
    }
}

fn parse_holiday(year: i32, raw: &str) -> Result<Date, ValidationError> {
    let day = Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).map_err(
        |_| ValidationError::InvalidHolidayDate {
            value: raw.to_owned(),
        },
    )?;
    if day.year() != year {
        return Err(ValidationError::HolidayYearMismatch {
            year,
            date: raw.to_owned(),
        });
    }
    Ok(day)
}
