//! Trading calendar: weekday and holiday exclusion plus intraday windows.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use std::sync::Arc;

use time::macros::date;
use time::{Date, Duration, Weekday};

use crate::{
    validate_windows, within_windows, CalendarError, QuoteTime, TimeOfDay, TradingWindow,
    ValidationError,
};

/// Source of non-trading calendar dates, queried one year at a time.
pub trait HolidayLookup: Send + Sync + std::fmt::Debug {
    /// Holidays for `year`, or an error when the source has no data for it.
    fn holidays_for_year(&self, year: i32) -> Result<&BTreeSet<Date>, CalendarError>;

    fn is_holiday(&self, day: Date) -> Result<bool, CalendarError> {
        Ok(self.holidays_for_year(day.year())?.contains(&day))
    }
}

// (first day, length in days) of each mainland public holiday block.
const CHINA_HOLIDAY_BLOCKS: &[(Date, i64)] = &[
    (date!(2023 - 01 - 01), 2),
    (date!(2023 - 01 - 21), 7),
    (date!(2023 - 04 - 05), 1),
    (date!(2023 - 04 - 29), 5),
    (date!(2023 - 06 - 22), 3),
    (date!(2023 - 09 - 29), 8),
    (date!(2024 - 01 - 01), 1),
    (date!(2024 - 02 - 10), 8),
    (date!(2024 - 04 - 04), 3),
    (date!(2024 - 05 - 01), 5),
    (date!(2024 - 06 - 10), 1),
    (date!(2024 - 09 - 15), 3),
    (date!(2024 - 10 - 01), 7),
    (date!(2025 - 01 - 01), 1),
    (date!(2025 - 01 - 28), 8),
    (date!(2025 - 04 - 04), 3),
    (date!(2025 - 05 - 01), 5),
    (date!(2025 - 05 - 31), 3),
    (date!(2025 - 10 - 01), 8),
    (date!(2026 - 01 - 01), 3),
    (date!(2026 - 02 - 15), 9),
    (date!(2026 - 04 - 04), 3),
    (date!(2026 - 05 - 01), 5),
    (date!(2026 - 06 - 19), 3),
    (date!(2026 - 09 - 25), 3),
    (date!(2026 - 10 - 01), 7),
];

const CHINA_COVERED_YEARS: RangeInclusive<i32> = 2023..=2026;

/// In-memory holiday table keyed by year. Years absent from the table are
/// reported as [`CalendarError::YearNotCovered`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayTable {
    years: BTreeMap<i32, BTreeSet<Date>>,
}

impl HolidayTable {
    /// A table that covers no year at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Mainland China public holidays, 2023 through 2026.
    pub fn china() -> Self {
        let mut years: BTreeMap<i32, BTreeSet<Date>> = CHINA_COVERED_YEARS
            .map(|year| (year, BTreeSet::new()))
            .collect();
        for (first, length) in CHINA_HOLIDAY_BLOCKS {
            for offset in 0..*length {
                let day = *first + Duration::days(offset);
                years.entry(day.year()).or_default().insert(day);
            }
        }
        Self { years }
    }

    /// Mark `year` as covered and add `dates` to its holiday set.
    pub fn with_year(
        mut self,
        year: i32,
        dates: impl IntoIterator<Item = Date>,
    ) -> Result<Self, ValidationError> {
        let entry = self.years.entry(year).or_default();
        for day in dates {
            if day.year() != year {
                return Err(ValidationError::HolidayYearMismatch {
                    year,
                    date: day.to_string(),
                });
            }
            entry.insert(day);
        }
        Ok(self)
    }

    pub fn covered_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }
}

impl HolidayLookup for HolidayTable {
    fn holidays_for_year(&self, year: i32) -> Result<&BTreeSet<Date>, CalendarError> {
        self.years
            .get(&year)
            .ok_or(CalendarError::YearNotCovered { year })
    }
}

/// Combines weekend/holiday exclusion with intraday trading windows.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    windows: Vec<TradingWindow>,
    holidays: Arc<dyn HolidayLookup>,
}

impl TradingCalendar {
    pub fn new(
        windows: Vec<TradingWindow>,
        holidays: Arc<dyn HolidayLookup>,
    ) -> Result<Self, ValidationError> {
        validate_windows(&windows)?;
        Ok(Self { windows, holidays })
    }

    /// Default futures sessions on the mainland holiday calendar.
    pub fn china_futures() -> Self {
        Self {
            windows: TradingWindow::defaults(),
            holidays: Arc::new(HolidayTable::china()),
        }
    }

    pub fn windows(&self) -> &[TradingWindow] {
        &self.windows
    }

    pub fn holidays(&self) -> &Arc<dyn HolidayLookup> {
        &self.holidays
    }

    /// Weekdays that are not holidays.
    pub fn is_trading_day(&self, day: Date) -> Result<bool, CalendarError> {
        let holiday = self.holidays.is_holiday(day)?;
        Ok(!holiday && !matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday))
    }

    /// Time-of-day test only; ignores the calendar date.
    pub fn in_trading_hours(&self, value: TimeOfDay) -> bool {
        within_windows(&self.windows, value)
    }

    pub fn is_trading_instant(&self, at: QuoteTime) -> Result<bool, CalendarError> {
        Ok(self.is_trading_day(at.date())? && self.in_trading_hours(at.time_of_day()))
    }

    /// Fail fast when the holiday source cannot answer for any year in `years`.
    pub fn ensure_covers(&self, years: RangeInclusive<i32>) -> Result<(), CalendarError> {
        for year in years {
            self.holidays.holidays_for_year(year)?;
        }
        Ok(())
    }
}
