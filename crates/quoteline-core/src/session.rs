//! Splitting an instrument series into uninterrupted trading sessions.

use serde::Serialize;
use time::Duration;

use crate::{
    within_windows, InstrumentSeries, QuoteTime, SeriesRow, TradingCalendar, TradingWindow,
    ValidationError,
};

/// Largest gap between consecutive rows that still belongs to one session.
pub const DEFAULT_SESSION_GAP: Duration = Duration::hours(1);

/// Time-ordered rows of one uninterrupted session. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionGroup {
    rows: Vec<SeriesRow>,
}

impl SessionGroup {
    fn starting_with(row: SeriesRow) -> Self {
        Self { rows: vec![row] }
    }

    pub fn rows(&self) -> &[SeriesRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn start(&self) -> Option<QuoteTime> {
        self.rows.first().map(|row| row.time)
    }

    pub fn end(&self) -> Option<QuoteTime> {
        self.rows.last().map(|row| row.time)
    }

    pub fn times(&self) -> impl Iterator<Item = QuoteTime> + '_ {
        self.rows.iter().map(|row| row.time)
    }
}

/// Filters a series to trading hours and splits it at gaps longer than `max_gap`.
#[derive(Debug, Clone)]
pub struct SessionSegmenter {
    windows: Vec<TradingWindow>,
    max_gap: Duration,
}

impl SessionSegmenter {
    pub fn new(windows: Vec<TradingWindow>, max_gap: Duration) -> Result<Self, ValidationError> {
        if !max_gap.is_positive() {
            return Err(ValidationError::InvalidSessionGap);
        }
        Ok(Self { windows, max_gap })
    }

    /// Segmenter that keeps exactly the calendar's trading hours.
    pub fn for_calendar(
        calendar: &TradingCalendar,
        max_gap: Duration,
    ) -> Result<Self, ValidationError> {
        Self::new(calendar.windows().to_vec(), max_gap)
    }

    pub fn with_windows(windows: Vec<TradingWindow>) -> Self {
        Self {
            windows,
            max_gap: DEFAULT_SESSION_GAP,
        }
    }

    fn in_trading_hours(&self, time: QuoteTime) -> bool {
        within_windows(&self.windows, time.time_of_day())
    }

    /// Session groups of `series`, in time order.
    ///
    /// Rows with no values and rows outside every window are discarded first;
    /// only the time of day is checked, not the calendar date.
    pub fn segments(&self, series: &InstrumentSeries) -> Vec<SessionGroup> {
        let mut groups: Vec<SessionGroup> = Vec::new();
        let mut previous: Option<QuoteTime> = None;

        let kept = series
            .rows
            .iter()
            .filter(|row| !row.values.is_empty())
            .filter(|row| self.in_trading_hours(row.time));

        for row in kept {
            let split = previous.map_or(true, |prev| row.time - prev > self.max_gap);
            match groups.last_mut() {
                Some(group) if !split => group.rows.push(*row),
                _ => groups.push(SessionGroup::starting_with(*row)),
            }
            previous = Some(row.time);
        }

        groups
    }
}
