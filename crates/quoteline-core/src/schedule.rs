//! Query instant enumeration over a trading calendar.

use time::Duration;

use crate::{CalendarError, QuoteTime, TradingCalendar, ValidationError};

/// Default spacing between snapshot queries.
pub const DEFAULT_STEP: Duration = Duration::minutes(5);

/// Fixed-step walk from `start` to `end` (inclusive) that keeps trading
/// instants only. Cheap to iterate repeatedly; each [`QuerySchedule::iter`]
/// starts over from `start`.
#[derive(Debug, Clone)]
pub struct QuerySchedule<'a> {
    calendar: &'a TradingCalendar,
    start: QuoteTime,
    end: QuoteTime,
    step: Duration,
}

impl<'a> QuerySchedule<'a> {
    pub fn new(
        calendar: &'a TradingCalendar,
        start: QuoteTime,
        end: QuoteTime,
        step: Duration,
    ) -> Result<Self, ValidationError> {
        let seconds = step.whole_seconds();
        if !step.is_positive() || seconds % 60 != 0 || step.subsec_nanoseconds() != 0 {
            return Err(ValidationError::InvalidStep { seconds });
        }
        Ok(Self {
            calendar,
            start,
            end,
            step,
        })
    }

    pub fn with_default_step(
        calendar: &'a TradingCalendar,
        start: QuoteTime,
        end: QuoteTime,
    ) -> Self {
        Self {
            calendar,
            start,
            end,
            step: DEFAULT_STEP,
        }
    }

    pub const fn start(&self) -> QuoteTime {
        self.start
    }

    pub const fn end(&self) -> QuoteTime {
        self.end
    }

    pub const fn step(&self) -> Duration {
        self.step
    }

    pub fn iter(&self) -> ScheduleIter<'a> {
        ScheduleIter {
            calendar: self.calendar,
            next: (self.start <= self.end).then_some(self.start),
            end: self.end,
            step: self.step,
        }
    }

    /// Verify the holiday source answers for every year the walk touches.
    pub fn coverage_check(&self) -> Result<(), CalendarError> {
        if self.start > self.end {
            return Ok(());
        }
        self.calendar
            .ensure_covers(self.start.year()..=self.end.year())
    }

    pub fn collect_instants(&self) -> Result<Vec<QuoteTime>, CalendarError> {
        self.iter().collect()
    }
}

impl<'s, 'a> IntoIterator for &'s QuerySchedule<'a> {
    type Item = Result<QuoteTime, CalendarError>;
    type IntoIter = ScheduleIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator behind [`QuerySchedule`]. Ends after the first calendar error.
#[derive(Debug, Clone)]
pub struct ScheduleIter<'a> {
    calendar: &'a TradingCalendar,
    next: Option<QuoteTime>,
    end: QuoteTime,
    step: Duration,
}

impl Iterator for ScheduleIter<'_> {
    type Item = Result<QuoteTime, CalendarError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.next {
            self.next = current
                .checked_add(self.step)
                .filter(|candidate| *candidate <= self.end);

            match self.calendar.is_trading_instant(current) {
                Ok(true) => return Some(Ok(current)),
                Ok(false) => continue,
                Err(error) => {
                    self.next = None;
                    return Some(Err(error));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: u8, day: u8, hour: u8, minute: u8) -> QuoteTime {
        QuoteTime::from_ymd_hm(year, month, day, hour, minute).expect("valid timestamp")
    }

    #[test]
    fn skips_lunch_break() {
        let calendar = TradingCalendar::china_futures();
        let schedule = QuerySchedule::with_default_step(
            &calendar,
            at(2024, 8, 27, 11, 20),
            at(2024, 8, 27, 13, 40),
        );
        let instants = schedule.collect_instants().expect("covered");
        let rendered: Vec<String> = instants.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "2024-08-27 11:20:00",
                "2024-08-27 11:25:00",
                "2024-08-27 11:30:00",
                "2024-08-27 13:30:00",
                "2024-08-27 13:35:00",
                "2024-08-27 13:40:00",
            ]
        );
    }

    #[test]
    fn schedule_is_restartable() {
        let calendar = TradingCalendar::china_futures();
        let schedule = QuerySchedule::with_default_step(
            &calendar,
            at(2024, 8, 27, 9, 0),
            at(2024, 8, 27, 9, 30),
        );
        let first: Vec<_> = schedule.iter().collect();
        let second: Vec<_> = schedule.iter().collect();
        assert_eq!(first.len(), 7);
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_non_positive_or_fractional_step() {
        let calendar = TradingCalendar::china_futures();
        let start = at(2024, 8, 27, 9, 0);
        for step in [Duration::ZERO, Duration::minutes(-5), Duration::seconds(90)] {
            let err = QuerySchedule::new(&calendar, start, start, step).expect_err("must fail");
            assert!(matches!(err, ValidationError::InvalidStep { .. }));
        }
    }

    #[test]
    fn stops_after_calendar_error() {
        let calendar = TradingCalendar::china_futures();
        let schedule = QuerySchedule::new(
            &calendar,
            at(2026, 12, 31, 23, 25),
            at(2027, 1, 4, 9, 10),
            Duration::minutes(5),
        )
        .expect("valid step");
        let items: Vec<_> = schedule.iter().collect();
        assert!(items.first().is_some_and(|item| item.is_ok()));
        assert_eq!(
            items.last(),
            Some(&Err(CalendarError::YearNotCovered { year: 2027 }))
        );
        assert!(schedule.coverage_check().is_err());
    }
}
