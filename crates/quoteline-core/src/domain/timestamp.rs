use std::fmt::{Display, Formatter};
use std::ops::Sub;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, Weekday};

use crate::{TimeOfDay, ValidationError};

/// Wall-clock market timestamp with minute granularity.
///
/// Seconds and sub-seconds are dropped on construction, so two readings taken
/// within the same minute compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuoteTime(PrimitiveDateTime);

impl QuoteTime {
    pub fn new(value: PrimitiveDateTime) -> Self {
        let excess = Duration::seconds(i64::from(value.second()))
            + Duration::nanoseconds(i64::from(value.nanosecond()));
        Self(value - excess)
    }

    pub fn from_ymd_hm(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
    ) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTimestamp {
            value: format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}"),
        };
        let month = Month::try_from(month).map_err(|_| invalid())?;
        let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;
        let time = Time::from_hms(hour, minute, 0).map_err(|_| invalid())?;
        Ok(Self(PrimitiveDateTime::new(date, time)))
    }

    /// Parse a timestamp, accepting every layout [`QuoteTime::parse_lenient`] does.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Self::parse_lenient(input).ok_or_else(|| ValidationError::InvalidTimestamp {
            value: input.to_owned(),
        })
    }

    /// Best-effort parse of the timestamp layouts seen in scraped tables.
    ///
    /// Returns `None` instead of an error so callers can drop the row and move on.
    pub fn parse_lenient(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let datetime_layouts = [
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            format_description!("[year]-[month]-[day] [hour]:[minute]"),
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            format_description!("[year]-[month]-[day]T[hour]:[minute]"),
            format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"),
            format_description!("[year]/[month]/[day] [hour]:[minute]"),
            format_description!("[year][month][day]-[hour][minute][second]"),
        ];
        for layout in datetime_layouts {
            if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, layout) {
                return Some(Self::new(parsed));
            }
        }

        let date_layouts = [
            format_description!("[year]-[month]-[day]"),
            format_description!("[year]/[month]/[day]"),
        ];
        for layout in date_layouts {
            if let Ok(date) = Date::parse(trimmed, layout) {
                return Some(Self(date.midnight()));
            }
        }

        OffsetDateTime::parse(trimmed, &Rfc3339)
            .ok()
            .map(|parsed| Self::new(PrimitiveDateTime::new(parsed.date(), parsed.time())))
    }

    pub const fn into_inner(self) -> PrimitiveDateTime {
        self.0
    }

    pub const fn date(self) -> Date {
        self.0.date()
    }

    pub const fn year(self) -> i32 {
        self.0.year()
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    pub fn time_of_day(self) -> TimeOfDay {
        TimeOfDay::from_time(self.0.time())
    }

    pub fn checked_add(self, step: Duration) -> Option<Self> {
        self.0.checked_add(step).map(Self::new)
    }

    /// Path key used by the snapshot endpoint, e.g. `20240827-093000`.
    pub fn url_key(self) -> String {
        format!(
            "{:04}{:02}{:02}-{:02}{:02}{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day(),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

impl Sub for QuoteTime {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

impl Display for QuoteTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day(),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

impl Serialize for QuoteTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QuoteTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
