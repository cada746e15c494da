use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Time;

use crate::ValidationError;

/// Intraday (hour, minute) reading. Ordering is lexicographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTimeOfDay { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    pub fn from_time(value: Time) -> Self {
        Self {
            hour: value.hour(),
            minute: value.minute(),
        }
    }

    pub const fn hour(self) -> u8 {
        self.hour
    }

    pub const fn minute(self) -> u8 {
        self.minute
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedTimeOfDay {
            value: value.to_owned(),
        };
        let (hour, minute) = value.trim().split_once(':').ok_or_else(malformed)?;
        let hour = hour.parse::<u8>().map_err(|_| malformed())?;
        let minute = minute.parse::<u8>().map_err(|_| malformed())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Inclusive intraday trading interval, e.g. `09:00-11:30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TradingWindow {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TradingWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Day session, afternoon session, and night session of the futures board.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::from_hm((9, 0), (11, 30)),
            Self::from_hm((13, 30), (15, 0)),
            Self::from_hm((21, 0), (23, 30)),
        ]
    }

    // Only for literals known to be valid.
    const fn from_hm(start: (u8, u8), end: (u8, u8)) -> Self {
        Self {
            start: TimeOfDay {
                hour: start.0,
                minute: start.1,
            },
            end: TimeOfDay {
                hour: end.0,
                minute: end.1,
            },
        }
    }

    pub const fn start(self) -> TimeOfDay {
        self.start
    }

    pub const fn end(self) -> TimeOfDay {
        self.end
    }

    pub fn contains(self, value: TimeOfDay) -> bool {
        self.start <= value && value <= self.end
    }

    pub fn overlaps(self, other: Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Whether `value` falls inside any of `windows`.
pub fn within_windows(windows: &[TradingWindow], value: TimeOfDay) -> bool {
    windows.iter().any(|window| window.contains(value))
}

/// Reject window sets that are empty or overlap each other.
pub fn validate_windows(windows: &[TradingWindow]) -> Result<(), ValidationError> {
    if windows.is_empty() {
        return Err(ValidationError::NoTradingWindows);
    }
    for (index, first) in windows.iter().enumerate() {
        for second in &windows[index + 1..] {
            if first.overlaps(*second) {
                return Err(ValidationError::OverlappingWindows {
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }
    }
    Ok(())
}

impl Display for TradingWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for TradingWindow {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) =
            value
                .trim()
                .split_once('-')
                .ok_or_else(|| ValidationError::MalformedTimeOfDay {
                    value: value.to_owned(),
                })?;
        Self::new(start.parse()?, end.parse()?)
    }
}

impl TryFrom<String> for TradingWindow {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TradingWindow> for String {
    fn from(value: TradingWindow) -> Self {
        value.to_string()
    }
}
