use thiserror::Error;

/// Validation and contract errors exposed by `quoteline-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unrecognized timestamp '{value}'")]
    InvalidTimestamp { value: String },
    #[error("time of day {hour:02}:{minute:02} is out of range")]
    InvalidTimeOfDay { hour: u8, minute: u8 },
    #[error("time of day must look like HH:MM: '{value}'")]
    MalformedTimeOfDay { value: String },

    #[error("trading window start {start} is after end {end}")]
    InvertedWindow { start: String, end: String },
    #[error("trading windows {first} and {second} overlap")]
    OverlappingWindows { first: String, second: String },
    #[error("at least one trading window is required")]
    NoTradingWindows,

    #[error("step must be a positive whole number of minutes, got {seconds}s")]
    InvalidStep { seconds: i64 },
    #[error("session gap must be positive")]
    InvalidSessionGap,

    #[error("schema position {position} is mapped to both '{first}' and '{second}'")]
    DuplicateSchemaPosition {
        position: usize,
        first: &'static str,
        second: &'static str,
    },

    #[error("base url cannot be empty")]
    EmptyBaseUrl,
    #[error("holiday date must be YYYY-MM-DD: '{value}'")]
    InvalidHolidayDate { value: String },
    #[error("holiday {date} is listed under year {year}")]
    HolidayYearMismatch { year: i32, date: String },
}

/// Holiday lookup failures. These are fatal for schedule generation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("no holiday data available for year {year}")]
    YearNotCovered { year: i32 },
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Chart rendering failures, reported per instrument.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing to render for '{id}'")]
    NoSessions { id: String },

    #[error("failed to write chart '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort a whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
