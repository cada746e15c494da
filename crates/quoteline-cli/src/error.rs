use thiserror::Error;

use quoteline_core::{CalendarError, ConfigError, PipelineError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("strict mode failed: fetch_failures={fetch_failures}, instrument_problems={instrument_problems}")]
    StrictModeViolation {
        fetch_failures: usize,
        instrument_problems: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<PipelineError> for CliError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Calendar(inner) => Self::Calendar(inner),
            PipelineError::Validation(inner) => Self::Validation(inner),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::Calendar(_) => 3,
            Self::Serialization(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_keep_their_category() {
        let calendar: CliError =
            PipelineError::Calendar(CalendarError::YearNotCovered { year: 2030 }).into();
        assert_eq!(calendar.exit_code(), 3);

        let validation: CliError = PipelineError::Validation(ValidationError::EmptyBaseUrl).into();
        assert_eq!(validation.exit_code(), 2);
    }

    #[test]
    fn config_and_io_codes() {
        let config = CliError::Config(ConfigError::Validation(ValidationError::InvalidSessionGap));
        assert_eq!(config.exit_code(), 2);

        let io = CliError::Io(std::io::Error::other("disk full"));
        assert_eq!(io.exit_code(), 10);
    }
}
