//! # Domain Models
//!
//! Canonical domain types for quoteline.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`QuoteTime`] | Minute-granularity wall-clock timestamp |
//! | [`TimeOfDay`] | Intraday (hour, minute) reading |
//! | [`TradingWindow`] | Inclusive intraday trading interval |
//! | [`RawRow`] | One scraped table row |
//! | [`Field`] | Numeric quote field (`y`, `l`, `m`, `s`) |
//! | [`QuoteValues`] | The four numeric fields, each possibly missing |
//! | [`QuoteRecord`] | Normalized (time, instrument, values) observation |
//!
//! ## Validation
//!
//! Constructors validate their inputs and return [`ValidationError`](crate::ValidationError):
//!
//! ```rust
//! use quoteline_core::{TradingWindow, ValidationError};
//!
//! let window: TradingWindow = "09:00-11:30".parse()?;
//! assert_eq!(window.to_string(), "09:00-11:30");
//!
//! let inverted = "15:00-13:30".parse::<TradingWindow>();
//! assert!(matches!(inverted, Err(ValidationError::InvertedWindow { .. })));
//! # Ok::<(), ValidationError>(())
//! ```

mod record;
mod timestamp;
mod window;

pub use record::{parse_quote_number, Field, QuoteRecord, QuoteValues, RawRow};
pub use timestamp::QuoteTime;
pub use window::{validate_windows, within_windows, TimeOfDay, TradingWindow};
