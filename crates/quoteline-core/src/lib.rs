//! Core contracts for quoteline.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - The trading calendar and query schedule
//! - Row normalization, pivoting, and session segmentation
//! - Snapshot fetching and chart rendering collaborators
//! - The pipeline that ties them together
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Timestamps, trading windows, raw rows, quote records |
//! | [`calendar`] | Holiday lookup and trading-instant tests |
//! | [`schedule`] | Fixed-step enumeration of query instants |
//! | [`normalize`] | Schema-driven row normalization |
//! | [`pivot`] | Wide (time x field x instrument) quote table |
//! | [`session`] | Splitting a series into trading sessions |
//! | [`fetcher`] | Snapshot retrieval over HTTP |
//! | [`render`] | SVG chart output |
//! | [`config`] | JSON pipeline configuration |
//! | [`pipeline`] | End-to-end run orchestration |
//!
//! ## Example
//!
//! ```rust
//! use quoteline_core::{QuerySchedule, QuoteTime, TradingCalendar};
//!
//! let calendar = TradingCalendar::china_futures();
//! let start = QuoteTime::parse("2024-08-27 11:20:00").unwrap();
//! let end = QuoteTime::parse("2024-08-27 13:40:00").unwrap();
//! let schedule = QuerySchedule::with_default_step(&calendar, start, end);
//!
//! let instants = schedule.collect_instants().unwrap();
//! let labels: Vec<String> = instants.iter().map(|t| t.time_of_day().to_string()).collect();
//! assert_eq!(labels, ["11:20", "11:25", "11:30", "13:30", "13:35", "13:40"]);
//! ```

pub mod calendar;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod html;
pub mod http_client;
pub mod normalize;
pub mod pipeline;
pub mod pivot;
pub mod render;
pub mod schedule;
pub mod session;

pub use calendar::{HolidayLookup, HolidayTable, TradingCalendar};
pub use config::PipelineConfig;
pub use domain::{
    parse_quote_number, validate_windows, within_windows, Field, QuoteRecord, QuoteTime,
    QuoteValues, RawRow, TimeOfDay, TradingWindow,
};
pub use error::{CalendarError, ConfigError, PipelineError, RenderError, ValidationError};
pub use fetcher::{snapshot_url, FetchFuture, Fetcher, HttpTableFetcher};
pub use html::extract_table_rows;
pub use http_client::{
    FixtureHttpClient, HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};
pub use normalize::{DropReason, DroppedRow, NormalizeOutcome, RowNormalizer, RowSchema};
pub use pipeline::{
    InstrumentOutcome, Pipeline, RunReport, RunRequest, RunStatus, SnapshotDrops,
};
pub use pivot::{ColumnKey, InstrumentSeries, PivotBuilder, QuoteTable, SeriesRow};
pub use render::{RenderOutput, Renderer, SvgRenderer};
pub use schedule::{QuerySchedule, ScheduleIter, DEFAULT_STEP};
pub use session::{SessionGroup, SessionSegmenter, DEFAULT_SESSION_GAP};
