//! End-to-end run: schedule, fetch, normalize, pivot, segment, render.
//!
//! Fetches are awaited one at a time. Per-snapshot and per-instrument
//! problems are recorded in the [`RunReport`]; only calendar and validation
//! failures abort a run.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::fetcher::{Fetcher, HttpTableFetcher};
use crate::http_client::ReqwestHttpClient;
use crate::render::{Renderer, SvgRenderer};
use crate::{
    DroppedRow, PipelineConfig, PipelineError, PivotBuilder, QuerySchedule, QuoteRecord,
    QuoteTable, QuoteTime, RowNormalizer, SessionSegmenter, TradingCalendar, ValidationError,
};

/// Time range and optional instrument filter for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub start: QuoteTime,
    pub end: QuoteTime,
    /// `None` renders every instrument seen in the data.
    pub instruments: Option<Vec<String>>,
}

impl RunRequest {
    pub fn new(start: QuoteTime, end: QuoteTime) -> Self {
        Self {
            start,
            end,
            instruments: None,
        }
    }

    pub fn with_instruments<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instruments = Some(ids.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// No usable records were collected; nothing was rendered.
    NothingToDo,
}

/// What happened to one instrument during rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InstrumentOutcome {
    Rendered {
        id: String,
        path: PathBuf,
        sessions: usize,
        points: usize,
    },
    Missing {
        id: String,
    },
    NoSessions {
        id: String,
    },
    RenderFailed {
        id: String,
        error: String,
    },
}

impl InstrumentOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Rendered { id, .. }
            | Self::Missing { id }
            | Self::NoSessions { id }
            | Self::RenderFailed { id, .. } => id,
        }
    }

    pub const fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

/// Rows rejected from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotDrops {
    pub at: QuoteTime,
    pub rows: Vec<DroppedRow>,
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub start: QuoteTime,
    pub end: QuoteTime,
    pub instants_scheduled: usize,
    pub snapshots_fetched: usize,
    pub fetch_failures: Vec<QuoteTime>,
    pub rows_received: usize,
    pub records_kept: usize,
    pub rows_dropped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub drops: Vec<SnapshotDrops>,
    pub duplicates_discarded: usize,
    pub instruments_seen: usize,
    pub outcomes: Vec<InstrumentOutcome>,
}

impl RunReport {
    fn begin(request: &RunRequest) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Completed,
            start: request.start,
            end: request.end,
            instants_scheduled: 0,
            snapshots_fetched: 0,
            fetch_failures: Vec::new(),
            rows_received: 0,
            records_kept: 0,
            rows_dropped: 0,
            drops: Vec::new(),
            duplicates_discarded: 0,
            instruments_seen: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn rendered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_rendered()).count()
    }

    pub fn outcome(&self, id: &str) -> Option<&InstrumentOutcome> {
        self.outcomes.iter().find(|o| o.id() == id)
    }
}

/// Orchestrates one run over a calendar, a fetcher, and a renderer.
pub struct Pipeline {
    calendar: TradingCalendar,
    step: Duration,
    normalizer: RowNormalizer,
    segmenter: SessionSegmenter,
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn Renderer>,
}

impl Pipeline {
    /// Session filtering uses the trading windows of `calendar`, so queries
    /// and charts always agree on trading hours. `config.trading_windows`
    /// only matters through [`PipelineConfig::build_calendar`].
    pub fn new(
        config: &PipelineConfig,
        calendar: TradingCalendar,
        fetcher: Arc<dyn Fetcher>,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        let segmenter = SessionSegmenter::for_calendar(&calendar, config.session_gap())?;
        Ok(Self {
            step: config.step(),
            normalizer: config.normalizer()?,
            segmenter,
            calendar,
            fetcher,
            renderer,
        })
    }

    /// Production wiring: reqwest transport, HTML table fetcher, SVG charts.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ValidationError> {
        let calendar = config.build_calendar()?;
        let fetcher = HttpTableFetcher::new(
            Arc::new(ReqwestHttpClient::new()),
            config.base_url.as_str(),
        )
        .with_user_agent(config.user_agent.as_str())
        .with_timeout_ms(config.timeout_ms);
        let renderer = SvgRenderer::new(config.output_dir.clone());
        Self::new(config, calendar, Arc::new(fetcher), Arc::new(renderer))
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// Every query instant for `[start, end]`, after checking holiday coverage.
    pub fn schedule(
        &self,
        start: QuoteTime,
        end: QuoteTime,
    ) -> Result<Vec<QuoteTime>, PipelineError> {
        let schedule = QuerySchedule::new(&self.calendar, start, end, self.step)?;
        schedule.coverage_check()?;
        Ok(schedule.collect_instants()?)
    }

    pub async fn run(&self, request: &RunRequest) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::begin(request);
        let run_id = report.run_id;

        let instants = self.schedule(request.start, request.end)?;
        report.instants_scheduled = instants.len();
        info!(
            %run_id,
            start = %request.start,
            end = %request.end,
            instants = instants.len(),
            "schedule built"
        );

        let records = self.collect(&instants, &mut report).await;
        report.records_kept = records.len();
        if records.is_empty() {
            info!(%run_id, failures = report.fetch_failures.len(), "no data collected");
            report.status = RunStatus::NothingToDo;
            return Ok(report);
        }

        let table = PivotBuilder::new().build(&records);
        report.duplicates_discarded = table.duplicates_discarded();
        report.instruments_seen = table.instrument_count();
        if table.instrument_count() == 0 {
            report.status = RunStatus::NothingToDo;
            return Ok(report);
        }
        info!(
            %run_id,
            rows = table.len(),
            instruments = table.instrument_count(),
            duplicates = table.duplicates_discarded(),
            "quote table built"
        );

        for id in targets(request, &table) {
            let outcome = self.render_instrument(&table, &id);
            report.outcomes.push(outcome);
        }

        info!(
            %run_id,
            rendered = report.rendered_count(),
            instruments = report.outcomes.len(),
            "run finished"
        );
        Ok(report)
    }

    async fn collect(&self, instants: &[QuoteTime], report: &mut RunReport) -> Vec<QuoteRecord> {
        let mut records = Vec::new();
        for at in instants {
            let Some(rows) = self.fetcher.fetch(*at).await else {
                warn!(%at, "snapshot unavailable");
                report.fetch_failures.push(*at);
                continue;
            };
            report.snapshots_fetched += 1;
            report.rows_received += rows.len();

            let outcome = self.normalizer.normalize(&rows);
            debug!(%at, rows = rows.len(), records = outcome.records.len(), "snapshot normalized");
            if !outcome.dropped.is_empty() {
                warn!(%at, dropped = outcome.dropped_count(), "rows dropped from snapshot");
                report.rows_dropped += outcome.dropped_count();
                report.drops.push(SnapshotDrops {
                    at: *at,
                    rows: outcome.dropped,
                });
            }
            records.extend(outcome.records);
        }
        records
    }

    fn render_instrument(&self, table: &QuoteTable, id: &str) -> InstrumentOutcome {
        let Some(series) = table.series(id) else {
            warn!(id, "instrument not present in collected data");
            return InstrumentOutcome::Missing { id: id.to_owned() };
        };

        let sessions = self.segmenter.segments(&series);
        if sessions.is_empty() {
            info!(id, "no trading-hour data to plot");
            return InstrumentOutcome::NoSessions { id: id.to_owned() };
        }

        match self.renderer.render(id, &sessions) {
            Ok(output) => {
                info!(
                    id,
                    path = %output.path.display(),
                    sessions = output.sessions,
                    "chart rendered"
                );
                InstrumentOutcome::Rendered {
                    id: output.id,
                    path: output.path,
                    sessions: output.sessions,
                    points: output.points,
                }
            }
            Err(err) => {
                error!(id, error = %err, "chart rendering failed");
                InstrumentOutcome::RenderFailed {
                    id: id.to_owned(),
                    error: err.to_string(),
                }
            }
        }
    }
}

/// Requested ids in request order without repeats, or every table instrument.
fn targets(request: &RunRequest, table: &QuoteTable) -> Vec<String> {
    match &request.instruments {
        Some(ids) => {
            let mut seen = BTreeSet::new();
            ids.iter()
                .map(|id| id.trim())
                .filter(|id| !id.is_empty() && seen.insert(*id))
                .map(str::to_owned)
                .collect()
        }
        None => table.instruments().map(str::to_owned).collect(),
    }
}
