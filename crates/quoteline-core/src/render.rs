//! Per-instrument chart rendering.
//!
//! [`SvgRenderer`] lays out two stacked panels: the `s`/`m`/`l` levels on top
//! and `y` below at half the height. Each session is drawn as its own
//! polyline, so no line ever spans a break between sessions. A missing value
//! inside a session also breaks the line.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use time::Duration;
use tracing::debug;

use crate::{Field, QuoteTime, RenderError, SessionGroup};

/// Chart file written for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    pub id: String,
    pub path: PathBuf,
    pub sessions: usize,
    pub points: usize,
}

/// Draws one chart per instrument from its session groups.
pub trait Renderer: Send + Sync {
    fn render(&self, id: &str, sessions: &[SessionGroup]) -> Result<RenderOutput, RenderError>;
}

struct Series {
    field: Field,
    label: &'static str,
    color: &'static str,
}

const LEVEL_SERIES: [Series; 3] = [
    Series {
        field: Field::S,
        label: "Short",
        color: "#1f77b4",
    },
    Series {
        field: Field::M,
        label: "Medium",
        color: "#ff7f0e",
    },
    Series {
        field: Field::L,
        label: "Long",
        color: "#2ca02c",
    },
];

const VALUE_SERIES: [Series; 1] = [Series {
    field: Field::Y,
    label: "Value",
    color: "#d62728",
}];

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 50.0;
const PANEL_GAP: f64 = 50.0;
const Y_TICKS: usize = 5;
const MAX_X_TICKS: i64 = 24;

/// Writes `plot_{id}.svg` files into an output directory.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    output_dir: PathBuf,
    width: f64,
    height: f64,
}

impl SvgRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            width: 1200.0,
            height: 800.0,
        }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.output_dir
            .join(format!("plot_{}.svg", sanitize_file_stem(id)))
    }

    /// Full SVG document for `sessions`, or `None` when there is nothing to draw.
    pub fn to_svg(&self, id: &str, sessions: &[SessionGroup]) -> Option<String> {
        let sessions: Vec<&SessionGroup> = sessions.iter().filter(|s| !s.is_empty()).collect();
        let first = sessions.iter().filter_map(|s| s.start()).min()?;
        let last = sessions.iter().filter_map(|s| s.end()).max()?;

        let axis = TimeAxis::new(first, last);
        let plot_width = self.width - MARGIN_LEFT - MARGIN_RIGHT;
        let usable = self.height - MARGIN_TOP - MARGIN_BOTTOM - PANEL_GAP;
        let upper = Panel {
            top: MARGIN_TOP,
            height: usable * 2.0 / 3.0,
            left: MARGIN_LEFT,
            width: plot_width,
        };
        let lower = Panel {
            top: MARGIN_TOP + upper.height + PANEL_GAP,
            height: usable / 3.0,
            left: MARGIN_LEFT,
            width: plot_width,
        };

        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
             viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\" font-size=\"12\">\n",
            w = self.width,
            h = self.height
        ));
        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");
        svg.push_str(&format!(
            "<text class=\"title\" x=\"{:.1}\" y=\"30\" text-anchor=\"middle\" font-size=\"16\">ID: {} - Trading Data</text>\n",
            self.width / 2.0,
            escape_xml(id)
        ));

        draw_panel(&mut svg, &upper, &axis, &sessions, &LEVEL_SERIES, "Price Levels");
        draw_panel(&mut svg, &lower, &axis, &sessions, &VALUE_SERIES, "Value");

        svg.push_str("</svg>\n");
        Some(svg)
    }
}

impl Renderer for SvgRenderer {
    fn render(&self, id: &str, sessions: &[SessionGroup]) -> Result<RenderOutput, RenderError> {
        let document = self
            .to_svg(id, sessions)
            .ok_or_else(|| RenderError::NoSessions { id: id.to_owned() })?;

        fs::create_dir_all(&self.output_dir).map_err(|source| RenderError::Io {
            path: self.output_dir.display().to_string(),
            source,
        })?;
        let path = self.path_for(id);
        fs::write(&path, document).map_err(|source| RenderError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let drawn: Vec<&SessionGroup> = sessions.iter().filter(|s| !s.is_empty()).collect();
        let output = RenderOutput {
            id: id.to_owned(),
            path,
            sessions: drawn.len(),
            points: drawn.iter().map(|s| s.len()).sum(),
        };
        debug!(id, path = %output.path.display(), sessions = output.sessions, "chart written");
        Ok(output)
    }
}

struct Panel {
    top: f64,
    height: f64,
    left: f64,
    width: f64,
}

impl Panel {
    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }
}

struct TimeAxis {
    origin: QuoteTime,
    span_seconds: f64,
}

impl TimeAxis {
    fn new(first: QuoteTime, last: QuoteTime) -> Self {
        // A single instant still gets a readable half-hour either side.
        let (origin, span) = if last > first {
            (first, last - first)
        } else {
            let pad = Duration::minutes(30);
            (
                QuoteTime::new(first.into_inner() - pad),
                pad * 2,
            )
        };
        Self {
            origin,
            span_seconds: span.whole_seconds() as f64,
        }
    }

    fn fraction(&self, time: QuoteTime) -> f64 {
        (time - self.origin).whole_seconds() as f64 / self.span_seconds
    }

    /// Whole-hour ticks inside the axis, thinned to at most `MAX_X_TICKS`.
    fn hour_ticks(&self) -> Vec<QuoteTime> {
        let minute = i64::from(self.origin.time_of_day().minute());
        let lead = Duration::minutes((60 - minute) % 60);
        let span_hours = (self.span_seconds / 3600.0).ceil() as i64;
        let interval = Duration::hours(((span_hours + MAX_X_TICKS - 1) / MAX_X_TICKS).max(1));

        let mut ticks = Vec::new();
        let mut offset = lead;
        while offset.whole_seconds() as f64 <= self.span_seconds {
            match self.origin.checked_add(offset) {
                Some(tick) => ticks.push(tick),
                None => break,
            }
            offset += interval;
        }
        ticks
    }
}

fn value_range(sessions: &[&SessionGroup], series: &[Series]) -> (f64, f64) {
    let mut values = sessions
        .iter()
        .flat_map(|session| session.rows())
        .flat_map(|row| series.iter().filter_map(move |s| row.values.get(s.field)));

    let Some(first) = values.next() else {
        return (0.0, 1.0);
    };
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }
    let margin = (max - min) * 0.1;
    (min - margin, max + margin)
}

fn draw_panel(
    svg: &mut String,
    panel: &Panel,
    axis: &TimeAxis,
    sessions: &[&SessionGroup],
    series: &[Series],
    y_label: &str,
) {
    let (lo, hi) = value_range(sessions, series);
    let x_of = |time: QuoteTime| panel.left + axis.fraction(time) * panel.width;
    let y_of = |value: f64| panel.bottom() - (value - lo) / (hi - lo) * panel.height;

    svg.push_str(&format!(
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"none\" stroke=\"#333333\"/>\n",
        panel.left, panel.top, panel.width, panel.height
    ));

    for tick in axis.hour_ticks() {
        let x = x_of(tick);
        svg.push_str(&format!(
            "<line x1=\"{x:.1}\" y1=\"{:.1}\" x2=\"{x:.1}\" y2=\"{:.1}\" stroke=\"#000000\" stroke-opacity=\"0.3\"/>\n",
            panel.top,
            panel.bottom()
        ));
        svg.push_str(&format!(
            "<text class=\"x-tick\" x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>\n",
            panel.bottom() + 16.0,
            tick.time_of_day()
        ));
    }

    for step in 0..Y_TICKS {
        let value = lo + (hi - lo) * step as f64 / (Y_TICKS - 1) as f64;
        let y = y_of(value);
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#000000\" stroke-opacity=\"0.3\"/>\n",
            panel.left,
            panel.right()
        ));
        svg.push_str(&format!(
            "<text class=\"y-tick\" x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>\n",
            panel.left - 6.0,
            y + 4.0,
            format_value(value, hi - lo)
        ));
    }

    svg.push_str(&format!(
        "<text x=\"18\" y=\"{:.1}\" text-anchor=\"middle\" transform=\"rotate(-90 18 {:.1})\">{}</text>\n",
        panel.top + panel.height / 2.0,
        panel.top + panel.height / 2.0,
        escape_xml(y_label)
    ));

    for item in series {
        for session in sessions {
            for run in contiguous_runs(session, item.field) {
                let points: Vec<String> = run
                    .iter()
                    .map(|(time, value)| format!("{:.1},{:.1}", x_of(*time), y_of(*value)))
                    .collect();
                svg.push_str(&format!(
                    "<polyline data-field=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\" points=\"{}\"/>\n",
                    item.field,
                    item.color,
                    points.join(" ")
                ));
            }
        }
    }

    for (index, item) in series.iter().enumerate() {
        let y = panel.top + 16.0 + index as f64 * 16.0;
        let x = panel.left + 10.0;
        svg.push_str(&format!(
            "<line x1=\"{x:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
            y - 4.0,
            x + 20.0,
            y - 4.0,
            item.color
        ));
        svg.push_str(&format!(
            "<text class=\"legend\" x=\"{:.1}\" y=\"{y:.1}\">{}</text>\n",
            x + 26.0,
            item.label
        ));
    }
}

/// Consecutive present values of `field` within one session.
fn contiguous_runs(session: &SessionGroup, field: Field) -> Vec<Vec<(QuoteTime, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for row in session.rows() {
        match row.values.get(field) {
            Some(value) => current.push((row.time, value)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn format_value(value: f64, range: f64) -> String {
    if range >= 100.0 {
        format!("{value:.0}")
    } else if range >= 1.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.4}")
    }
}

fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// File-name-safe form of an instrument id.
pub fn sanitize_file_stem(id: &str) -> String {
    let stem: String = id
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() || stem.chars().all(|ch| ch == '.') {
        String::from("_")
    } else {
        stem
    }
}
