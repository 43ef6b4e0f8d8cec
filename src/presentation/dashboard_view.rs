// Dashboard view - JSON and HTML renderings of the poll state
use crate::application::poller::PollState;
use crate::domain::reading::{format_clock, GlucoseLevel, NormalizedReading, RawSeriesPoint};
use crate::domain::trend::TrendArrow;
use crate::domain::units::format_mmol_l;
use crate::infrastructure::config::DashboardSettings;
use serde::Serialize;
use serde_json::Number;
use std::fmt::Write;

/// Chart y-axis domain in mg/dL
const CHART_Y_MIN: f64 = 60.0;
const CHART_Y_MAX: f64 = 200.0;
const CHART_Y_STEP: f64 = 20.0;
/// Dashed reference lines (value, colour)
const REFERENCE_LINES: [(f64, &str); 2] = [(180.0, "#EF4444"), (70.0, "#3B82F6")];

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 320.0;
const MARGIN_TOP: f64 = 5.0;
const MARGIN_RIGHT: f64 = 10.0;
const MARGIN_BOTTOM: f64 = 30.0;
const MARGIN_LEFT: f64 = 40.0;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub status: &'static str,
    pub loading: bool,
    pub error: Option<String>,
    pub reading: Option<ReadingView>,
    pub series: Vec<RawSeriesPoint>,
    pub fetched_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingView {
    pub value: Number,
    pub mmol: String,
    pub trend: i64,
    pub trend_label: &'static str,
    pub trend_glyph: &'static str,
    pub trend_steep: bool,
    pub timestamp: String,
    pub level: GlucoseLevel,
    pub is_high: bool,
    pub is_low: bool,
}

impl From<&NormalizedReading> for ReadingView {
    fn from(reading: &NormalizedReading) -> Self {
        let arrow = TrendArrow::from_code(reading.trend);
        Self {
            value: reading.value.clone(),
            mmol: format_mmol_l(reading.mg_dl()),
            trend: reading.trend,
            trend_label: arrow.label(),
            trend_glyph: arrow.glyph(),
            trend_steep: arrow.steep,
            timestamp: reading.timestamp.clone(),
            level: reading.level,
            is_high: reading.is_high,
            is_low: reading.is_low,
        }
    }
}

impl DashboardView {
    pub fn from_state(state: &PollState) -> Self {
        let snapshot = state.snapshot();
        Self {
            status: state.status(),
            loading: state.is_loading(),
            error: state.error().map(str::to_string),
            reading: snapshot.map(|s| ReadingView::from(&s.reading)),
            series: snapshot.map(|s| s.series.clone()).unwrap_or_default(),
            fetched_at: snapshot.map(|s| s.fetched_at.to_rfc3339()),
        }
    }
}

/// Render the full dashboard page
pub fn render_page(state: &PollState, settings: &DashboardSettings) -> String {
    let body = match state.snapshot() {
        Some(snapshot) => {
            let mut card = render_readout(&snapshot.reading);
            if settings.show_chart {
                card.push_str("<div class=\"chart\">");
                card.push_str(&render_chart(&snapshot.series));
                card.push_str("</div>");
            }
            card.push_str(&render_footer(&snapshot.reading));
            if state.is_loading() {
                card.push_str("<div class=\"notice\">Loading data...</div>");
            }
            card
        }
        None => "<div class=\"notice\">Loading data...</div>".to_string(),
    };

    let error = state
        .error()
        .map(|e| format!("<div class=\"error\">{}</div>", escape_html(e)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta http-equiv="refresh" content="{refresh}">
<title>Azúcar</title>
<style>{style}</style>
</head>
<body>
<main class="card">
<header><span class="drop">&#128167;</span> Glucose Monitor</header>
{body}
{error}
</main>
</body>
</html>
"#,
        refresh = settings.poll_interval_secs,
        style = STYLE,
        body = body,
        error = error,
    )
}

fn render_readout(reading: &NormalizedReading) -> String {
    let arrow = TrendArrow::from_code(reading.trend);
    let color = reading.level.color();
    format!(
        r#"<section class="readout">
<div class="unit"><span class="value" style="color:{color}">{mg}</span><span class="label">mg/dL</span></div>
<div class="divider"></div>
<div class="unit"><span class="value" style="color:{color}">{mmol}</span><span class="label">mmol/L</span></div>
<div class="divider"></div>
<div class="unit"><span class="arrow" title="trend {code}">{glyph}</span><span class="label small">{trend}</span></div>
</section>
"#,
        color = color,
        mg = reading.value,
        mmol = format_mmol_l(reading.mg_dl()),
        code = reading.trend,
        glyph = arrow.glyph(),
        trend = arrow.label(),
    )
}

fn render_footer(reading: &NormalizedReading) -> String {
    format!(
        r#"<footer>
<div class="row"><span>Last updated</span><span>{updated}</span></div>
<div class="row"><span>Status</span><span style="color:{color}">{status}</span></div>
</footer>
"#,
        updated = escape_html(&format_clock(&reading.timestamp)),
        color = reading.level.color(),
        status = reading.level.label(),
    )
}

fn y_position(value: f64) -> f64 {
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let clamped = value.clamp(CHART_Y_MIN, CHART_Y_MAX);
    MARGIN_TOP + (CHART_Y_MAX - clamped) / (CHART_Y_MAX - CHART_Y_MIN) * plot_height
}

/// Points are spread evenly by index, like a category axis.
fn x_position(index: usize, count: usize) -> f64 {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    if count <= 1 {
        return MARGIN_LEFT + plot_width / 2.0;
    }
    MARGIN_LEFT + index as f64 / (count - 1) as f64 * plot_width
}

/// Inline SVG line chart of the series with fixed reference lines.
/// Points without a numeric `Value` are left off the chart.
pub fn render_chart(series: &[RawSeriesPoint]) -> String {
    let plotted: Vec<(&str, &Number)> = series
        .iter()
        .filter_map(|p| p.value().map(|v| (p.timestamp(), v)))
        .collect();
    let mut svg = String::new();
    let left = MARGIN_LEFT;
    let right = CHART_WIDTH - MARGIN_RIGHT;

    let _ = write!(
        svg,
        r#"<svg viewBox="0 0 {w} {h}" width="100%" role="img" aria-label="Glucose history">"#,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );

    let mut tick = CHART_Y_MIN;
    while tick <= CHART_Y_MAX {
        let y = y_position(tick);
        let _ = write!(
            svg,
            r##"<line x1="{left}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="rgba(255,255,255,0.1)" stroke-dasharray="3 3"/><text x="{lx}" y="{ty:.1}" fill="#9CA3AF" font-size="11" text-anchor="end">{tick}</text>"##,
            lx = left - 6.0,
            ty = y + 4.0,
        );
        tick += CHART_Y_STEP;
    }

    for (value, color) in REFERENCE_LINES {
        let y = y_position(value);
        let _ = write!(
            svg,
            r#"<line x1="{left}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="{color}" stroke-dasharray="3 3"/>"#
        );
    }

    if !plotted.is_empty() {
        let points: Vec<(f64, f64)> = plotted
            .iter()
            .enumerate()
            .map(|(i, (_, v))| {
                let mg_dl = v.as_f64().unwrap_or_default();
                (x_position(i, plotted.len()), y_position(mg_dl))
            })
            .collect();

        let path = points
            .iter()
            .map(|(x, y)| format!("{:.1},{:.1}", x, y))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            svg,
            r##"<polyline points="{path}" fill="none" stroke="#10B981" stroke-width="2"/>"##
        );

        for ((x, y), (timestamp, value)) in points.iter().zip(&plotted) {
            let _ = write!(
                svg,
                r##"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="#10B981"><title>{time} · {value} mg/dL</title></circle>"##,
                time = escape_html(&format_clock(timestamp)),
            );
        }

        // Time labels at the start, middle and end of the axis
        let mut label_indices = vec![0, plotted.len() / 2, plotted.len() - 1];
        label_indices.dedup();
        for i in label_indices {
            let _ = write!(
                svg,
                r##"<text x="{x:.1}" y="{y}" fill="#9CA3AF" font-size="11" text-anchor="middle">{label}</text>"##,
                x = points[i].0,
                y = CHART_HEIGHT - 10.0,
                label = escape_html(&format_clock(plotted[i].0)),
            );
        }
    }

    svg.push_str("</svg>");
    svg
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const STYLE: &str = "\
body{margin:0;min-height:100vh;display:flex;align-items:center;justify-content:center;background:#030712;font-family:system-ui,sans-serif;color:#d1d5db}\
.card{width:100%;max-width:42rem;background:#111827;border:1px solid #1f2937;border-radius:.75rem;padding:1.5rem;box-sizing:border-box}\
header{color:#9ca3af;font-size:.875rem;margin-bottom:1.5rem}\
.drop{color:#60a5fa}\
.readout{display:flex;align-items:center;justify-content:center;gap:1.5rem;padding:1.5rem 0}\
.unit{display:flex;flex-direction:column;align-items:center}\
.value{font-size:3.75rem;font-weight:700}\
.arrow{font-size:2.5rem;color:#d1d5db}\
.label{color:#9ca3af;margin-top:.25rem}\
.small{font-size:.75rem}\
.divider{width:1px;height:4rem;background:#374151}\
.chart{margin-top:1rem}\
footer{margin-top:1.5rem;padding-top:1rem;border-top:1px solid #1f2937;font-size:.875rem}\
.row{display:flex;justify-content:space-between;margin-top:.5rem}\
.row span:first-child{color:#9ca3af}\
.notice{text-align:center;color:#9ca3af;margin-top:.5rem}\
.error{text-align:center;color:#f87171;margin-top:.5rem}";
