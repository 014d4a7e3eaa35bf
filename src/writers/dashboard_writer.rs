use crate::analyzers::{SummaryAnalyzer, SummaryStatistics};
use crate::error::{ProcessingError, Result};
use crate::models::StateSummary;
use crate::utils::constants::{DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR};
use crate::writers::csv_writer::ensure_complete;
use crate::writers::staging::StagedOutput;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use tracing::debug;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

/// Cold-to-warm scale for December temperatures.
const TEMPERATURE_COLORSCALE: [(f64, &str); 7] = [
    (0.0, "#08306b"),
    (0.2, "#2171b5"),
    (0.4, "#6baed6"),
    (0.5, "#c6dbef"),
    (0.6, "#fee8c8"),
    (0.8, "#fc8d59"),
    (1.0, "#b30000"),
];

/// Renders the summary table as a standalone HTML page with three
/// choropleth maps and a row of headline cards.
pub struct DashboardWriter {
    first_year: i32,
    last_year: i32,
}

impl DashboardWriter {
    pub fn new() -> Self {
        Self {
            first_year: DEFAULT_FIRST_YEAR,
            last_year: DEFAULT_LAST_YEAR,
        }
    }

    pub fn with_climate_window(mut self, first_year: i32, last_year: i32) -> Self {
        self.first_year = first_year;
        self.last_year = last_year;
        self
    }

    pub fn travel_figure(&self, summaries: &[StateSummary]) -> Value {
        let z: Vec<Option<f64>> = summaries
            .iter()
            .map(|s| s.holiday_travel_volume.map(|v| v as f64 / 1_000_000.0))
            .collect();

        choropleth(
            summaries,
            z,
            json!("Blues"),
            "Passengers<br>(Millions)",
            "Holiday Travel Volume: %{z:.2f}M passengers",
            "<b>Holiday Travel Volume by State</b><br><sup>November-December Airport Passengers</sup>",
        )
    }

    pub fn delay_figure(&self, summaries: &[StateSummary]) -> Value {
        let z: Vec<Option<f64>> = summaries.iter().map(|s| s.avg_delay_pct).collect();

        choropleth(
            summaries,
            z,
            json!("Reds"),
            "Delay %",
            "Average Delay Rate: %{z:.1f}%",
            "<b>Average Flight Delay Rate by State</b><br><sup>November-December</sup>",
        )
    }

    pub fn temperature_figure(&self, summaries: &[StateSummary]) -> Value {
        let z: Vec<Option<f64>> = summaries.iter().map(|s| s.avg_dec_temperature).collect();
        let colorscale: Vec<Value> = TEMPERATURE_COLORSCALE
            .iter()
            .map(|(stop, color)| json!([stop, color]))
            .collect();
        let title = format!(
            "<b>Average December Temperature by State</b><br><sup>{}-Year Average ({}-{})</sup>",
            self.last_year - self.first_year + 1,
            self.first_year,
            self.last_year
        );

        choropleth(
            summaries,
            z,
            Value::Array(colorscale),
            "Temp (°F)",
            "Avg December Temp: %{z:.1f}°F",
            &title,
        )
    }

    pub fn render(&self, summaries: &[StateSummary]) -> Result<String> {
        ensure_complete(summaries)?;

        let mut ordered = summaries.to_vec();
        ordered.sort_by(|a, b| a.state.cmp(&b.state));

        let stats = SummaryAnalyzer::new().analyze(&ordered);
        let figures = [
            ("travel-map", self.travel_figure(&ordered)),
            ("delay-map", self.delay_figure(&ordered)),
            ("temperature-map", self.temperature_figure(&ordered)),
        ];

        let mut sections = String::new();
        let mut scripts = String::new();
        for (id, figure) in &figures {
            sections.push_str(&format!(
                "        <section class=\"map-card\"><div id=\"{}\"></div></section>\n",
                id
            ));
            scripts.push_str(&format!(
                "        {{ const figure = {}; Plotly.newPlot(\"{}\", figure.data, figure.layout, {{responsive: true}}); }}\n",
                script_json(figure)?,
                id
            ));
        }

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>US Holiday Travel Dashboard</title>
    <script src="{cdn}"></script>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, sans-serif; background: #0f172a; color: #e2e8f0; margin: 0; }}
        .dashboard-container {{ max-width: 1400px; margin: 0 auto; padding: 2rem; }}
        header {{ text-align: center; padding: 2rem 1rem; }}
        .stats-grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 1rem; margin-bottom: 2rem; }}
        .stat-card {{ background: rgba(30, 41, 59, 0.8); border-radius: 12px; padding: 1.25rem; text-align: center; }}
        .stat-value {{ font-size: 1.8rem; font-weight: 700; color: #60a5fa; }}
        .stat-label {{ font-size: 0.9rem; color: #94a3b8; }}
        .map-card {{ background: rgba(30, 41, 59, 0.8); border-radius: 12px; padding: 1rem; margin-bottom: 2rem; }}
    </style>
</head>
<body>
    <div class="dashboard-container">
        <header>
            <h1>US Holiday Travel Dashboard</h1>
            <p class="subtitle">Holiday travel volume, flight delays and December temperatures by state</p>
        </header>
        <div class="stats-grid">
{cards}        </div>
{sections}    </div>
    <script>
{scripts}    </script>
</body>
</html>
"#,
            cdn = PLOTLY_CDN,
            cards = headline_cards(&stats),
            sections = sections,
            scripts = scripts,
        ))
    }

    /// Stage already rendered HTML beside `path` without touching `path`.
    pub fn stage_html(&self, html: &str, path: &Path) -> Result<StagedOutput> {
        let mut staged = StagedOutput::create(path)?;
        staged
            .file_mut()
            .write_all(html.as_bytes())
            .map_err(|e| ProcessingError::file_access(path, e))?;
        debug!(path = %path.display(), bytes = html.len(), "Staged dashboard");
        Ok(staged)
    }

    pub fn write_dashboard(&self, summaries: &[StateSummary], path: &Path) -> Result<()> {
        let html = self.render(summaries)?;
        self.stage_html(&html, path)?.persist()?;
        Ok(())
    }
}

impl Default for DashboardWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn choropleth(
    summaries: &[StateSummary],
    z: Vec<Option<f64>>,
    colorscale: Value,
    colorbar_title: &str,
    hover_line: &str,
    title: &str,
) -> Value {
    let locations: Vec<&str> = summaries.iter().map(|s| s.state.as_str()).collect();
    let names: Vec<&str> = summaries.iter().map(|s| s.state_name.as_str()).collect();

    json!({
        "data": [{
            "type": "choropleth",
            "locationmode": "USA-states",
            "locations": locations,
            "z": z,
            "text": names,
            "colorscale": colorscale,
            "colorbar": { "title": { "text": colorbar_title } },
            "hovertemplate": format!("<b>%{{text}}</b><br>{}<br><extra></extra>", hover_line),
            "marker": { "line": { "color": "white", "width": 0.5 } }
        }],
        "layout": {
            "title": { "text": title, "x": 0.5, "xanchor": "center" },
            "geo": {
                "scope": "usa",
                "projection": { "type": "albers usa" },
                "showlakes": true,
                "lakecolor": "rgb(255, 255, 255)",
                "bgcolor": "rgba(0,0,0,0)"
            },
            "paper_bgcolor": "rgba(0,0,0,0)",
            "plot_bgcolor": "rgba(0,0,0,0)",
            "margin": { "l": 0, "r": 0, "t": 80, "b": 0 },
            "height": 500
        }
    })
}

fn headline_cards(stats: &SummaryStatistics) -> String {
    let card = |value: String, label: &str| {
        format!(
            "            <div class=\"stat-card\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>\n",
            escape_html(&value),
            escape_html(label)
        )
    };
    let or_dash = |text: Option<String>| text.unwrap_or_else(|| "-".to_string());

    let mut cards = String::new();
    cards.push_str(&card(
        format!("{:.1}M", stats.total_passengers as f64 / 1_000_000.0),
        "Holiday travellers",
    ));
    cards.push_str(&card(
        or_dash(stats.mean_delay_pct.map(|v| format!("{:.1}%", v))),
        "Average delay rate",
    ));
    cards.push_str(&card(
        or_dash(stats.warmest.as_ref().map(|w| w.state_name.clone())),
        "Warmest state",
    ));
    cards.push_str(&card(
        or_dash(stats.busiest.as_ref().map(|b| b.state_name.clone())),
        "Busiest state",
    ));
    cards
}

/// JSON safe to embed inside a `<script>` element.
fn script_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
