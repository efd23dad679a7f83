// =============================================================================
// Chart Descriptions — divergence and RSI charts for an external renderer
// =============================================================================
//
// Turns an `Analysis` into serialisable chart specifications: lines, reference
// lines, point markers, year-start ticks and a citation line.  Pixel rendering
// is left to whatever consumes the JSON.
//
// Styling comes exclusively from the `RenderConfig` passed in by the caller.
// =============================================================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::engine::Analysis;
use crate::types::{CrossDirection, DivergenceMode};

// =============================================================================
// Default-value helpers
// =============================================================================

fn default_font_family() -> String {
    "Meiryo".to_string()
}

fn default_figure_width() -> f64 {
    14.0
}

fn default_figure_height() -> f64 {
    6.0
}

fn default_window_colors() -> Vec<String> {
    vec![
        "orange".to_string(),
        "#ff6e00".to_string(),
        "gray".to_string(),
        "#cccccc".to_string(),
    ]
}

fn default_reference_color() -> String {
    "blue".to_string()
}

fn default_bullish_color() -> String {
    "red".to_string()
}

fn default_bearish_color() -> String {
    "blue".to_string()
}

fn default_trailing_stop_color() -> String {
    "red".to_string()
}

fn default_rsi_color() -> String {
    "green".to_string()
}

fn default_marker_size() -> f64 {
    3.0
}

fn default_citation_font_size() -> f64 {
    8.0
}

fn default_rsi_levels() -> Vec<ThresholdLine> {
    vec![
        ThresholdLine::new(90.0, "overbought", "red"),
        ThresholdLine::new(70.0, "slightly overbought", "orange"),
        ThresholdLine::new(30.0, "slightly oversold", "green"),
        ThresholdLine::new(10.0, "oversold", "blue"),
    ]
}

// =============================================================================
// RenderConfig
// =============================================================================

/// Horizontal threshold drawn on the RSI chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLine {
    pub value: f64,
    pub label: String,
    pub color: String,
}

impl ThresholdLine {
    pub fn new(value: f64, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
            color: color.into(),
        }
    }
}

/// Styling for every chart of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Font able to display the (often Japanese) asset names.
    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_figure_width")]
    pub figure_width: f64,

    #[serde(default = "default_figure_height")]
    pub figure_height: f64,

    /// Colours assigned to divergence lines in window order (cycled).
    #[serde(default = "default_window_colors")]
    pub window_colors: Vec<String>,

    #[serde(default = "default_reference_color")]
    pub reference_color: String,

    #[serde(default = "default_bullish_color")]
    pub bullish_color: String,

    #[serde(default = "default_bearish_color")]
    pub bearish_color: String,

    #[serde(default = "default_trailing_stop_color")]
    pub trailing_stop_color: String,

    #[serde(default = "default_rsi_color")]
    pub rsi_color: String,

    #[serde(default = "default_marker_size")]
    pub marker_size: f64,

    #[serde(default = "default_citation_font_size")]
    pub citation_font_size: f64,

    #[serde(default = "default_rsi_levels")]
    pub rsi_levels: Vec<ThresholdLine>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            figure_width: default_figure_width(),
            figure_height: default_figure_height(),
            window_colors: default_window_colors(),
            reference_color: default_reference_color(),
            bullish_color: default_bullish_color(),
            bearish_color: default_bearish_color(),
            trailing_stop_color: default_trailing_stop_color(),
            rsi_color: default_rsi_color(),
            marker_size: default_marker_size(),
            citation_font_size: default_citation_font_size(),
            rsi_levels: default_rsi_levels(),
        }
    }
}

impl RenderConfig {
    fn window_color(&self, index: usize) -> String {
        if self.window_colors.is_empty() {
            return "black".to_string();
        }
        self.window_colors[index % self.window_colors.len()].clone()
    }
}

// =============================================================================
// Chart specification
// =============================================================================

/// Who the data is credited to on the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub name: String,
    pub url: String,
}

impl std::fmt::Display for Citation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Data source: {} ({})", self.name, self.url)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineSpec {
    pub label: String,
    pub color: String,
    pub width: f64,
    /// Index-aligned with `ChartSpec::x`; `None` renders as a gap.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceLine {
    pub value: f64,
    pub label: Option<String>,
    pub color: String,
    pub dashed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub date: NaiveDate,
    pub value: f64,
    pub color: String,
    pub size: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XTick {
    pub date: NaiveDate,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub font_family: String,
    pub width: f64,
    pub height: f64,
    pub x: Vec<NaiveDate>,
    pub lines: Vec<LineSpec>,
    pub reference_lines: Vec<ReferenceLine>,
    pub markers: Vec<Marker>,
    pub x_ticks: Vec<XTick>,
    pub citation: String,
    pub citation_font_size: f64,
}

impl ChartSpec {
    fn new(title: String, y_label: &str, analysis: &Analysis, citation: &Citation, render: &RenderConfig) -> Self {
        Self {
            title,
            x_label: "Date".to_string(),
            y_label: y_label.to_string(),
            font_family: render.font_family.clone(),
            width: render.figure_width,
            height: render.figure_height,
            x: analysis.dates.clone(),
            lines: Vec::new(),
            reference_lines: Vec::new(),
            markers: Vec::new(),
            x_ticks: year_start_ticks(&analysis.dates),
            citation: citation.to_string(),
            citation_font_size: render.citation_font_size,
        }
    }
}

// =============================================================================
// Builders
// =============================================================================

/// One tick on the first trading date of every calendar year, labelled `YYYY`.
pub fn year_start_ticks(dates: &[NaiveDate]) -> Vec<XTick> {
    let mut ticks: Vec<XTick> = Vec::new();
    let mut last_year = None;
    for &date in dates {
        if last_year != Some(date.year()) {
            last_year = Some(date.year());
            ticks.push(XTick {
                date,
                label: format!("{:04}", date.year()),
            });
        }
    }
    ticks
}

/// Divergence chart: one line per window, the reference line(s), crossing
/// markers on the short series and trailing-stop warnings on the reference
/// line.
pub fn divergence_chart(analysis: &Analysis, citation: &Citation, render: &RenderConfig) -> ChartSpec {
    let mut chart = ChartSpec::new(
        format!("{}: price vs moving-average divergence", analysis.name),
        "Divergence",
        analysis,
        citation,
        render,
    );

    // Short windows are drawn bolder than long ones.
    let longest = analysis.windows.iter().map(|w| w.length).max().unwrap_or(0);
    for (i, window) in analysis.windows.iter().enumerate() {
        let label = match window.mode {
            DivergenceMode::Ratio => format!("price / {}-day MA", window.length),
            DivergenceMode::Difference => format!("{}-day MA - price", window.length),
        };
        chart.lines.push(LineSpec {
            label,
            color: render.window_color(i),
            width: if window.length * 2 <= longest { 1.5 } else { 1.0 },
            values: window.divergence.clone(),
        });
    }

    let mut references: Vec<f64> = Vec::new();
    for window in &analysis.windows {
        let r = window.reference();
        if !references.contains(&r) {
            references.push(r);
            chart.reference_lines.push(ReferenceLine {
                value: r,
                label: None,
                color: render.reference_color.clone(),
                dashed: false,
            });
        }
    }

    for crossing in &analysis.crossings {
        let (color, label) = match crossing.direction {
            CrossDirection::Bullish => (&render.bullish_color, "bullish crossing"),
            CrossDirection::Bearish => (&render.bearish_color, "bearish crossing"),
        };
        chart.markers.push(Marker {
            date: crossing.date,
            value: crossing.short,
            color: color.clone(),
            size: render.marker_size,
            label: label.to_string(),
        });
    }

    if let Some(stop) = &analysis.trailing_stop {
        let reference = analysis
            .window(&stop.window)
            .map(|w| w.reference())
            .unwrap_or_default();
        for breach in &analysis.trailing_stop_breaches {
            chart.markers.push(Marker {
                date: breach.date,
                value: reference,
                color: render.trailing_stop_color.clone(),
                size: render.marker_size,
                label: "trailing-stop warning".to_string(),
            });
        }
    }

    chart
}

/// RSI chart: the oscillator line plus the configured threshold lines.
pub fn rsi_chart(analysis: &Analysis, citation: &Citation, render: &RenderConfig) -> ChartSpec {
    let mut chart = ChartSpec::new(
        format!("{}: relative strength index", analysis.name),
        "RSI",
        analysis,
        citation,
        render,
    );

    chart.lines.push(LineSpec {
        label: format!("RSI {}-day", analysis.rsi.window),
        color: render.rsi_color.clone(),
        width: 1.0,
        values: analysis.rsi.values.clone(),
    });

    chart.reference_lines = render
        .rsi_levels
        .iter()
        .map(|level| ReferenceLine {
            value: level.value,
            label: Some(level.label.clone()),
            color: level.color.clone(),
            dashed: true,
        })
        .collect();

    chart
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::analyze;
    use crate::runtime_config::{AnalysisConfig, CrossingPair, TrailingStopConfig, WindowConfig};
    use crate::types::{PricePoint, PriceSeries};

    fn citation() -> Citation {
        Citation {
            name: "Test Fund".into(),
            url: "https://example.com/fund".into(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_analysis(mode: DivergenceMode) -> Analysis {
        let points = [100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 104.8, 104.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(date(2023, 12, 25) + chrono::Days::new(i as u64), p))
            .collect();
        let series = PriceSeries::new("Sample", points).unwrap();
        let config = AnalysisConfig {
            windows: vec![WindowConfig::new("S", 2, mode), WindowConfig::new("L", 4, mode)],
            rsi_window: 3,
            crossing_pair: Some(CrossingPair {
                short: "S".into(),
                long: "L".into(),
            }),
            trailing_stop: Some(TrailingStopConfig {
                window: "L".into(),
                percentage: 3.0,
            }),
        };
        analyze(&series, &config).unwrap()
    }

    #[test]
    fn year_ticks_pick_first_trading_day() {
        let dates = vec![date(2019, 12, 30), date(2020, 1, 3), date(2020, 1, 6), date(2021, 1, 4)];
        let ticks = year_start_ticks(&dates);
        assert_eq!(
            ticks,
            vec![
                XTick { date: date(2019, 12, 30), label: "2019".into() },
                XTick { date: date(2020, 1, 3), label: "2020".into() },
                XTick { date: date(2021, 1, 4), label: "2021".into() },
            ]
        );
        assert!(year_start_ticks(&[]).is_empty());
    }

    #[test]
    fn citation_text() {
        assert_eq!(citation().to_string(), "Data source: Test Fund (https://example.com/fund)");
    }

    #[test]
    fn divergence_chart_ratio_mode() {
        let analysis = sample_analysis(DivergenceMode::Ratio);
        let render = RenderConfig::default();
        let chart = divergence_chart(&analysis, &citation(), &render);

        assert_eq!(chart.lines.len(), 2);
        assert_eq!(chart.lines[0].label, "price / 2-day MA");
        assert_eq!(chart.lines[0].color, "orange");
        assert_eq!(chart.lines[0].values.len(), analysis.dates.len());
        assert_eq!(chart.reference_lines.len(), 1);
        assert_eq!(chart.reference_lines[0].value, 1.0);
        assert_eq!(chart.x_ticks.len(), 2);
        assert_eq!(chart.font_family, "Meiryo");
        assert!(chart.citation.contains("Test Fund"));

        let crossing_markers: Vec<&Marker> =
            chart.markers.iter().filter(|m| m.label.ends_with("crossing")).collect();
        assert_eq!(crossing_markers.len(), analysis.crossings.len());
        assert!(!crossing_markers.is_empty());
        assert_eq!(crossing_markers[0].color, "blue");

        let stop_markers: Vec<&Marker> = chart
            .markers
            .iter()
            .filter(|m| m.label == "trailing-stop warning")
            .collect();
        assert_eq!(stop_markers.len(), analysis.trailing_stop_breaches.len());
        assert!(stop_markers.iter().all(|m| m.value == 1.0));
    }

    #[test]
    fn divergence_chart_difference_mode_reference_is_zero() {
        let analysis = sample_analysis(DivergenceMode::Difference);
        let chart = divergence_chart(&analysis, &citation(), &RenderConfig::default());
        assert_eq!(chart.lines[1].label, "4-day MA - price");
        assert_eq!(chart.reference_lines.len(), 1);
        assert_eq!(chart.reference_lines[0].value, 0.0);
    }

    #[test]
    fn rsi_chart_has_threshold_lines() {
        let analysis = sample_analysis(DivergenceMode::Ratio);
        let chart = rsi_chart(&analysis, &citation(), &RenderConfig::default());
        assert_eq!(chart.lines.len(), 1);
        assert_eq!(chart.lines[0].label, "RSI 3-day");
        let levels: Vec<f64> = chart.reference_lines.iter().map(|r| r.value).collect();
        assert_eq!(levels, vec![90.0, 70.0, 30.0, 10.0]);
        assert!(chart.reference_lines.iter().all(|r| r.dashed));
    }

    #[test]
    fn window_colors_cycle() {
        let render = RenderConfig {
            window_colors: vec!["a".into(), "b".into()],
            ..RenderConfig::default()
        };
        assert_eq!(render.window_color(0), "a");
        assert_eq!(render.window_color(3), "b");
        let empty = RenderConfig {
            window_colors: Vec::new(),
            ..RenderConfig::default()
        };
        assert_eq!(empty.window_color(5), "black");
    }

    #[test]
    fn chart_serialises_undefined_points_as_null() {
        let analysis = sample_analysis(DivergenceMode::Ratio);
        let chart = divergence_chart(&analysis, &citation(), &RenderConfig::default());
        let json = serde_json::to_value(&chart).unwrap();
        assert!(json["lines"][1]["values"][0].is_null());
        assert_eq!(json["x"][0], "2023-12-25");
    }
}
