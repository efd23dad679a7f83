// =============================================================================
// Runtime Configuration — data sources, analysis profiles, rendering
// =============================================================================
//
// Every tunable parameter of a run lives here: which price series to fetch,
// which moving-average windows and oscillators to derive from them, and how
// the resulting charts should be styled.
//
// All fields carry `#[serde(default)]` so a partial JSON file (or none at all)
// still produces a complete configuration.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chart::RenderConfig;
use crate::market_data::fund_csv::FundCsvLayout;
use crate::types::DivergenceMode;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_rsi_window() -> usize {
    30
}

fn default_years() -> u32 {
    10
}

fn default_windows() -> Vec<WindowConfig> {
    vec![
        WindowConfig::new("SMA_1", 20, DivergenceMode::Ratio),
        WindowConfig::new("SMA_2", 50, DivergenceMode::Ratio),
        WindowConfig::new("LMA_1", 100, DivergenceMode::Ratio),
        WindowConfig::new("LMA_2", 365, DivergenceMode::Ratio),
    ]
}

fn default_crossing_pair() -> Option<CrossingPair> {
    Some(CrossingPair {
        short: "SMA_1".to_string(),
        long: "LMA_1".to_string(),
    })
}

fn default_trailing_stop() -> Option<TrailingStopConfig> {
    Some(TrailingStopConfig {
        window: "SMA_2".to_string(),
        percentage: 3.0,
    })
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "emaxis-slim-sp500".to_string(),
            kind: SourceKind::FundCsv {
                csv_url: "https://www.am.mufg.jp/fund_file/setteirai/253266.csv".to_string(),
                web_url: "https://emaxis.am.mufg.jp/fund/253266.html".to_string(),
                layout: FundCsvLayout::default(),
            },
            analysis: None,
        },
        SourceConfig {
            name: "S&P 500".to_string(),
            kind: SourceKind::Yahoo {
                ticker: "^GSPC".to_string(),
                years: default_years(),
            },
            analysis: None,
        },
    ]
}

// =============================================================================
// AnalysisConfig
// =============================================================================

/// One moving-average window and how its divergence is expressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Display / lookup label, e.g. "SMA_1".
    pub label: String,

    /// Number of trailing observations averaged.
    pub length: usize,

    /// Ratio (price / MA) or difference (MA - price).
    #[serde(default)]
    pub mode: DivergenceMode,
}

impl WindowConfig {
    pub fn new(label: impl Into<String>, length: usize, mode: DivergenceMode) -> Self {
        Self {
            label: label.into(),
            length,
            mode,
        }
    }
}

/// Labels of the short and long windows whose divergences are compared for
/// crossings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingPair {
    pub short: String,
    pub long: String,
}

/// Warning band above a chosen moving average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStopConfig {
    /// Label of the moving-average window the band sits on.
    pub window: String,

    /// Band height as a percentage of the average (3.0 means 3 %).
    pub percentage: f64,
}

/// Indicator-engine parameters for one price series.
///
/// The default is the fund profile: ratio divergence over 20/50/100/365 days,
/// a 30-day RSI, SMA_1/LMA_1 crossings and a 3 % band on SMA_2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Ordered moving-average windows.
    #[serde(default = "default_windows")]
    pub windows: Vec<WindowConfig>,

    /// Number of price changes averaged by the RSI.
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,

    /// Windows compared for crossings; `null` disables detection.
    #[serde(default = "default_crossing_pair")]
    pub crossing_pair: Option<CrossingPair>,

    /// Trailing-stop warning band; `null` disables detection.
    #[serde(default = "default_trailing_stop")]
    pub trailing_stop: Option<TrailingStopConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            windows: default_windows(),
            rsi_window: default_rsi_window(),
            crossing_pair: default_crossing_pair(),
            trailing_stop: default_trailing_stop(),
        }
    }
}

impl AnalysisConfig {
    /// Index profile: difference divergence over 20/50/100/200 days and a
    /// 14-day RSI.
    pub fn difference_profile() -> Self {
        Self {
            windows: vec![
                WindowConfig::new("SMA_1", 20, DivergenceMode::Difference),
                WindowConfig::new("SMA_2", 50, DivergenceMode::Difference),
                WindowConfig::new("LMA_1", 100, DivergenceMode::Difference),
                WindowConfig::new("LMA_2", 200, DivergenceMode::Difference),
            ],
            rsi_window: 14,
            ..Self::default()
        }
    }
}

// =============================================================================
// SourceConfig
// =============================================================================

/// Where a price series comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// Fund CSV download (cp932, asset-name line, header line, rows).
    FundCsv {
        csv_url: String,
        /// Fund page cited on the charts.
        web_url: String,
        #[serde(default)]
        layout: FundCsvLayout,
    },
    /// Yahoo Finance daily bars over a trailing window.
    Yahoo {
        ticker: String,
        #[serde(default = "default_years")]
        years: u32,
    },
}

impl SourceKind {
    pub fn default_analysis(&self) -> AnalysisConfig {
        match self {
            Self::FundCsv { .. } => AnalysisConfig::default(),
            Self::Yahoo { .. } => AnalysisConfig::difference_profile(),
        }
    }
}

/// A named price source together with an optional analysis override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,

    #[serde(flatten)]
    pub kind: SourceKind,

    /// Falls back to the source kind's profile when absent.
    #[serde(default)]
    pub analysis: Option<AnalysisConfig>,
}

impl SourceConfig {
    pub fn analysis(&self) -> AnalysisConfig {
        self.analysis
            .clone()
            .unwrap_or_else(|| self.kind.default_analysis())
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for a fundscope run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Price sources analysed in order.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,

    /// Timeout applied to every HTTP request.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Chart styling handed to the chart builder.
    #[serde(default)]
    pub render: RenderConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            http_timeout_secs: default_http_timeout_secs(),
            render: RenderConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            sources = config.sources.len(),
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Keep only the sources whose names appear in `names`.
    pub fn retain_sources(&mut self, names: &[String]) {
        self.sources.retain(|s| names.iter().any(|n| n == &s.name));
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.http_timeout_secs, 30);
        assert!(matches!(cfg.sources[0].kind, SourceKind::FundCsv { .. }));
        assert!(matches!(cfg.sources[1].kind, SourceKind::Yahoo { years: 10, .. }));
    }

    #[test]
    fn fund_profile_defaults() {
        let a = AnalysisConfig::default();
        let lengths: Vec<usize> = a.windows.iter().map(|w| w.length).collect();
        assert_eq!(lengths, vec![20, 50, 100, 365]);
        assert!(a.windows.iter().all(|w| w.mode == DivergenceMode::Ratio));
        assert_eq!(a.rsi_window, 30);
        let stop = a.trailing_stop.unwrap();
        assert_eq!(stop.window, "SMA_2");
        assert!((stop.percentage - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn difference_profile_defaults() {
        let a = AnalysisConfig::difference_profile();
        let lengths: Vec<usize> = a.windows.iter().map(|w| w.length).collect();
        assert_eq!(lengths, vec![20, 50, 100, 200]);
        assert!(a.windows.iter().all(|w| w.mode == DivergenceMode::Difference));
        assert_eq!(a.rsi_window, 14);
        assert_eq!(a.crossing_pair.unwrap().long, "LMA_1");
    }

    #[test]
    fn source_kind_selects_profile() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.sources[0].analysis().rsi_window, 30);
        assert_eq!(cfg.sources[1].analysis().rsi_window, 14);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.http_timeout_secs, 30);
        assert_eq!(cfg.render, RenderConfig::default());
    }

    #[test]
    fn deserialise_partial_source_fills_defaults() {
        let json = r#"{
            "sources": [
                { "name": "nikkei", "type": "yahoo", "ticker": "^N225" },
                {
                    "name": "fund",
                    "type": "fund_csv",
                    "csv_url": "https://example.com/fund.csv",
                    "web_url": "https://example.com/fund.html",
                    "analysis": { "rsi_window": 14, "crossing_pair": null }
                }
            ]
        }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.sources.len(), 2);
        match &cfg.sources[0].kind {
            SourceKind::Yahoo { ticker, years } => {
                assert_eq!(ticker, "^N225");
                assert_eq!(*years, 10);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
        let analysis = cfg.sources[1].analysis();
        assert_eq!(analysis.rsi_window, 14);
        assert!(analysis.crossing_pair.is_none());
        assert_eq!(analysis.windows.len(), 4);
        assert!(analysis.trailing_stop.is_some());
    }

    #[test]
    fn window_mode_defaults_to_ratio() {
        let w: WindowConfig = serde_json::from_str(r#"{ "label": "A", "length": 5 }"#).unwrap();
        assert_eq!(w.mode, DivergenceMode::Ratio);
        let w: WindowConfig =
            serde_json::from_str(r#"{ "label": "A", "length": 5, "mode": "difference" }"#).unwrap();
        assert_eq!(w.mode, DivergenceMode::Difference);
    }

    #[test]
    fn retain_sources_filters_by_name() {
        let mut cfg = RuntimeConfig::default();
        cfg.retain_sources(&["S&P 500".to_string()]);
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.sources[0].name, "S&P 500");
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = RuntimeConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.sources, cfg2.sources);
        assert_eq!(cfg.http_timeout_secs, cfg2.http_timeout_secs);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(RuntimeConfig::load("/nonexistent/fundscope.json").is_err());
    }
}
