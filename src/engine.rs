// =============================================================================
// Indicator Engine — price series in, enriched series and signals out
// =============================================================================
//
// Stateless, synchronous transformation of one validated price series.
//
// Pipeline:
//   1. Validate the analysis config (windows, labels, RSI window, band)
//   2. Moving average per configured window
//   3. Divergence per window (ratio or difference)
//   4. RSI
//   5. Crossings of the configured short/long divergence pair, centred on the
//      pair's reference line
//   6. Trailing-stop warning band on the configured window
//
// Nothing is cached between calls; every invocation recomputes everything.
// =============================================================================

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::AnalysisError;
use crate::indicators::{
    calculate_rsi, current_rsi, detect_crossings, detect_trailing_stop, divergence,
    moving_averages, CrossingPoint, TrailingStopBreach,
};
use crate::runtime_config::{AnalysisConfig, CrossingPair, TrailingStopConfig};
use crate::types::{DivergenceMode, PriceSeries};

// =============================================================================
// Output types
// =============================================================================

/// Moving average and divergence derived for one window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowSeries {
    pub label: String,
    pub length: usize,
    pub mode: DivergenceMode,
    pub moving_average: Vec<Option<f64>>,
    pub divergence: Vec<Option<f64>>,
}

impl WindowSeries {
    /// Reference line of this window's divergence.
    pub fn reference(&self) -> f64 {
        self.mode.reference()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RsiSeries {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

/// Full result of one engine run.  Every series is index-aligned with
/// `dates`.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub name: String,
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
    pub windows: Vec<WindowSeries>,
    pub rsi: RsiSeries,
    pub crossing_pair: Option<CrossingPair>,
    pub crossings: Vec<CrossingPoint>,
    pub trailing_stop: Option<TrailingStopConfig>,
    pub trailing_stop_breaches: Vec<TrailingStopBreach>,
}

impl Analysis {
    pub fn window(&self, label: &str) -> Option<&WindowSeries> {
        self.windows.iter().find(|w| w.label == label)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Run the full indicator pipeline over `series`.
///
/// Fails only on an invalid `config`; short or empty series yield undefined
/// indicator values instead of errors.
pub fn analyze(series: &PriceSeries, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    // ── 1. Config ────────────────────────────────────────────────────────
    validate(config)?;

    let dates = series.dates();
    let prices = series.prices();

    // ── 2-3. Moving averages and divergences ─────────────────────────────
    let averages = moving_averages(
        &prices,
        config.windows.iter().map(|w| (w.label.as_str(), w.length)),
    );
    let windows: Vec<WindowSeries> = config
        .windows
        .iter()
        .zip(averages)
        .map(|(w, (_, moving_average))| {
            let divergence = divergence(&prices, &moving_average, w.mode);
            debug!(
                window = %w.label,
                length = w.length,
                mode = %w.mode,
                defined = moving_average.iter().filter(|v| v.is_some()).count(),
                "moving average computed"
            );
            WindowSeries {
                label: w.label.clone(),
                length: w.length,
                mode: w.mode,
                moving_average,
                divergence,
            }
        })
        .collect();

    // ── 4. RSI ───────────────────────────────────────────────────────────
    let rsi = RsiSeries {
        window: config.rsi_window,
        values: calculate_rsi(&prices, config.rsi_window),
    };

    // ── 5. Crossings ─────────────────────────────────────────────────────
    let crossings = match &config.crossing_pair {
        Some(pair) => {
            let short = find_window(&windows, &pair.short)?;
            let long = find_window(&windows, &pair.long)?;
            detect_crossings(&dates, &short.divergence, &long.divergence, short.reference())
        }
        None => Vec::new(),
    };
    for c in &crossings {
        debug!(date = %c.date, direction = %c.direction, "divergence crossing");
    }

    // ── 6. Trailing stop ─────────────────────────────────────────────────
    let trailing_stop_breaches = match &config.trailing_stop {
        Some(stop) => {
            let window = find_window(&windows, &stop.window)?;
            detect_trailing_stop(&dates, &prices, &window.moving_average, stop.percentage)
        }
        None => Vec::new(),
    };

    let last_rsi = current_rsi(&rsi.values);
    info!(
        series = series.name(),
        points = prices.len(),
        windows = windows.len(),
        crossings = crossings.len(),
        trailing_stop_warnings = trailing_stop_breaches.len(),
        rsi = ?last_rsi.map(|(v, _)| v),
        rsi_zone = %last_rsi.map(|(_, z)| z.to_string()).unwrap_or_else(|| "UNDEFINED".into()),
        "analysis complete"
    );

    Ok(Analysis {
        name: series.name().to_string(),
        dates,
        prices,
        windows,
        rsi,
        crossing_pair: config.crossing_pair.clone(),
        crossings,
        trailing_stop: config.trailing_stop.clone(),
        trailing_stop_breaches,
    })
}

fn find_window<'a>(windows: &'a [WindowSeries], label: &str) -> Result<&'a WindowSeries, AnalysisError> {
    windows
        .iter()
        .find(|w| w.label == label)
        .ok_or_else(|| AnalysisError::UnknownWindow(label.to_string()))
}

/// Reject configurations the engine cannot run.
pub fn validate(config: &AnalysisConfig) -> Result<(), AnalysisError> {
    if config.windows.is_empty() {
        return Err(AnalysisError::invalid_config("at least one window is required"));
    }

    let mut labels = HashSet::new();
    for w in &config.windows {
        if w.label.trim().is_empty() {
            return Err(AnalysisError::invalid_config("window label must not be empty"));
        }
        if w.length == 0 {
            return Err(AnalysisError::invalid_config(format!(
                "window {} has length 0",
                w.label
            )));
        }
        if !labels.insert(w.label.as_str()) {
            return Err(AnalysisError::invalid_config(format!(
                "duplicate window label {}",
                w.label
            )));
        }
    }

    if config.rsi_window == 0 {
        return Err(AnalysisError::invalid_config("rsi_window must be at least 1"));
    }

    let mode_of = |label: &str| {
        config
            .windows
            .iter()
            .find(|w| w.label == label)
            .map(|w| w.mode)
            .ok_or_else(|| AnalysisError::UnknownWindow(label.to_string()))
    };

    if let Some(pair) = &config.crossing_pair {
        let short = mode_of(&pair.short)?;
        let long = mode_of(&pair.long)?;
        if short != long {
            return Err(AnalysisError::MismatchedCrossingModes {
                short: pair.short.clone(),
                long: pair.long.clone(),
            });
        }
    }

    if let Some(stop) = &config.trailing_stop {
        mode_of(&stop.window)?;
        if !stop.percentage.is_finite() || stop.percentage < 0.0 {
            return Err(AnalysisError::invalid_config(format!(
                "trailing stop percentage {} must be a non-negative number",
                stop.percentage
            )));
        }
    }

    Ok(())
}
