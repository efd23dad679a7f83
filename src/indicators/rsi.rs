// =============================================================================
// Relative Strength Index (RSI) — simple rolling averages
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an instrument is overbought or oversold.
//
// Step 1 — Compute day-over-day price changes (deltas).
// Step 2 — Split into gains (positive deltas, else 0) and losses (absolute
//          negative deltas, else 0).
// Step 3 — Take the trailing `window`-period simple mean of each.
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Reference levels drawn on the chart: 90 / 70 / 30 / 10.
// =============================================================================

/// Compute the RSI series for `prices` over `window` price changes.
///
/// The output is index-aligned with `prices`.  Index `i` needs the `window`
/// changes ending at `i`, so the first `window` entries are `None`.
///
/// # Edge cases
/// - `window == 0` or `prices.len() <= window` => every entry is `None`
/// - average loss zero with gains => 100.0
/// - no movement at all (0 / 0) => `None`
pub fn calculate_rsi(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; prices.len()];
    if window == 0 || prices.len() <= window {
        return result;
    }

    // --- Split deltas into gains and losses ----------------------------------
    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            if delta > 0.0 {
                (delta, 0.0)
            } else {
                (0.0, delta.abs())
            }
        })
        .unzip();

    // --- Trailing simple averages --------------------------------------------
    // gains[j] is the change into price index j + 1.
    let window_f = window as f64;
    for (offset, (gain_slice, loss_slice)) in gains
        .windows(window)
        .zip(losses.windows(window))
        .enumerate()
    {
        let avg_gain = gain_slice.iter().sum::<f64>() / window_f;
        let avg_loss = loss_slice.iter().sum::<f64>() / window_f;
        result[offset + window] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

/// Qualitative band of an RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Elevated,
    Neutral,
    Depressed,
    Oversold,
}

impl RsiZone {
    pub fn classify(value: f64) -> Self {
        if value >= 90.0 {
            Self::Overbought
        } else if value >= 70.0 {
            Self::Elevated
        } else if value <= 10.0 {
            Self::Oversold
        } else if value <= 30.0 {
            Self::Depressed
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "OVERBOUGHT"),
            Self::Elevated => write!(f, "ELEVATED"),
            Self::Neutral => write!(f, "NEUTRAL"),
            Self::Depressed => write!(f, "DEPRESSED"),
            Self::Oversold => write!(f, "OVERSOLD"),
        }
    }
}

/// Most recent defined RSI value together with its zone.
pub fn current_rsi(series: &[Option<f64>]) -> Option<(f64, RsiZone)> {
    let value = series.iter().rev().find_map(|v| *v)?;
    Some((value, RsiZone::classify(value)))
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        return None; // No movement at all — RS is 0/0.
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then(|| rsi.clamp(0.0, 100.0))
}
