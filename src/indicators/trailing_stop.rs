// =============================================================================
// Trailing-Stop Warning Band
// =============================================================================
//
// Flags every date where price has dropped into the band just above a moving
// average without breaking below it:
//
//   MA < price <= MA * (1 + pct / 100)
//
// This is a visual warning only; nothing is executed.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observation inside the warning band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStopBreach {
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub moving_average: f64,
}

/// Report every index where `price` sits within `percentage` percent above
/// `moving_average`.  Undefined averages are skipped.
pub fn detect_trailing_stop(
    dates: &[NaiveDate],
    prices: &[f64],
    moving_average: &[Option<f64>],
    percentage: f64,
) -> Vec<TrailingStopBreach> {
    let factor = 1.0 + percentage / 100.0;

    dates
        .iter()
        .zip(prices.iter())
        .zip(moving_average.iter())
        .enumerate()
        .filter_map(|(index, ((&date, &price), ma))| {
            let ma = (*ma)?;
            (price > ma && price <= ma * factor).then_some(TrailingStopBreach {
                index,
                date,
                price,
                moving_average: ma,
            })
        })
        .collect()
}
