// =============================================================================
// Short / Long Divergence Crossing Detection
// =============================================================================
//
// Two divergence series "straddle" the reference line at an observation when
// one sits above it and the other below:
//
//   (short - center) * (long - center) < 0
//
//   short above, long below  => BULLISH
//   short below, long above  => BEARISH
//
// The center is an explicit argument: 0.0 for difference-mode series, 1.0 for
// ratio-mode series.  Testing the raw product of ratio values against zero
// never fires, because ratios are always positive.
//
// Consecutive observations are compared pairwise.  A crossing is reported on
// the later date of every fully defined pair whose later date straddles, so a
// straddle lasting several days marks each of those days.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::CrossDirection;

/// A detected crossing of the short- and long-window divergence series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingPoint {
    pub index: usize,
    pub date: NaiveDate,
    pub direction: CrossDirection,
    /// Short-window divergence value at `date` (used to place the marker).
    pub short: f64,
    /// Long-window divergence value at `date`.
    pub long: f64,
}

/// Scan the aligned `short`/`long` divergence series for crossings around
/// `center`.
///
/// Pairs where any of the four values is undefined are skipped, and the first
/// observation never produces an event because it has no predecessor.
pub fn detect_crossings(
    dates: &[NaiveDate],
    short: &[Option<f64>],
    long: &[Option<f64>],
    center: f64,
) -> Vec<CrossingPoint> {
    let len = dates.len().min(short.len()).min(long.len());
    let mut crossings = Vec::new();

    for i in 1..len {
        let (Some(_), Some(_), Some(cur_short), Some(cur_long)) =
            (short[i - 1], long[i - 1], short[i], long[i])
        else {
            continue;
        };

        let Some(direction) = straddle(cur_short, cur_long, center) else {
            continue;
        };

        crossings.push(CrossingPoint {
            index: i,
            date: dates[i],
            direction,
            short: cur_short,
            long: cur_long,
        });
    }

    crossings
}

/// Straddle state of a single observation, `None` when both values sit on the
/// same side of `center` (or either touches it).
fn straddle(short: f64, long: f64, center: f64) -> Option<CrossDirection> {
    let s = short - center;
    let l = long - center;
    if s * l >= 0.0 {
        return None;
    }
    if s > 0.0 {
        Some(CrossDirection::Bullish)
    } else {
        Some(CrossDirection::Bearish)
    }
}
