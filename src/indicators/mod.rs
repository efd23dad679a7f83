// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator and signal computations over a price
// series.  Every derived series is index-aligned with its input and uses
// `Option<f64>` for points that lack enough history, so callers never see a
// fabricated zero.

pub mod crossing;
pub mod divergence;
pub mod moving_average;
pub mod rsi;
pub mod trailing_stop;

pub use crossing::{detect_crossings, CrossingPoint};
pub use divergence::divergence;
pub use moving_average::moving_averages;
pub use rsi::{calculate_rsi, current_rsi};
pub use trailing_stop::{detect_trailing_stop, TrailingStopBreach};
