//! Error types raised by the indicator engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Validation failures for price series and analysis configuration.
///
/// Insufficient history is not represented here: short series simply yield
/// undefined (`None`) indicator values.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Dates must be strictly increasing.
    #[error("date {date} at index {index} does not follow previous date {previous}")]
    NonMonotonicDate {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    /// Prices must be finite and positive.
    #[error("invalid price {price} at index {index} ({date})")]
    InvalidPrice {
        index: usize,
        date: NaiveDate,
        price: f64,
    },

    /// Structurally invalid analysis configuration.
    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),

    /// A window label referenced by the crossing pair or trailing stop does
    /// not exist in the window list.
    #[error("unknown moving-average window: {0}")]
    UnknownWindow(String),

    /// Crossing detection needs both divergence series around the same
    /// reference line.
    #[error("crossing pair {short}/{long} mixes divergence modes")]
    MismatchedCrossingModes { short: String, long: String },
}

impl AnalysisError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidConfig(msg.into())
    }
}
