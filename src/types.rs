// =============================================================================
// Shared types used across the fundscope analysis pipeline
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// One trading day of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Validated, date-ordered price history of a single instrument.
///
/// Construction goes through [`PriceSeries::new`], which rejects duplicate or
/// decreasing dates and non-positive prices.  The points are read-only
/// afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    name: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(name: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, AnalysisError> {
        for (index, point) in points.iter().enumerate() {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(AnalysisError::InvalidPrice {
                    index,
                    date: point.date,
                    price: point.price,
                });
            }
            if index > 0 {
                let previous = points[index - 1].date;
                if point.date <= previous {
                    return Err(AnalysisError::NonMonotonicDate {
                        index,
                        date: point.date,
                        previous,
                    });
                }
            }
        }

        Ok(Self {
            name: name.into(),
            points,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }
}

/// How a price's deviation from a moving average is expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceMode {
    /// `price / moving_average`, centred on 1.0.
    #[default]
    Ratio,
    /// `moving_average - price`, centred on 0.0.
    Difference,
}

impl DivergenceMode {
    /// Value of the reference line the divergence oscillates around.
    pub fn reference(self) -> f64 {
        match self {
            Self::Ratio => 1.0,
            Self::Difference => 0.0,
        }
    }
}

impl std::fmt::Display for DivergenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ratio => write!(f, "ratio"),
            Self::Difference => write!(f, "difference"),
        }
    }
}

/// Direction of a short/long divergence crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossDirection {
    /// Short-window series above the reference line, long-window below.
    Bullish,
    /// Short-window series below the reference line, long-window above.
    Bearish,
}

impl std::fmt::Display for CrossDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "BULLISH"),
            Self::Bearish => write!(f, "BEARISH"),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a series on consecutive calendar days starting 2024-01-01.
    pub fn daily_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(start + chrono::Days::new(i as u64), p))
            .collect();
        PriceSeries::new("TEST", points).unwrap()
    }
}
