// =============================================================================
// Yahoo Finance Chart API Client — daily bars over a trailing window
// =============================================================================
//
// GET /v8/finance/chart/{ticker}?period1=..&period2=..&interval=1d
//
// Response shape (trimmed):
//   { "chart": { "result": [ {
//       "meta": { "symbol": "^GSPC", "gmtoffset": -14400, ... },
//       "timestamp": [ ... unix seconds ... ],
//       "indicators": { "quote": [ { "close": [ 4742.83, null, ... ] } ] }
//     } ], "error": null } }
//
// Closes may be `null` on days the exchange was closed; those bars are
// skipped.  Timestamps are shifted by `gmtoffset` so each bar lands on its
// exchange-local trading date.
// =============================================================================

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::types::{PricePoint, PriceSeries};

const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Average year length used to turn "N years back" into a start date.
const DAYS_PER_YEAR: f64 = 365.25;

// -----------------------------------------------------------------------------
// Wire types
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// -----------------------------------------------------------------------------
// Pure helpers
// -----------------------------------------------------------------------------

/// `(start, end)` of a window reaching `years` back from `end`.
pub fn trailing_window(end: DateTime<Utc>, years: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let seconds = (DAYS_PER_YEAR * f64::from(years) * 86_400.0) as i64;
    (end - Duration::seconds(seconds), end)
}

/// Parse a chart API response body into a price series called `name`.
pub fn parse_chart(body: &str, name: &str) -> Result<PriceSeries> {
    let response: ChartResponse =
        serde_json::from_str(body).context("failed to parse chart response")?;

    if let Some(err) = response.chart.error {
        bail!("chart API error {}: {}", err.code, err.description);
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .context("chart response has no result")?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        bail!(
            "chart response has {} timestamps but {} closes",
            result.timestamp.len(),
            closes.len()
        );
    }

    let mut points: Vec<PricePoint> = Vec::with_capacity(closes.len());
    let mut skipped = 0usize;
    for (&ts, close) in result.timestamp.iter().zip(closes) {
        let Some(close) = close else {
            skipped += 1;
            continue;
        };
        let date = DateTime::<Utc>::from_timestamp(ts + result.meta.gmtoffset, 0)
            .with_context(|| format!("timestamp {ts} out of range"))?
            .date_naive();

        // A still-open session can repeat the last trading date; keep the
        // most recent bar.
        match points.last_mut() {
            Some(last) if last.date == date => last.price = close,
            _ => points.push(PricePoint::new(date, close)),
        }
    }

    debug!(
        symbol = %result.meta.symbol,
        bars = points.len(),
        skipped,
        "chart response parsed"
    );

    PriceSeries::new(name, points).context("chart bars do not form a valid price series")
}

// -----------------------------------------------------------------------------
// Client
// -----------------------------------------------------------------------------

/// Read-only Yahoo Finance chart client.
#[derive(Debug, Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Public quote page cited on charts.
    pub fn quote_url(ticker: &str) -> String {
        format!("https://finance.yahoo.com/quote/{ticker}")
    }

    /// Daily closes for `ticker` over the last `years` years.
    #[instrument(skip(self), name = "yahoo::fetch_daily")]
    pub async fn fetch_daily(&self, ticker: &str, name: &str, years: u32) -> Result<PriceSeries> {
        let (start, end) = trailing_window(Utc::now(), years);
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            ticker.replace('^', "%5E")
        );

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .context("GET /v8/finance/chart request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("failed to read chart response")?;

        if !status.is_success() {
            bail!("Yahoo GET /v8/finance/chart returned {}: {}", status, body);
        }

        let series = parse_chart(&body, name)?;
        info!(
            ticker,
            start = %start.date_naive(),
            end = %end.date_naive(),
            points = series.len(),
            "daily bars fetched"
        );
        Ok(series)
    }
}
