// =============================================================================
// Market Data — price-series collaborators feeding the indicator engine
// =============================================================================

pub mod fund_csv;
pub mod yahoo;

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::instrument;

use crate::chart::Citation;
use crate::runtime_config::{SourceConfig, SourceKind};
use crate::types::PriceSeries;

pub use fund_csv::FundCsvClient;
pub use yahoo::YahooClient;

const USER_AGENT: &str = concat!("fundscope/", env!("CARGO_PKG_VERSION"));

/// A downloaded series together with the attribution shown on its charts.
#[derive(Debug, Clone)]
pub struct FetchedSeries {
    pub series: PriceSeries,
    pub citation: Citation,
}

/// Build the shared HTTP client used by every source.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

/// Fetch the price series described by `source`.
#[instrument(skip(client, source), fields(source = %source.name))]
pub async fn fetch_source(client: &reqwest::Client, source: &SourceConfig) -> Result<FetchedSeries> {
    match &source.kind {
        SourceKind::FundCsv {
            csv_url,
            web_url,
            layout,
        } => {
            let series = FundCsvClient::new(client.clone())
                .fetch(csv_url, layout)
                .await
                .with_context(|| format!("failed to load fund CSV for {}", source.name))?;
            let citation = Citation {
                name: series.name().to_string(),
                url: web_url.clone(),
            };
            Ok(FetchedSeries { series, citation })
        }
        SourceKind::Yahoo { ticker, years } => {
            let series = YahooClient::new(client.clone())
                .fetch_daily(ticker, &source.name, *years)
                .await
                .with_context(|| format!("failed to load {ticker} from Yahoo Finance"))?;
            let citation = Citation {
                name: "Yahoo! Finance API".to_string(),
                url: YahooClient::quote_url(ticker),
            };
            Ok(FetchedSeries { series, citation })
        }
    }
}
