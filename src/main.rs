// =============================================================================
// fundscope — Main Entry Point
// =============================================================================
//
// Fetches every configured price source, runs the indicator engine over it and
// prints the analyses plus their chart descriptions as one JSON document on
// stdout.  Logs go to stderr.
//
// Any failure aborts the run before anything is printed, so a consumer never
// sees a partial set of charts.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod chart;
mod engine;
mod error;
mod indicators;
mod market_data;
mod runtime_config;
mod types;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::chart::{ChartSpec, RenderConfig};
use crate::engine::Analysis;
use crate::runtime_config::{RuntimeConfig, SourceConfig};

const DEFAULT_CONFIG_PATH: &str = "fundscope.json";

/// Everything produced for one source.
#[derive(Debug, Serialize)]
struct SourceReport {
    source: String,
    citation: chart::Citation,
    analysis: Analysis,
    charts: Vec<ChartSpec>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path =
        std::env::var("FUNDSCOPE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, path = %config_path, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Restrict to a subset of sources from env if requested.
    if let Ok(names) = std::env::var("FUNDSCOPE_SOURCES") {
        let names: Vec<String> = names
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        config.retain_sources(&names);
    }
    if config.sources.is_empty() {
        bail!("no price sources configured");
    }

    info!(
        sources = ?config.sources.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "Configured price sources"
    );

    // ── 2. Fetch + analyze every source ──────────────────────────────────
    let client = market_data::build_http_client(config.http_timeout_secs)?;

    let mut reports = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        match run_source(&client, source, &config.render).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!(source = %source.name, error = %format!("{e:#}"), "analysis failed, no charts written");
                return Err(e);
            }
        }
    }

    // ── 3. Emit ──────────────────────────────────────────────────────────
    let output = serde_json::to_string_pretty(&reports).context("failed to serialise reports")?;
    println!("{output}");

    info!(count = reports.len(), "fundscope run complete");
    Ok(())
}

/// Fetch, analyze and chart a single source.
async fn run_source(
    client: &reqwest::Client,
    source: &SourceConfig,
    render: &RenderConfig,
) -> Result<SourceReport> {
    let fetched = market_data::fetch_source(client, source).await?;
    if fetched.series.is_empty() {
        warn!(source = %source.name, "price source returned no rows, indicators will be undefined");
    }

    let analysis = engine::analyze(&fetched.series, &source.analysis())
        .with_context(|| format!("indicator engine rejected {}", source.name))?;

    let charts = vec![
        chart::divergence_chart(&analysis, &fetched.citation, render),
        chart::rsi_chart(&analysis, &fetched.citation, render),
    ];

    Ok(SourceReport {
        source: source.name.clone(),
        citation: fetched.citation,
        analysis,
        charts,
    })
}
