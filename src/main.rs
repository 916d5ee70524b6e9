//! # Awful News Triage
//!
//! Runs one triage preset end to end and writes the ranked feed as JSON.
//!
//! ## Usage
//!
//! ```sh
//! GATEWAY_API_KEY=... awful_news_triage -p cx-ai -o ./feeds
//! ```

use awful_news_triage::api::HttpGateway;
use awful_news_triage::config::PipelineConfig;
use awful_news_triage::models::FeedReport;
use awful_news_triage::outputs::json;
use awful_news_triage::pipeline::Pipeline;
use awful_news_triage::scrapers::HttpFetcher;
use awful_news_triage::utils::ensure_writable_dir;
use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("awful_news_triage starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(preset = %args.preset, config = ?args.config, output_dir = %args.output_dir, "Parsed CLI arguments");

    // ---- Load config ----
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path, &args.preset)?,
        None => PipelineConfig::preset(&args.preset)?,
    };
    args.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration; refusing to start");
        return Err(e.into());
    }
    info!(
        pipeline = %config.name,
        sources = config.sources.len(),
        gate = ?config.relevance_gate,
        max_age_hours = config.max_age_hours,
        skip_undated = config.skip_undated,
        gateway = ?config.gateway,
        "Loaded configuration"
    );

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Run ----
    let fetcher = HttpFetcher::new(&config.user_agent, config.fetch_timeout())?;
    let gateway = HttpGateway::new(&config.gateway)?;
    let pipeline = Pipeline::new(config, fetcher, gateway);

    let generated_at = Utc::now();
    let output = pipeline.run_at(generated_at).await;

    // ---- Output ----
    let report = FeedReport {
        pipeline: pipeline.config().name.clone(),
        date_scraped: generated_at.date_naive(),
        generated_at,
        stats: output.stats,
        records: output.records,
    };
    match json::write_feed(&report, &args.output_dir).await {
        Ok(path) => info!(path = %path.display(), records = report.records.len(), "Feed written"),
        Err(e) => {
            error!(error = %e, "Failed to write feed");
            return Err(e);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        elapsed_secs = elapsed.as_secs(),
        elapsed_ms = elapsed.as_millis() as u64,
        "awful_news_triage completed"
    );
    Ok(())
}
