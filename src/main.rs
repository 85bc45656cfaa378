//! # DEW Analytics
//!
//! Batch analytics for the links shared in the Data Engineering Weekly
//! newsletter: keyword statistics over the linked articles, the sites they
//! come from, where readers click from, and which links they click most.
//!
//! ## Usage
//!
//! ```sh
//! dew_analytics keywords
//! BITLY_ACCESS_TOKEN=... dew_analytics clicks
//! dew_analytics dashboard --geography --top-links
//! ```
//!
//! ## Architecture
//!
//! Each subcommand is a pipeline writing JSON files into the data directory:
//! 1. **keywords**: edition pages → article links → `domain.json`, then
//!    article text and URL slugs → one `{strategy}{n}.json` per n-gram run
//! 2. **clicks**: Bitly links per edition → `top3_links.json` and
//!    `country_metrics.json`
//! 3. **dashboard**: data files → `dashboard.md`

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod bitly;
mod cli;
mod config;
mod keywords;
mod models;
mod outputs;
mod scrapers;
mod utils;

use bitly::{HttpBitly, RetryApi};
use cli::{Cli, Command};
use config::AnalysisConfig;
use outputs::dashboard;
use scrapers::newsletter;
use utils::ensure_writable_dir;

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
    info!("dew_analytics starting up");

    let args = Cli::parse();
    debug!(data_dir = %args.data_dir.display(), config = ?args.config, "Parsed CLI arguments");

    if let Err(e) = ensure_writable_dir(&args.data_dir).await {
        error!(
            path = %args.data_dir.display(),
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let config = config::load_config(args.config.as_deref())?;

    match args.command {
        Command::Keywords => run_keywords(&config, &args.data_dir).await?,
        Command::Clicks {
            bitly_token,
            country_csv,
        } => {
            let country_csv = country_csv.unwrap_or_else(|| args.data_dir.join("country.csv"));
            run_clicks(&config, &bitly_token, &country_csv, &args.data_dir).await?
        }
        Command::Dashboard(dashboard_args) => {
            let (path, md) = dashboard::write_dashboard(
                &args.data_dir,
                dashboard_args.sections(),
                &config.runs,
                dashboard_args.limit,
            )
            .await?;
            info!(path = %path.display(), "Dashboard ready");
            if dashboard_args.print {
                println!("{md}");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Editions → links → domain statistics → n-gram keyword statistics.
#[instrument(level = "info", skip_all)]
async fn run_keywords(
    config: &AnalysisConfig,
    data_dir: &std::path::Path,
) -> Result<(), Box<dyn Error>> {
    let client = scrapers::http_client(config)?;

    let editions = newsletter::weekly_links(config);
    let links = newsletter::collect_article_links(&client, editions, config).await;
    if links.is_empty() {
        return Err("no article links found in any edition".into());
    }

    analysis::domain::domain_names(&links, data_dir).await?;
    analysis::ngram::execute(&client, &links, config, data_dir).await;
    Ok(())
}

/// Bitly links → country distribution and top links per edition.
#[instrument(level = "info", skip_all)]
async fn run_clicks(
    config: &AnalysisConfig,
    token: &str,
    country_csv: &std::path::Path,
    data_dir: &std::path::Path,
) -> Result<(), Box<dyn Error>> {
    let country_map = bitly::metrics::load_country_map(country_csv)?;
    let client = scrapers::http_client(config)?;
    let api = RetryApi::new(HttpBitly::new(client, token), 5, Duration::from_secs(1));
    info!(?api, "Bitly client ready");
    bitly::metrics::run(&api, &country_map, data_dir).await
}
