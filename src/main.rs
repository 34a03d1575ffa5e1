//! # WP Scraper
//!
//! Scrapes article listings (title, link, eyecatch image) from the category
//! pages of a site and publishes them to a destination server as JSON.
//! Everything site-specific lives in a YAML config file: the base URL, the
//! category paths, and the CSS selectors that locate each field.
//!
//! ## Usage
//!
//! ```sh
//! wp_scraper [-l <limit>] [-v] [-b|-t] config.yaml
//! ```
//!
//! ## Architecture
//!
//! 1. **Config**: load and validate the YAML config, compile its selectors
//! 2. **Scraping**: scrape every category concurrently; the first failure
//!    aborts the run
//! 3. **Sync**: create the site on the destination server and post each
//!    category's articles (skipped in test mode)

use clap::Parser;
use reqwest::Client;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod models;
mod scrapers;
mod sync;
mod utils;

use cli::Cli;
use utils::error_chain;
use config::Config;
use scrapers::{ExtractionPlan, PageFetcher};
use sync::Publisher;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            println!("{e}");
            return ExitCode::FAILURE;
        }
        // --help and --version
        Err(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", error_chain(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}

/// Log level used when `RUST_LOG` is unset. Without `-v` nothing is
/// logged, so a fatal error is printed only once, by `main`.
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose { "info" } else { "off" }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();
}

#[instrument(level = "info", skip_all)]
async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    debug!(?args, "Parsed CLI arguments");

    let config_path = args.config.as_deref().ok_or("specify config file")?;
    info!(path = %config_path, "Loading config file");
    let config = Config::load(config_path).await?;
    let plan = Arc::new(ExtractionPlan::compile(&config)?);

    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let fetcher = PageFetcher::new(client.clone());
    let outcome = scrapers::scrape(&fetcher, &config, plan, args.article_limit()).await?;

    if outcome.is_empty() {
        warn!("No categories configured; only the site will be created");
    }

    if args.test {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        println!("Quit because test mode is enabled");
        return Ok(());
    }

    let publisher = Publisher::new(client, &config);
    let confirmation = publisher.send_to_server(&outcome).await?;
    println!("Published {} articles to {confirmation}", outcome.article_count());

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        categories = outcome.len(),
        articles = outcome.article_count(),
        "Execution complete"
    );
    Ok(())
}
