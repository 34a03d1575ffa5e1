//! Command-line interface definitions for the scraper.
//!
//! ```sh
//! # Scrape and publish
//! wp_scraper config.yaml
//!
//! # Keep at most 5 articles per category, log progress, skip publishing
//! wp_scraper -l 5 -v -b config.yaml
//! ```

use clap::Parser;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML config file
    pub config: Option<String>,

    /// Acquire up to this many articles per category (negative for no limit)
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    pub limit: i64,

    /// Make the operation more talkative
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable test mode: scrape, print the results, and skip publishing
    #[arg(short = 'b', long = "test", short_alias = 't')]
    pub test: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

impl Cli {
    /// The article limit, or `None` when unbounded.
    pub fn article_limit(&self) -> Option<usize> {
        usize::try_from(self.limit).ok()
    }
}
