//! Error taxonomy for loading configuration, scraping categories, and
//! publishing results.
//!
//! Each stage of the pipeline has its own error type so callers can tell a
//! broken config apart from a flaky category page or a rejected upload:
//!
//! - [`ConfigError`]: the config file is missing, malformed, or inconsistent
//! - [`FetchError`]: a page could not be downloaded
//! - [`ExtractionError`]: a field could not be extracted from a downloaded page
//! - [`TaskError`]: either of the above, raised by a single category task
//! - [`ScrapeError`]: the first category task failure seen by the engine
//! - [`SyncError`]: publishing to the destination server failed

use reqwest::StatusCode;

/// Errors raised while reading, normalizing, or validating the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML or does not match the config shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A required value is missing or inconsistent with another value.
    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: String, reason: String },

    /// A CSS selector in the config does not parse.
    #[error("invalid selector '{selector}' for '{field}': {error}")]
    InvalidSelector {
        field: String,
        selector: String,
        error: String,
    },

    /// A capture regex in the config does not compile.
    #[error("invalid regex for '{field}': {source}")]
    InvalidRegex {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// A capture regex compiles but has nothing to capture.
    #[error("regex '{pattern}' for '{field}' has no capture group")]
    MissingCaptureGroup { field: String, pattern: String },
}

/// Errors raised while downloading a page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to '{url}' returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Errors raised while resolving a field against a parsed page.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The configured capture regex did not match the resolved value.
    #[error("regex '{pattern}' for field '{field}' did not match '{value}'")]
    PatternMismatch {
        field: String,
        pattern: String,
        value: String,
    },
}

/// Failure of a single category scrape task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Failure of a scrape run. Only the first task failure is reported.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("scraping category '{category}' failed: {source}")]
    Task {
        category: String,
        #[source]
        source: TaskError,
    },

    /// Every task went away without reporting, e.g. after a panic.
    #[error("scrape tasks stopped after reporting {received} of {expected} categories")]
    Disconnected { received: usize, expected: usize },
}

/// Errors raised while publishing results to the destination server.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("POST to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("POST to '{url}' returned status {status}")]
    Status { url: String, status: StatusCode },
}
