//! Category scrape task: fetch one listing page and extract its articles.
//!
//! # Fetch Pattern
//!
//! The listing page is fetched once and every entry matching the article
//! selector becomes an [`Article`]. When the config has a `content` class,
//! each article's URL is then fetched in turn (one request at a time, in
//! listing order) and the content field is resolved against that page.
//!
//! Parsed documents are dropped before the next request so the task stays
//! `Send` and can run on the multi-threaded runtime.

use crate::error::{FetchError, TaskError};
use crate::models::Article;
use crate::scrapers::selector::ExtractionPlan;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

/// Downloads pages over a shared HTTP client.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// GET a page and return its body. Non-2xx responses are errors.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request_error = |source: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(request_error)?;
        debug!(
            bytes = body.len(),
            preview = %truncate_for_log(&body, 120),
            "Fetched page"
        );
        Ok(body)
    }
}

/// Scrape one category listing page.
///
/// # Arguments
///
/// * `fetcher` - HTTP fetcher shared by all tasks
/// * `url` - Absolute URL of the category listing
/// * `plan` - Compiled selectors
/// * `limit` - Keep at most this many articles, `None` for all
///
/// # Returns
///
/// The articles in document order. Any fetch or extraction failure aborts
/// the whole category; partial results are discarded.
#[instrument(level = "info", skip(fetcher, plan))]
pub async fn scrape_category(
    fetcher: &PageFetcher,
    url: &str,
    plan: &ExtractionPlan,
    limit: Option<usize>,
) -> Result<Vec<Article>, TaskError> {
    let body = fetcher.fetch(url).await?;
    let mut articles = plan.extract_articles(&body)?;
    let found = articles.len();
    if let Some(limit) = limit {
        articles.truncate(limit);
    }
    info!(found, kept = articles.len(), "Extracted articles");

    if plan.content.is_none() {
        return Ok(articles);
    }

    let base = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let base = &base;

    let articles: Vec<Article> = stream::iter(articles)
        .then(move |mut article| async move {
            let link = base
                .join(&article.url)
                .map_err(|source| FetchError::InvalidUrl {
                    url: article.url.clone(),
                    source,
                })?;
            let page = fetcher.fetch(link.as_str()).await?;
            article.content = plan.extract_content(&page)?;
            debug!(url = %link, "Fetched article content");
            Ok::<_, TaskError>(article)
        })
        .try_collect()
        .await?;

    info!(count = articles.len(), "Fetched article contents");
    Ok(articles)
}
