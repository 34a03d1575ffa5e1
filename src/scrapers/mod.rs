//! Concurrent scrape engine.
//!
//! One task is spawned per configured category. Tasks report back over a
//! single channel and the engine is the only writer of the outcome:
//!
//! 1. **Fan-out**: spawn a [`category::scrape_category`] task per category
//! 2. **Fan-in**: receive `(category, result)` messages until every
//!    category has reported
//! 3. **Abort**: the first failed task ends the scrape; remaining tasks are
//!    cancelled at their next await point
//!
//! # Submodules
//!
//! - [`selector`]: compiled field selectors and selector resolution
//! - [`category`]: page fetching and the per-category task

pub mod category;
pub mod selector;

use crate::config::Config;
use crate::error::{ScrapeError, TaskError};
use crate::models::{Article, CategoryResult, ScrapeOutcome};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, Instrument};

pub use category::PageFetcher;
pub use selector::ExtractionPlan;

type TaskReport = (String, Result<Vec<Article>, TaskError>);

/// Scrape every configured category concurrently.
///
/// # Arguments
///
/// * `fetcher` - HTTP fetcher, cloned into each task
/// * `config` - Source of the base URL and categories
/// * `plan` - Compiled selectors shared by all tasks
/// * `limit` - Keep at most this many articles per category, `None` for all
///
/// # Returns
///
/// One [`CategoryResult`] per category in completion order, or the first
/// task error. A partial outcome is never returned.
#[instrument(level = "info", skip_all, fields(categories = config.categories.len()))]
pub async fn scrape(
    fetcher: &PageFetcher,
    config: &Config,
    plan: Arc<ExtractionPlan>,
    limit: Option<usize>,
) -> Result<ScrapeOutcome, ScrapeError> {
    let expected = config.categories.len();
    if expected == 0 {
        info!("No categories configured");
        return Ok(ScrapeOutcome::default());
    }

    let cancel = CancellationToken::new();
    // cancels outstanding tasks on every exit path, including drop
    let _cancel_on_exit = cancel.clone().drop_guard();
    let (tx, mut rx) = mpsc::unbounded_channel::<TaskReport>();

    for (path, name) in &config.categories {
        let url = config.category_url(path);
        let span = info_span!("category_task", category = %name, %url);
        let category = name.clone();
        let fetcher = fetcher.clone();
        let plan = Arc::clone(&plan);
        let cancel = cancel.clone();
        let tx = tx.clone();

        tokio::spawn(
            async move {
                let result = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Cancelled before completion");
                        return;
                    }
                    result = category::scrape_category(&fetcher, &url, &plan, limit) => result,
                };
                // The engine stops listening after the first failure.
                let _ = tx.send((category, result));
            }
            .instrument(span),
        );
    }
    drop(tx);

    let mut results = Vec::with_capacity(expected);
    while results.len() < expected {
        match rx.recv().await {
            Some((category, Ok(articles))) => {
                info!(%category, count = articles.len(), "Category scraped");
                results.push(CategoryResult { category, articles });
            }
            Some((category, Err(source))) => {
                error!(%category, error = %source, "Category scrape failed; aborting");
                return Err(ScrapeError::Task { category, source });
            }
            None => {
                return Err(ScrapeError::Disconnected {
                    received: results.len(),
                    expected,
                });
            }
        }
    }

    let outcome = ScrapeOutcome::new(results);
    info!(
        categories = outcome.len(),
        articles = outcome.article_count(),
        "Scrape complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use reqwest::Client;
    use std::time::Duration;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn listing(prefix: &str, n: usize) -> String {
        let mut html = String::from("<html><body>");
        for i in 1..=n {
            html.push_str(&format!(
                r#"<div class="item"><span class="t">{prefix} {i}</span><a href="/{prefix}/{i}"></a><img src="/{prefix}/{i}.png"></div>"#
            ));
        }
        html.push_str("</body></html>");
        html
    }

    fn config(base_url: &str, categories: &[(&str, &str)]) -> Config {
        config_with(base_url, categories, "")
    }

    fn config_with(base_url: &str, categories: &[(&str, &str)], extra_classes: &str) -> Config {
        let mut yaml = format!(
            r#"
destination: http://dest.test
site_name: blog
base_url: {base_url}
article_selector: .item
classes:
    title:
        css: .t
        target: text
    url:
        css: a
        target: attribute
        additional_css: href
    eyecatch:
        css: img
        target: attribute
        additional_css: src
{extra_classes}categories:
"#
        );
        if categories.is_empty() {
            yaml = yaml.replace("categories:\n", "categories: {}\n");
        }
        for (path, name) in categories {
            yaml.push_str(&format!("    {path}: {name}\n"));
        }
        Config::from_yaml_str(&yaml).unwrap()
    }

    async fn run(config: &Config, limit: Option<usize>) -> Result<ScrapeOutcome, ScrapeError> {
        let plan = Arc::new(ExtractionPlan::compile(config).unwrap());
        scrape(&PageFetcher::new(Client::new()), config, plan, limit).await
    }

    async fn mount_listing(server: &MockServer, at: &str, body: String, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body)
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }

    fn articles_of<'a>(outcome: &'a ScrapeOutcome, category: &str) -> &'a [Article] {
        &outcome
            .results()
            .iter()
            .find(|r| r.category == category)
            .unwrap()
            .articles
    }

    #[tokio::test]
    async fn test_empty_categories_yield_empty_outcome() {
        let server = MockServer::start().await;
        let config = config(&server.uri(), &[]);

        let outcome = run(&config, None).await.unwrap();

        assert!(outcome.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_category_end_to_end() {
        let server = MockServer::start().await;
        let page = r#"<html><body>
            <div class="item"><p class="t">Alpha</p><a href="https://x.test/alpha">a</a><img src="https://x.test/alpha.jpg"></div>
            <div class="item"><p class="t">Beta</p><a href="https://x.test/beta">b</a><img src="https://x.test/beta.jpg"></div>
        </body></html>"#;
        mount_listing(&server, "/cat1", page.to_string(), Duration::ZERO).await;
        let config = config(&server.uri(), &[("cat1", "Cat One")]);

        let outcome = run(&config, None).await.unwrap();

        let article = |title: &str, slug: &str| Article {
            title: title.to_string(),
            url: format!("https://x.test/{slug}"),
            eyecatch: format!("https://x.test/{slug}.jpg"),
            content: None,
        };
        assert_eq!(
            outcome.results(),
            &[CategoryResult {
                category: "Cat One".to_string(),
                articles: vec![article("Alpha", "alpha"), article("Beta", "beta")],
            }]
        );
    }

    #[tokio::test]
    async fn test_one_result_per_category() {
        let server = MockServer::start().await;
        mount_listing(&server, "/food", listing("food", 3), Duration::ZERO).await;
        mount_listing(&server, "/tech", listing("tech", 0), Duration::ZERO).await;
        mount_listing(&server, "/news", listing("news", 2), Duration::ZERO).await;
        let config = config(
            &server.uri(),
            &[("food", "Food"), ("tech", "Tech"), ("news", "News")],
        );

        let outcome = run(&config, None).await.unwrap();

        assert_eq!(outcome.len(), 3);
        assert_eq!(articles_of(&outcome, "Food").len(), 3);
        assert_eq!(articles_of(&outcome, "Tech").len(), 0);
        let news = articles_of(&outcome, "News");
        assert_eq!(news[0].title, "news 1");
        assert_eq!(news[1].url, "/news/2");
    }

    #[tokio::test]
    async fn test_results_arrive_in_completion_order() {
        let server = MockServer::start().await;
        mount_listing(&server, "/a", listing("a", 1), Duration::from_millis(400)).await;
        mount_listing(&server, "/b", listing("b", 1), Duration::ZERO).await;
        let config = config(&server.uri(), &[("a", "Slow"), ("b", "Fast")]);

        let outcome = run(&config, None).await.unwrap();

        let order: Vec<&str> = outcome.results().iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order, vec!["Fast", "Slow"]);
    }

    #[tokio::test]
    async fn test_limit_truncates_each_category() {
        let server = MockServer::start().await;
        mount_listing(&server, "/food", listing("food", 5), Duration::ZERO).await;
        mount_listing(&server, "/tech", listing("tech", 1), Duration::ZERO).await;
        let config = config(&server.uri(), &[("food", "Food"), ("tech", "Tech")]);

        let outcome = run(&config, Some(2)).await.unwrap();

        let food = articles_of(&outcome, "Food");
        assert_eq!(food.len(), 2);
        assert_eq!(food[0].title, "food 1");
        assert_eq!(food[1].title, "food 2");
        assert_eq!(articles_of(&outcome, "Tech").len(), 1);
    }

    #[tokio::test]
    async fn test_first_error_wins_without_waiting() {
        let server = MockServer::start().await;
        for i in 1..=4 {
            mount_listing(
                &server,
                &format!("/slow{i}"),
                listing("slow", 1),
                Duration::from_secs(10),
            )
            .await;
        }
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let config = config(
            &server.uri(),
            &[
                ("slow1", "Slow 1"),
                ("slow2", "Slow 2"),
                ("broken", "Broken"),
                ("slow3", "Slow 3"),
                ("slow4", "Slow 4"),
            ],
        );

        let result = tokio::time::timeout(Duration::from_secs(5), run(&config, None))
            .await
            .expect("scrape should return as soon as one category fails");

        match result.unwrap_err() {
            ScrapeError::Task { category, source } => {
                assert_eq!(category, "Broken");
                assert!(matches!(source, TaskError::Fetch(FetchError::Status { .. })));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failure_cancels_in_flight_categories() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "/slow",
            listing("posts", 2),
            Duration::from_millis(800),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let content = "    content:\n        css: .body\n        target: text\n";
        let config = config_with(
            &server.uri(),
            &[("slow", "Slow"), ("broken", "Broken")],
            content,
        );

        let err = run(&config, None).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Task { ref category, .. } if category == "Broken"));

        // Give the slow listing time to arrive; a live task would now
        // request its article pages.
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let requests = server.received_requests().await.unwrap();
        let article_fetches = requests
            .iter()
            .filter(|r| r.url.path().starts_with("/posts/"))
            .count();
        assert_eq!(article_fetches, 0);
    }
}
