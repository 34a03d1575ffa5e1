//! Data models for scraped articles and the payloads published from them.
//!
//! - [`Article`]: one listing entry extracted from a category page
//! - [`CategoryResult`]: every article scraped from one category
//! - [`ScrapeOutcome`]: all category results of a scrape run
//! - [`CategoryPayload`]: the JSON body posted to the destination server

use serde::Serialize;

/// A single article extracted from a category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub eyecatch: String,
    /// Only set when the config has a `content` class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Articles scraped from one category, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryResult {
    /// Display name of the category.
    pub category: String,
    pub articles: Vec<Article>,
}

/// The complete set of category results from a scrape run.
///
/// Results are kept in the order their tasks completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScrapeOutcome {
    results: Vec<CategoryResult>,
}

impl ScrapeOutcome {
    pub fn new(results: Vec<CategoryResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[CategoryResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Total number of articles across all categories.
    pub fn article_count(&self) -> usize {
        self.results.iter().map(|r| r.articles.len()).sum()
    }
}

/// Placeholder published as every category's `source`.
pub const CATEGORY_SOURCE: &str = "http://example.com";

/// Body of one articles POST.
#[derive(Debug, Serialize)]
pub struct CategoryPayload<'a> {
    pub category: CategoryInfo<'a>,
    pub articles: Vec<ArticlePayload<'a>>,
}

#[derive(Debug, Serialize)]
pub struct CategoryInfo<'a> {
    pub id: usize,
    pub name: &'a str,
    pub source: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ArticlePayload<'a> {
    pub id: usize,
    pub title: &'a str,
    pub link: &'a str,
    pub eyecatch: &'a str,
}

impl<'a> CategoryPayload<'a> {
    /// Build the payload for one category. Article ids restart at 1.
    pub fn new(category_id: usize, result: &'a CategoryResult) -> Self {
        Self {
            category: CategoryInfo {
                id: category_id,
                name: &result.category,
                source: CATEGORY_SOURCE,
            },
            articles: result
                .articles
                .iter()
                .enumerate()
                .map(|(i, article)| ArticlePayload {
                    id: i + 1,
                    title: &article.title,
                    link: &article.url,
                    eyecatch: &article.eyecatch,
                })
                .collect(),
        }
    }
}
