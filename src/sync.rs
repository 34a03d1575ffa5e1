//! Publish a scrape outcome to the destination server.
//!
//! Publication is a fixed sequence of blocking POSTs, all with a JSON
//! content type and HTTP Basic authentication:
//!
//! 1. `POST {destination}/sites/{site_name}` with an empty body
//! 2. `POST {destination}/sites/{site_name}/articles/` once per category
//!
//! The first failing request stops the sequence. Categories that were
//! already posted stay posted, and running it twice posts everything twice.

use crate::config::Config;
use crate::error::SyncError;
use crate::models::{CategoryPayload, ScrapeOutcome};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use tracing::{info, instrument};

/// Client for the destination server's site and article endpoints.
#[derive(Debug, Clone)]
pub struct Publisher {
    client: Client,
    username: String,
    password: String,
    site_url: String,
    articles_url: String,
}

impl Publisher {
    pub fn new(client: Client, config: &Config) -> Self {
        let site_url = format!(
            "{}/sites/{}",
            config.destination,
            urlencoding::encode(&config.site_name)
        );
        let articles_url = format!("{site_url}/articles/");
        Self {
            client,
            username: config.auth_username.clone(),
            password: config.auth_password.clone(),
            site_url,
            articles_url,
        }
    }

    /// URL returned on successful publication.
    pub fn articles_url(&self) -> &str {
        &self.articles_url
    }

    /// Create the site, then post every category's articles.
    ///
    /// Category ids count up from 1 in outcome order; article ids restart
    /// at 1 in each category.
    ///
    /// # Returns
    ///
    /// The articles endpoint URL once every POST has succeeded.
    #[instrument(level = "info", skip_all, fields(site = %self.site_url))]
    pub async fn send_to_server(&self, outcome: &ScrapeOutcome) -> Result<String, SyncError> {
        let create_site = self
            .request(&self.site_url)
            .header(CONTENT_TYPE, "application/json");
        self.send(&self.site_url, create_site).await?;
        info!("Site created");

        for (i, result) in outcome.results().iter().enumerate() {
            let category_id = i + 1;
            let payload = CategoryPayload::new(category_id, result);
            let post_articles = self.request(&self.articles_url).json(&payload);
            self.send(&self.articles_url, post_articles).await?;
            info!(
                category_id,
                category = %result.category,
                count = result.articles.len(),
                "Posted category articles"
            );
        }

        Ok(self.articles_url().to_string())
    }

    fn request(&self, url: &str) -> RequestBuilder {
        self.client
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<(), SyncError> {
        let response = request.send().await.map_err(|source| SyncError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(())
    }
}
