//! YAML configuration describing what to scrape and where to publish it.
//!
//! A config file names the site to scrape (`base_url` plus one path per
//! category), how to find articles on a category page, and how to pull the
//! title, URL, and eyecatch image out of each article entry.
//!
//! ```yaml
//! destination: https://example.com/destination
//! site_name: Google
//! auth_username: Joe
//! auth_password: secret
//! base_url: https://example.com/base
//! categories:
//!   food: Food
//!   medical: Medical
//! article_selector: article
//! classes:
//!   title:
//!     css: h2
//!     target: text
//!   url:
//!     css: a
//!     target: attribute
//!     additional_css: href
//!     regex: abc(.+)
//!   eyecatch:
//!     css: img
//!     target: attribute
//!     additional_css: src
//! ```

use crate::error::ConfigError;
use crate::utils::{join_path, trim_trailing_slash};
use regex::Regex;
use scraper::Selector;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// What to extract from a matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// The node's concatenated text content.
    Text,
    /// The value of a named attribute (`additional_css`).
    Attribute,
}

/// How to extract one field from an article entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassSelector {
    /// CSS selector, evaluated inside the article entry.
    pub css: String,
    pub target: Target,
    /// Attribute name, required when `target` is `attribute`.
    #[serde(default)]
    pub additional_css: String,
    /// Optional regex; the first capture group becomes the field value.
    #[serde(default)]
    pub regex: String,
}

/// Field selectors for an article entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Classes {
    pub title: ClassSelector,
    pub url: ClassSelector,
    pub eyecatch: ClassSelector,
    /// When present, each article URL is fetched and this field is
    /// resolved against the article page.
    #[serde(default)]
    pub content: Option<ClassSelector>,
}

/// Top-level configuration. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub destination: String,
    pub site_name: String,
    #[serde(default)]
    pub auth_username: String,
    #[serde(default)]
    pub auth_password: String,
    pub base_url: String,
    /// Category path suffix → display name.
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
    pub article_selector: String,
    pub classes: Classes,
}

impl Config {
    /// Read, normalize, and validate a config file.
    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let config = Self::from_yaml_str(&text)?;
        debug!(
            categories = config.categories.len(),
            base_url = %config.base_url,
            "Loaded config"
        );
        Ok(config)
    }

    /// Parse, normalize, and validate a config from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(text)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Drop a trailing `/` from `base_url` and `destination`.
    pub fn normalize(&mut self) {
        self.base_url = trim_trailing_slash(&self.base_url);
        self.destination = trim_trailing_slash(&self.destination);
    }

    /// Check values that the YAML shape alone cannot enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("destination", &self.destination),
            ("site_name", &self.site_name),
            ("base_url", &self.base_url),
            ("article_selector", &self.article_selector),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }
        parse_selector("article_selector", &self.article_selector)?;

        for (field, class) in self.class_selectors() {
            class.validate(field)?;
        }
        Ok(())
    }

    /// The configured field selectors, labelled with their field name.
    pub fn class_selectors(&self) -> impl Iterator<Item = (&'static str, &ClassSelector)> {
        [
            ("title", Some(&self.classes.title)),
            ("url", Some(&self.classes.url)),
            ("eyecatch", Some(&self.classes.eyecatch)),
            ("content", self.classes.content.as_ref()),
        ]
        .into_iter()
        .filter_map(|(field, class)| class.map(|c| (field, c)))
    }

    /// Absolute URL of a category listing page.
    pub fn category_url(&self, path: &str) -> String {
        join_path(&self.base_url, path)
    }
}

impl ClassSelector {
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        let css_field = format!("classes.{field}.css");
        if self.css.trim().is_empty() {
            return Err(invalid(&css_field, "must not be empty"));
        }
        parse_selector(&css_field, &self.css)?;

        if self.target == Target::Attribute && self.additional_css.trim().is_empty() {
            return Err(invalid(
                &format!("classes.{field}.additional_css"),
                "attribute target requires an attribute name",
            ));
        }

        compile_capture_regex(&format!("classes.{field}.regex"), &self.regex)?;
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a CSS selector, labelling failures with the config field.
pub fn parse_selector(field: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: css.to_string(),
        error: e.to_string(),
    })
}

/// Compile an optional capture regex. An empty pattern means "no regex".
pub fn compile_capture_regex(field: &str, pattern: &str) -> Result<Option<Regex>, ConfigError> {
    if pattern.is_empty() {
        return Ok(None);
    }
    let re = Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
        field: field.to_string(),
        source,
    })?;
    // captures_len counts the implicit whole-match group
    if re.captures_len() < 2 {
        return Err(ConfigError::MissingCaptureGroup {
            field: field.to_string(),
            pattern: pattern.to_string(),
        });
    }
    Ok(Some(re))
}
