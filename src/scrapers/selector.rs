//! Selector resolution: turn a field's config into a string value.
//!
//! The config's selectors and regexes are compiled once into an
//! [`ExtractionPlan`] and shared by every category task.

use crate::config::{compile_capture_regex, parse_selector, ClassSelector, Config, Target};
use crate::error::{ConfigError, ExtractionError};
use crate::models::Article;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// A compiled field selector.
#[derive(Debug)]
pub struct FieldExtractor {
    field: &'static str,
    selector: Selector,
    target: Target,
    attribute: String,
    capture: Option<Regex>,
}

impl FieldExtractor {
    pub fn compile(field: &'static str, class: &ClassSelector) -> Result<Self, ConfigError> {
        Ok(Self {
            field,
            selector: parse_selector(&format!("classes.{field}.css"), &class.css)?,
            target: class.target,
            attribute: class.additional_css.clone(),
            capture: compile_capture_regex(&format!("classes.{field}.regex"), &class.regex)?,
        })
    }

    /// Resolve this field against the first matching node under `scope`.
    ///
    /// A missing node or attribute yields an empty string. When a capture
    /// regex is configured, the value is narrowed to its first group and a
    /// non-matching value is an error.
    pub fn resolve(&self, scope: ElementRef<'_>) -> Result<String, ExtractionError> {
        let raw = match scope.select(&self.selector).next() {
            None => String::new(),
            Some(node) => match self.target {
                Target::Text => node.text().collect(),
                Target::Attribute => node.value().attr(&self.attribute).unwrap_or_default().to_string(),
            },
        };
        self.capture(raw)
    }

    /// Resolve this field against a whole document.
    pub fn resolve_document(&self, document: &Html) -> Result<String, ExtractionError> {
        self.resolve(document.root_element())
    }

    fn capture(&self, raw: String) -> Result<String, ExtractionError> {
        let Some(re) = &self.capture else {
            return Ok(raw);
        };
        re.captures(&raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ExtractionError::PatternMismatch {
                field: self.field.to_string(),
                pattern: re.as_str().to_string(),
                value: raw.clone(),
            })
    }
}

/// Everything needed to extract articles from category and article pages.
#[derive(Debug)]
pub struct ExtractionPlan {
    pub article: Selector,
    pub title: FieldExtractor,
    pub url: FieldExtractor,
    pub eyecatch: FieldExtractor,
    pub content: Option<FieldExtractor>,
}

impl ExtractionPlan {
    pub fn compile(config: &Config) -> Result<Self, ConfigError> {
        let classes = &config.classes;
        Ok(Self {
            article: parse_selector("article_selector", &config.article_selector)?,
            title: FieldExtractor::compile("title", &classes.title)?,
            url: FieldExtractor::compile("url", &classes.url)?,
            eyecatch: FieldExtractor::compile("eyecatch", &classes.eyecatch)?,
            content: classes
                .content
                .as_ref()
                .map(|c| FieldExtractor::compile("content", c))
                .transpose()?,
        })
    }

    /// Extract one article per entry matching the article selector, in
    /// document order. `content` is left unset.
    pub fn extract_articles(&self, body: &str) -> Result<Vec<Article>, ExtractionError> {
        let document = Html::parse_document(body);
        document
            .select(&self.article)
            .map(|entry| -> Result<Article, ExtractionError> {
                Ok(Article {
                    title: self.title.resolve(entry)?,
                    url: self.url.resolve(entry)?,
                    eyecatch: self.eyecatch.resolve(entry)?,
                    content: None,
                })
            })
            .collect()
    }

    /// Resolve the content field against an article page, if configured.
    pub fn extract_content(&self, body: &str) -> Result<Option<String>, ExtractionError> {
        let Some(content) = &self.content else {
            return Ok(None);
        };
        let document = Html::parse_document(body);
        content.resolve_document(&document).map(Some)
    }
}
