//! HTTP page scraping with markdown extraction.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{info, warn};

use crate::traits::PageScraper;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Plain HTTP fetch + Readability extraction to markdown. Company sites
/// and blogs are static enough that no browser rendering is needed.
pub struct HttpScraper {
    http: reqwest::Client,
}

impl HttpScraper {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");
        Self { http }
    }
}

impl Default for HttpScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// Lead websites are often bare domains ("acme.com"); give them a scheme.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

#[async_trait]
impl PageScraper for HttpScraper {
    async fn scrape_markdown(&self, url: &str) -> Result<String> {
        let url = normalize_url(url);
        let parsed = url::Url::parse(&url).context("Invalid URL")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("Only http/https URLs are allowed, got: {}", parsed.scheme());
        }

        info!(url = url.as_str(), "Scraping URL");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Failed to fetch {url}: status {status}");
        }
        let html = response.bytes().await?.to_vec();
        if html.is_empty() {
            warn!(url = url.as_str(), "Empty response body");
            return Ok(String::new());
        }

        let config = TransformConfig {
            readability: true,
            main_content: true,
            return_format: ReturnFormat::Markdown,
            filter_images: true,
            filter_svg: true,
            clean_html: true,
        };
        let input = TransformInput {
            url: Some(&parsed),
            content: &html,
            screenshot_bytes: None,
            encoding: None,
            selector_config: None,
            ignore_tags: None,
        };

        let markdown = transform_content_input(input, &config);
        if markdown.trim().is_empty() {
            warn!(url = url.as_str(), "Empty content after extraction");
            return Ok(String::new());
        }

        info!(url = url.as_str(), bytes = markdown.len(), "Scraped successfully");
        Ok(markdown.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domains_get_a_scheme() {
        assert_eq!(normalize_url("acme.com"), "https://acme.com");
        assert_eq!(normalize_url("https://acme.com"), "https://acme.com");
        assert_eq!(normalize_url("  http://acme.com "), "http://acme.com");
    }
}
