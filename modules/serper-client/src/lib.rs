pub mod error;
pub mod types;

pub use error::{Result, SerperError};
pub use types::{NewsItem, OrganicResult};

use types::{NewsResponse, SearchInput, SearchResponse};

const BASE_URL: &str = "https://google.serper.dev";

/// Serper.dev search client: web search plus news search.
pub struct SerperClient {
    client: reqwest::Client,
    api_key: String,
}

impl SerperClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        input: &SearchInput,
    ) -> Result<T> {
        let resp = self
            .client
            .post(format!("{BASE_URL}/{endpoint}"))
            .header("X-API-KEY", &self.api_key)
            .json(input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SerperError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    /// Web search, returning organic results.
    pub async fn search(&self, query: &str, num: u32) -> Result<Vec<OrganicResult>> {
        tracing::info!(query, "Serper web search");
        let response: SearchResponse = self
            .post(
                "search",
                &SearchInput {
                    q: query.to_string(),
                    num,
                },
            )
            .await?;
        Ok(response.organic)
    }

    /// News search, returning recent articles.
    pub async fn news(&self, query: &str, num: u32) -> Result<Vec<NewsItem>> {
        tracing::info!(query, "Serper news search");
        let response: NewsResponse = self
            .post(
                "news",
                &SearchInput {
                    q: query.to_string(),
                    num,
                },
            )
            .await?;
        Ok(response.news)
    }
}

/// Render news results as a text digest suitable for LLM analysis.
pub fn news_digest(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return "No recent news found.".to_string();
    }
    items
        .iter()
        .map(|item| {
            format!(
                "- {} ({}, {})\n  {}\n  {}",
                item.title, item.source, item.date, item.snippet, item.link
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_handles_empty_results() {
        assert_eq!(news_digest(&[]), "No recent news found.");
    }

    #[test]
    fn digest_lists_each_article() {
        let items = vec![NewsItem {
            title: "Acme raises Series B".into(),
            link: "https://news.example/acme".into(),
            snippet: "Acme announced...".into(),
            date: "2 days ago".into(),
            source: "Example News".into(),
        }];
        let digest = news_digest(&items);
        assert!(digest.contains("Acme raises Series B"));
        assert!(digest.contains("https://news.example/acme"));
    }
}
