use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SearchInput {
    pub q: String,
    pub num: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub organic: Vec<OrganicResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganicResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}
