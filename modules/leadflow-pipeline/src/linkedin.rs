//! LinkedIn research via web search + profile-data API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use serper_client::SerperClient;

use crate::traits::{LeadIdentity, LinkedInResearcher};

const PROFILE_API_HOST: &str = "fresh-linkedin-profile-data.p.rapidapi.com";

/// Resolves a lead's LinkedIn profile by searching the web for it, then
/// enriches lead and company through the profile-data API. With no API
/// key configured the enrichment calls return empty data and research
/// degrades to what the lead row already carried.
pub struct WebLinkedInResearcher {
    http: reqwest::Client,
    rapidapi_key: String,
    search: Arc<SerperClient>,
}

impl WebLinkedInResearcher {
    pub fn new(rapidapi_key: String, search: Arc<SerperClient>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            rapidapi_key,
            search,
        }
    }

    async fn profile_api(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        if self.rapidapi_key.is_empty() {
            warn!("RAPIDAPI_KEY not configured, skipping LinkedIn enrichment");
            return Ok(Value::Null);
        }

        let resp = self
            .http
            .get(format!("https://{PROFILE_API_HOST}/{endpoint}"))
            .header("x-rapidapi-key", &self.rapidapi_key)
            .header("x-rapidapi-host", PROFILE_API_HOST)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Profile API error ({status}): {}",
                resp.text().await.unwrap_or_default()
            ));
        }
        Ok(resp.json().await?)
    }

    /// Find the lead's personal profile URL via web search. Only
    /// `/in/` URLs count; posts and company pages are ignored.
    async fn find_profile_url(&self, name: &str, email: &str) -> Result<String> {
        let domain = email.rsplit('@').next().unwrap_or_default();
        let query = format!("site:linkedin.com/in \"{name}\" {domain}");
        let results = self.search.search(&query, 10).await?;
        Ok(results
            .into_iter()
            .map(|r| r.link)
            .find(|link| link.contains("linkedin.com/in"))
            .unwrap_or_default())
    }
}

fn str_field(value: &Value, keys: &[&str]) -> String {
    for key in keys {
        if let Some(s) = value.get(*key).and_then(Value::as_str) {
            if !s.is_empty() {
                return s.to_string();
            }
        }
    }
    String::new()
}

/// Flatten the interesting parts of a profile payload into narrative text.
fn narrative(value: &Value, keys: &[&str]) -> String {
    let mut parts = Vec::new();
    for key in keys {
        if let Some(s) = value.get(*key).and_then(Value::as_str) {
            if !s.is_empty() {
                parts.push(format!("{key}: {s}"));
            }
        }
    }
    parts.join("\n")
}

#[async_trait]
impl LinkedInResearcher for WebLinkedInResearcher {
    async fn research_lead(&self, name: &str, email: &str) -> Result<LeadIdentity> {
        let profile_url = self.find_profile_url(name, email).await.unwrap_or_else(|e| {
            warn!(name, error = %e, "LinkedIn profile search failed");
            String::new()
        });

        if profile_url.is_empty() {
            info!(name, "No LinkedIn profile found");
            return Ok(LeadIdentity::default());
        }

        let data = self
            .profile_api(
                "enrich-lead",
                &[("linkedin_url", profile_url.as_str()), ("include_skills", "true")],
            )
            .await?;
        if data.is_null() {
            return Ok(LeadIdentity::default());
        }

        Ok(LeadIdentity {
            profile: narrative(
                &data,
                &["full_name", "headline", "about", "job_title", "location", "skills"],
            ),
            company_name: str_field(&data, &["company", "company_name"]),
            company_website: str_field(&data, &["company_domain", "company_website"]),
            company_linkedin_url: str_field(
                &data,
                &["company_linkedin_url", "company_public_url"],
            ),
        })
    }

    async fn research_company(&self, company_linkedin_url: &str) -> Result<String> {
        if company_linkedin_url.is_empty() {
            return Ok(String::new());
        }
        let data = self
            .profile_api(
                "get-company-by-linkedinurl",
                &[("linkedin_url", company_linkedin_url)],
            )
            .await?;
        if data.is_null() {
            return Ok(String::new());
        }
        Ok(narrative(
            &data,
            &["company_name", "description", "industries", "company_size", "hq_city", "website"],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn str_field_takes_first_nonempty_synonym() {
        let data = json!({ "company": "", "company_name": "Acme" });
        assert_eq!(str_field(&data, &["company", "company_name"]), "Acme");
        assert_eq!(str_field(&data, &["missing"]), "");
    }

    #[test]
    fn narrative_skips_absent_fields() {
        let data = json!({ "headline": "CTO at Acme", "about": "" });
        let text = narrative(&data, &["headline", "about", "location"]);
        assert_eq!(text, "headline: CTO at Acme");
    }
}
