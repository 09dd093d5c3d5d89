//! Structured-output types for LLM extraction stages.

use anyhow::Result;
use schemars::JsonSchema;
use serde::Deserialize;

use ai_client::StructuredOutput;

use crate::traits::LlmClient;

/// What the website-review stage extracts from a company homepage.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct WebsiteIntel {
    /// Narrative summary of what the company does, appended to the
    /// company profile.
    pub summary: String,
    /// Blog URL if the site links one, else empty.
    pub blog_url: String,
    /// Social channel URLs, empty when absent.
    pub youtube: String,
    pub twitter: String,
    pub facebook: String,
}

/// Personalized outreach email produced by the email stage.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EmailDraft {
    pub subject: String,
    pub email: String,
}

/// Typed wrapper over [`LlmClient::extract_json`].
pub async fn extract<T>(llm: &dyn LlmClient, system: &str, user: &str) -> Result<T>
where
    T: StructuredOutput,
{
    let value = llm.extract_json(system, user, T::tool_schema()).await?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn website_intel_schema_is_closed() {
        let schema = WebsiteIntel::tool_schema();
        assert_eq!(schema["additionalProperties"], false);
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 5);
    }

    #[test]
    fn website_intel_defaults_are_empty() {
        let intel = WebsiteIntel::default();
        assert!(intel.summary.is_empty());
        assert!(intel.blog_url.is_empty());
    }
}
