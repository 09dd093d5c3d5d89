mod client;
pub mod schema;

pub use schema::StructuredOutput;

use anyhow::{anyhow, Result};

use client::{ChatRequest, ClaudeClient, ContentBlock, ToolSpec};

/// Anthropic messages-API model handle.
///
/// Two operations: [`Claude::complete`] for plain text synthesis, and
/// [`Claude::extract`] for schema-forced structured output via tool use.
#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: Option<String>,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    /// Override the API endpoint (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> ClaudeClient {
        let client = ClaudeClient::new(&self.api_key);
        match &self.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        }
    }

    /// One-shot text completion: system prompt + user message → text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest::new(&self.model, system, user);
        let response = self.client().messages(&request).await?;
        response
            .text()
            .ok_or_else(|| anyhow!("No text content in model response"))
    }

    /// Structured extraction against an explicit JSON schema: the model
    /// is forced to call a single tool with that input schema, and the
    /// tool input is returned verbatim.
    pub async fn extract_with_schema(
        &self,
        system: &str,
        user: &str,
        schema: serde_json::Value,
    ) -> Result<serde_json::Value> {
        const TOOL_NAME: &str = "structured_response";

        let request = ChatRequest::new(&self.model, system, user)
            .tool(ToolSpec {
                name: TOOL_NAME.to_string(),
                description: "Record the structured result of the analysis.".to_string(),
                input_schema: schema,
            })
            .force_tool(TOOL_NAME);

        let response = self.client().messages(&request).await?;

        for block in response.content {
            if let ContentBlock::ToolUse { input, .. } = block {
                return Ok(input);
            }
        }

        Err(anyhow!("No structured output in model response"))
    }

    /// Typed structured extraction: schema derived from `T`, result
    /// deserialized into `T`.
    pub async fn extract<T: StructuredOutput>(&self, system: &str, user: &str) -> Result<T> {
        let value = self
            .extract_with_schema(system, user, T::tool_schema())
            .await?;
        serde_json::from_value(value)
            .map_err(|e| anyhow!("Failed to deserialize structured response: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_and_base_url_are_configurable() {
        let ai = Claude::new("sk-ant-test", "claude-sonnet-4-20250514")
            .with_base_url("https://proxy.internal");
        assert_eq!(ai.model(), "claude-sonnet-4-20250514");
        assert_eq!(ai.base_url.as_deref(), Some("https://proxy.internal"));
    }
}
