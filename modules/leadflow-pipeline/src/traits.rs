//! Collaborator boundaries for the pipeline.
//!
//! Every external system the stages talk to sits behind one of these
//! traits; production impls adapt the client modules (see `deps.rs`) and
//! each trait has a mock in `testing.rs`.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use leadflow_common::LeadRow;

/// Source of lead records (file-backed table, spreadsheet, CRM).
#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Pull the full backlog matching a status filter, once per run.
    async fn fetch(&self, status_filter: &str) -> Result<Vec<LeadRow>>;

    /// Write fields back for one lead. The CRM-update stage is the only
    /// caller.
    async fn update(&self, lead_id: &str, fields: &[(String, String)]) -> Result<()>;
}

/// A document persisted to the external store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub document_url: String,
    pub shareable_url: Option<String>,
    pub folder_url: Option<String>,
}

/// External document store (Drive/Docs-like).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create-or-get a slash-separated folder path.
    /// Returns `(folder_id, folder_url)`.
    async fn ensure_folder(&self, path: &str, shareable: bool) -> Result<(String, String)>;

    /// Exact title + folder existence check.
    async fn document_exists(&self, folder: &str, title: &str) -> Result<bool>;

    async fn create_document(
        &self,
        content: &str,
        title: &str,
        folder: &str,
        markdown: bool,
        shareable: bool,
    ) -> Result<StoredDocument>;

    /// Upload a local file as-is. Returns its link.
    async fn upload_file(
        &self,
        path: &Path,
        name: &str,
        folder: &str,
        shareable: bool,
    ) -> Result<String>;
}

/// LLM collaborator. `complete` for plain synthesis; `extract_json` for
/// schema-forced structured output (see [`crate::structured::extract`]
/// for the typed wrapper).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    async fn extract_json(
        &self,
        system: &str,
        user: &str,
        schema: serde_json::Value,
    ) -> Result<serde_json::Value>;
}

/// Fetches a page and converts it to markdown.
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape_markdown(&self, url: &str) -> Result<String>;
}

/// Recent-news lookup for a company.
#[async_trait]
pub trait NewsSearcher: Send + Sync {
    async fn recent_news(&self, company: &str) -> Result<String>;
}

/// Video-platform channel statistics. `Ok(None)` means the channel
/// resolved but returned no data.
#[async_trait]
pub trait ChannelStats: Send + Sync {
    async fn channel_digest(&self, channel_url: &str) -> Result<Option<String>>;
}

/// Outreach mailbox.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn create_draft(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
    async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Retrieval of the most similar case-study artifact for an outreach
/// report, keyed by the general research report.
#[async_trait]
pub trait CaseStudyIndex: Send + Sync {
    async fn similar_case_study(&self, research_report: &str) -> Result<String>;
}

/// Identity facts resolved from LinkedIn research.
#[derive(Debug, Clone, Default)]
pub struct LeadIdentity {
    pub profile: String,
    pub company_name: String,
    pub company_website: String,
    pub company_linkedin_url: String,
}

/// LinkedIn lead/company research provider.
#[async_trait]
pub trait LinkedInResearcher: Send + Sync {
    async fn research_lead(&self, name: &str, email: &str) -> Result<LeadIdentity>;

    /// Narrative company profile for a company LinkedIn URL.
    async fn research_company(&self, company_linkedin_url: &str) -> Result<String>;
}
