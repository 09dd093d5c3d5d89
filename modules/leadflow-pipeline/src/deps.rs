//! Production wiring: collaborator trait impls over the client modules,
//! plus the dependency bundle handed to every stage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use ai_client::Claude;
use docstore_client::DocstoreClient;
use leadflow_common::Config;
use mail_client::GmailClient;
use serper_client::{news_digest, SerperClient};
use youtube_client::YoutubeClient;

use crate::linkedin::WebLinkedInResearcher;
use crate::scraper::HttpScraper;
use crate::traits::{
    CaseStudyIndex, ChannelStats, DocumentStore, LeadSource, LlmClient, Mailer, NewsSearcher,
    PageScraper, StoredDocument,
};

/// Run policy flags and local paths.
#[derive(Debug, Clone)]
pub struct RunPolicy {
    /// Lead-source status value considered eligible for processing.
    pub status_filter: String,
    /// Send outreach emails immediately instead of only drafting them.
    /// Off by default: confidence in email quality is required before
    /// enabling direct sends.
    pub send_email_directly: bool,
    /// Mirror reports to the external document store after local save.
    pub save_to_doc_store: bool,
    /// Local durable storage for all reports.
    pub reports_dir: PathBuf,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            status_filter: "NEW".to_string(),
            send_email_directly: false,
            save_to_doc_store: true,
            reports_dir: PathBuf::from("reports"),
        }
    }
}

/// Immutable dependencies passed to every stage execution.
pub struct PipelineDeps {
    pub llm: Arc<dyn LlmClient>,
    pub leads: Arc<dyn LeadSource>,
    pub docs: Arc<dyn DocumentStore>,
    pub scraper: Arc<dyn PageScraper>,
    pub news: Arc<dyn NewsSearcher>,
    pub channels: Arc<dyn ChannelStats>,
    pub mailer: Arc<dyn Mailer>,
    pub case_studies: Arc<dyn CaseStudyIndex>,
    pub linkedin: Arc<dyn crate::traits::LinkedInResearcher>,
    pub policy: RunPolicy,
}

impl PipelineDeps {
    /// Build production dependencies from config, around an
    /// already-constructed lead source.
    pub fn from_config(config: &Config, leads: Arc<dyn LeadSource>) -> Self {
        let search = Arc::new(SerperClient::new(config.serper_api_key.clone()));
        let llm = Arc::new(Claude::new(
            config.anthropic_api_key.clone(),
            config.model.clone(),
        ));

        Self {
            llm: llm.clone(),
            leads,
            docs: Arc::new(DocstoreClient::new(config.google_api_token.clone())),
            scraper: Arc::new(HttpScraper::new()),
            news: search.clone(),
            channels: Arc::new(YoutubeClient::new(config.youtube_api_key.clone())),
            mailer: Arc::new(GmailClient::new(config.gmail_api_token.clone())),
            case_studies: Arc::new(LocalCaseStudyIndex::new(
                config.case_study_dir.clone(),
                llm,
            )),
            linkedin: Arc::new(WebLinkedInResearcher::new(
                config.rapidapi_key.clone(),
                search,
            )),
            policy: RunPolicy {
                status_filter: "NEW".to_string(),
                send_email_directly: config.send_email_directly,
                save_to_doc_store: config.save_to_doc_store,
                reports_dir: config.reports_dir.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Trait adapters over the client modules
// ---------------------------------------------------------------------------

#[async_trait]
impl LlmClient for Claude {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        Claude::complete(self, system, user).await
    }

    async fn extract_json(
        &self,
        system: &str,
        user: &str,
        schema: serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.extract_with_schema(system, user, schema).await
    }
}

#[async_trait]
impl DocumentStore for DocstoreClient {
    async fn ensure_folder(&self, path: &str, shareable: bool) -> Result<(String, String)> {
        let folder = DocstoreClient::ensure_folder(self, path, shareable).await?;
        Ok((folder.id, folder.url))
    }

    async fn document_exists(&self, folder: &str, title: &str) -> Result<bool> {
        Ok(DocstoreClient::document_exists(self, folder, title).await?)
    }

    async fn create_document(
        &self,
        content: &str,
        title: &str,
        folder: &str,
        markdown: bool,
        shareable: bool,
    ) -> Result<StoredDocument> {
        let doc =
            DocstoreClient::create_document(self, content, title, folder, markdown, shareable)
                .await?;
        Ok(StoredDocument {
            document_url: doc.document_url,
            shareable_url: doc.shareable_url,
            folder_url: Some(doc.folder_url),
        })
    }

    async fn upload_file(
        &self,
        path: &Path,
        name: &str,
        folder: &str,
        shareable: bool,
    ) -> Result<String> {
        Ok(DocstoreClient::upload_file(self, path, name, folder, shareable).await?)
    }
}

#[async_trait]
impl NewsSearcher for SerperClient {
    async fn recent_news(&self, company: &str) -> Result<String> {
        let items = self.news(company, 10).await?;
        Ok(news_digest(&items))
    }
}

#[async_trait]
impl ChannelStats for YoutubeClient {
    async fn channel_digest(&self, channel_url: &str) -> Result<Option<String>> {
        let digest = YoutubeClient::channel_digest(self, channel_url).await?;
        Ok(Some(digest.to_string()))
    }
}

#[async_trait]
impl Mailer for GmailClient {
    async fn create_draft(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        Ok(GmailClient::create_draft(self, recipient, subject, body).await?)
    }

    async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        Ok(GmailClient::send_email(self, recipient, subject, body).await?)
    }
}

// ---------------------------------------------------------------------------
// Case-study retrieval
// ---------------------------------------------------------------------------

const PICK_CASE_STUDY: &str = "\
You are matching a sales case study to a research report. From the list
of case-study titles provided, respond with the single title that best
matches the report's industry and problem. Respond with the title only.";

/// Case studies as markdown files in a local directory; the best match
/// for a report is picked by the LLM from the file titles.
pub struct LocalCaseStudyIndex {
    dir: PathBuf,
    llm: Arc<dyn LlmClient>,
}

impl LocalCaseStudyIndex {
    pub fn new(dir: PathBuf, llm: Arc<dyn LlmClient>) -> Self {
        Self { dir, llm }
    }

    fn load_all(&self) -> Vec<(String, String)> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut studies = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let title = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            if let Ok(content) = std::fs::read_to_string(&path) {
                studies.push((title, content));
            }
        }
        studies.sort_by(|a, b| a.0.cmp(&b.0));
        studies
    }
}

#[async_trait]
impl CaseStudyIndex for LocalCaseStudyIndex {
    async fn similar_case_study(&self, research_report: &str) -> Result<String> {
        let studies = self.load_all();
        match studies.len() {
            0 => Ok("No case study available.".to_string()),
            1 => Ok(studies.into_iter().next().unwrap().1),
            _ => {
                let catalog = studies
                    .iter()
                    .map(|(title, _)| format!("- {title}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                let user = format!("# Report\n\n{research_report}\n\n# Case studies\n\n{catalog}");
                let picked = self.llm.complete(PICK_CASE_STUDY, &user).await?;
                let picked = picked.trim();

                let chosen = studies
                    .iter()
                    .find(|(title, _)| title == picked)
                    .or_else(|| studies.first())
                    .map(|(_, content)| content.clone())
                    .unwrap_or_default();
                info!(case_study = picked, "Selected case study");
                Ok(chosen)
            }
        }
    }
}
