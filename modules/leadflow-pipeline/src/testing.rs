//! Test mocks for the pipeline.
//!
//! One mock per collaborator trait, HashMap-backed with builder-style
//! `.on_*()` registration. [`MockWorld`] bundles them into a
//! [`PipelineDeps`] while keeping the Arcs around for assertions.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use leadflow_common::LeadRow;

use crate::deps::{PipelineDeps, RunPolicy};
use crate::traits::{
    CaseStudyIndex, ChannelStats, DocumentStore, LeadIdentity, LeadSource, LinkedInResearcher,
    LlmClient, Mailer, NewsSearcher, PageScraper, StoredDocument,
};

/// Build a raw lead row from header/value pairs.
pub fn lead_row(pairs: &[(&str, &str)]) -> LeadRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// MockLeadSource
// ---------------------------------------------------------------------------

/// Preset rows in, recorded updates out. Rows without an `id` get their
/// index, like the table loader.
pub struct MockLeadSource {
    rows: Vec<LeadRow>,
    fail_fetch: bool,
    pub updates: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl MockLeadSource {
    pub fn new(rows: Vec<LeadRow>) -> Self {
        Self {
            rows,
            fail_fetch: false,
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            rows: Vec::new(),
            fail_fetch: true,
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Last written value of a field for a lead id.
    pub fn field(&self, lead_id: &str, column: &str) -> Option<String> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == lead_id)
            .flat_map(|(_, fields)| fields.iter())
            .filter(|(col, _)| col == column)
            .map(|(_, value)| value.clone())
            .last()
    }
}

#[async_trait]
impl LeadSource for MockLeadSource {
    async fn fetch(&self, _status_filter: &str) -> Result<Vec<LeadRow>> {
        if self.fail_fetch {
            bail!("lead source unavailable");
        }
        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let mut row = row.clone();
                row.entry("id".to_string())
                    .or_insert_with(|| index.to_string());
                row
            })
            .collect())
    }

    async fn update(&self, lead_id: &str, fields: &[(String, String)]) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((lead_id.to_string(), fields.to_vec()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockLlm
// ---------------------------------------------------------------------------

/// Substring-matched canned responses. Completions fall back to a fixed
/// synthesis line; extractions fall back to schema-appropriate defaults
/// for the known structured types.
pub struct MockLlm {
    completions: Vec<(String, String)>,
    extracts: Vec<(String, Value)>,
}

impl MockLlm {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            completions: Vec::new(),
            extracts: Vec::new(),
        }
    }

    /// Respond with `response` when the system prompt contains `needle`.
    pub fn on_complete(mut self, needle: &str, response: &str) -> Self {
        self.completions.push((needle.to_string(), response.to_string()));
        self
    }

    pub fn on_extract(mut self, needle: &str, value: Value) -> Self {
        self.extracts.push((needle.to_string(), value));
        self
    }

    /// Shorthand: register the scoring response.
    pub fn scoring(self, score: &str) -> Self {
        self.on_complete("scoring", score)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, system: &str, _user: &str) -> Result<String> {
        for (needle, response) in &self.completions {
            if system.contains(needle) {
                return Ok(response.clone());
            }
        }
        Ok("Synthesized analysis.".to_string())
    }

    async fn extract_json(&self, system: &str, _user: &str, schema: Value) -> Result<Value> {
        for (needle, value) in &self.extracts {
            if system.contains(needle) {
                return Ok(value.clone());
            }
        }
        let properties = schema.get("properties").cloned().unwrap_or(Value::Null);
        if properties.get("subject").is_some() {
            return Ok(json!({ "subject": "Quick idea", "email": "Hi, a short note." }));
        }
        if properties.get("blog_url").is_some() {
            return Ok(json!({
                "summary": "", "blog_url": "", "youtube": "", "twitter": "", "facebook": ""
            }));
        }
        Err(anyhow!("MockLlm: no extraction registered for this prompt"))
    }
}

// ---------------------------------------------------------------------------
// MockDocumentStore
// ---------------------------------------------------------------------------

/// Stateful in-memory store: pre-seeded (folder, title) pairs plus a
/// record of everything created during the run.
pub struct MockDocumentStore {
    existing: Mutex<HashSet<(String, String)>>,
    fail_create: bool,
    pub created: Mutex<Vec<(String, String)>>,
    pub folders: Mutex<Vec<String>>,
}

impl MockDocumentStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            existing: Mutex::new(HashSet::new()),
            fail_create: false,
            created: Mutex::new(Vec::new()),
            folders: Mutex::new(Vec::new()),
        }
    }

    pub fn with_existing(self, folder: &str, title: &str) -> Self {
        self.existing
            .lock()
            .unwrap()
            .insert((folder.to_string(), title.to_string()));
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn created_titles(&self, folder: &str) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|(f, _)| f == folder)
            .map(|(_, title)| title.clone())
            .collect()
    }

    pub fn all_created_titles(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(_, title)| title.clone())
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn ensure_folder(&self, path: &str, _shareable: bool) -> Result<(String, String)> {
        self.folders.lock().unwrap().push(path.to_string());
        Ok((format!("id-{path}"), format!("https://store.mock/{path}")))
    }

    async fn document_exists(&self, folder: &str, title: &str) -> Result<bool> {
        let key = (folder.to_string(), title.to_string());
        Ok(self.existing.lock().unwrap().contains(&key)
            || self.created.lock().unwrap().contains(&key))
    }

    async fn create_document(
        &self,
        _content: &str,
        title: &str,
        folder: &str,
        _markdown: bool,
        shareable: bool,
    ) -> Result<StoredDocument> {
        if self.fail_create {
            bail!("store rejected document");
        }
        self.created
            .lock()
            .unwrap()
            .push((folder.to_string(), title.to_string()));
        Ok(StoredDocument {
            document_url: format!("https://store.mock/{folder}/{title}"),
            shareable_url: shareable.then(|| format!("https://store.mock/share/{title}")),
            folder_url: Some(format!("https://store.mock/{folder}")),
        })
    }

    async fn upload_file(
        &self,
        _path: &Path,
        name: &str,
        folder: &str,
        _shareable: bool,
    ) -> Result<String> {
        Ok(format!("https://store.mock/{folder}/{name}"))
    }
}

// ---------------------------------------------------------------------------
// Remaining collaborator mocks
// ---------------------------------------------------------------------------

/// URL → markdown map. Unregistered URLs fail, which exercises the
/// degraded-continue paths.
pub struct MockScraper {
    pages: HashMap<String, String>,
}

impl MockScraper {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    pub fn on_page(mut self, url: &str, content: &str) -> Self {
        self.pages.insert(url.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl PageScraper for MockScraper {
    async fn scrape_markdown(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("MockScraper: no page registered for {url}"))
    }
}

/// Fixed news digest, or an error when none is registered.
pub struct MockNews {
    digest: Option<String>,
}

impl MockNews {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { digest: None }
    }

    pub fn with_news(mut self, digest: &str) -> Self {
        self.digest = Some(digest.to_string());
        self
    }
}

#[async_trait]
impl NewsSearcher for MockNews {
    async fn recent_news(&self, company: &str) -> Result<String> {
        self.digest
            .clone()
            .ok_or_else(|| anyhow!("MockNews: no news registered for {company}"))
    }
}

/// Channel URL → digest map. `None` models "resolved but no data".
pub struct MockChannelStats {
    digests: HashMap<String, Option<String>>,
}

impl MockChannelStats {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            digests: HashMap::new(),
        }
    }

    pub fn on_channel(mut self, url: &str, digest: Option<&str>) -> Self {
        self.digests
            .insert(url.to_string(), digest.map(str::to_string));
        self
    }
}

#[async_trait]
impl ChannelStats for MockChannelStats {
    async fn channel_digest(&self, channel_url: &str) -> Result<Option<String>> {
        self.digests
            .get(channel_url)
            .cloned()
            .ok_or_else(|| anyhow!("MockChannelStats: no channel registered for {channel_url}"))
    }
}

/// Records drafts and sends.
pub struct MockMailer {
    pub drafts: Mutex<Vec<(String, String, String)>>,
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl MockMailer {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            drafts: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn draft_count(&self) -> usize {
        self.drafts.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn create_draft(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        self.drafts.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }

    async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        self.sent.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

/// Fixed case study.
pub struct MockCaseStudies;

#[async_trait]
impl CaseStudyIndex for MockCaseStudies {
    async fn similar_case_study(&self, _research_report: &str) -> Result<String> {
        Ok("Mock case study: similar company, similar outcome.".to_string())
    }
}

/// Name-keyed identities. Unregistered leads resolve to a minimal
/// identity with no company facts, so company name and website fall back
/// to whatever the lead row carried.
pub struct MockLinkedIn {
    identities: HashMap<String, LeadIdentity>,
    company_profiles: HashMap<String, String>,
}

impl MockLinkedIn {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            identities: HashMap::new(),
            company_profiles: HashMap::new(),
        }
    }

    pub fn on_lead(mut self, name: &str, identity: LeadIdentity) -> Self {
        self.identities.insert(name.to_string(), identity);
        self
    }

    pub fn on_company(mut self, linkedin_url: &str, profile: &str) -> Self {
        self.company_profiles
            .insert(linkedin_url.to_string(), profile.to_string());
        self
    }
}

#[async_trait]
impl LinkedInResearcher for MockLinkedIn {
    async fn research_lead(&self, name: &str, _email: &str) -> Result<LeadIdentity> {
        Ok(self.identities.get(name).cloned().unwrap_or(LeadIdentity {
            profile: format!("{name} is a decision maker."),
            ..Default::default()
        }))
    }

    async fn research_company(&self, company_linkedin_url: &str) -> Result<String> {
        Ok(self
            .company_profiles
            .get(company_linkedin_url)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockWorld
// ---------------------------------------------------------------------------

/// The full fake external world for a pipeline run. Collaborators can be
/// swapped with the builder methods; the Arcs stay available for
/// assertions after the run.
pub struct MockWorld {
    pub leads: Arc<MockLeadSource>,
    pub docs: Arc<MockDocumentStore>,
    pub mailer: Arc<MockMailer>,
    llm: Arc<MockLlm>,
    scraper: Arc<MockScraper>,
    news: Arc<MockNews>,
    channels: Arc<MockChannelStats>,
    linkedin: Arc<MockLinkedIn>,
}

impl MockWorld {
    /// A world with the given lead rows and a default score of 7.5 so
    /// the happy path runs end to end.
    pub fn new(rows: Vec<LeadRow>) -> Self {
        Self {
            leads: Arc::new(MockLeadSource::new(rows)),
            docs: Arc::new(MockDocumentStore::new()),
            mailer: Arc::new(MockMailer::new()),
            llm: Arc::new(MockLlm::new().scoring("7.5")),
            scraper: Arc::new(MockScraper::new()),
            news: Arc::new(MockNews::new()),
            channels: Arc::new(MockChannelStats::new()),
            linkedin: Arc::new(MockLinkedIn::new()),
        }
    }

    pub fn llm(mut self, llm: MockLlm) -> Self {
        self.llm = Arc::new(llm);
        self
    }

    pub fn leads(mut self, leads: MockLeadSource) -> Self {
        self.leads = Arc::new(leads);
        self
    }

    pub fn docs(mut self, docs: MockDocumentStore) -> Self {
        self.docs = Arc::new(docs);
        self
    }

    pub fn scraper(mut self, scraper: MockScraper) -> Self {
        self.scraper = Arc::new(scraper);
        self
    }

    pub fn news(mut self, news: MockNews) -> Self {
        self.news = Arc::new(news);
        self
    }

    pub fn channels(mut self, channels: MockChannelStats) -> Self {
        self.channels = Arc::new(channels);
        self
    }

    pub fn linkedin(mut self, linkedin: MockLinkedIn) -> Self {
        self.linkedin = Arc::new(linkedin);
        self
    }

    pub fn deps(&self, policy: RunPolicy) -> PipelineDeps {
        PipelineDeps {
            llm: self.llm.clone(),
            leads: self.leads.clone(),
            docs: self.docs.clone(),
            scraper: self.scraper.clone(),
            news: self.news.clone(),
            channels: self.channels.clone(),
            mailer: self.mailer.clone(),
            case_studies: Arc::new(MockCaseStudies),
            linkedin: self.linkedin.clone(),
            policy,
        }
    }
}

/// Bare deps for unit tests that only need something to pass in.
pub fn mock_deps() -> PipelineDeps {
    MockWorld::new(Vec::new()).deps(RunPolicy {
        reports_dir: std::env::temp_dir().join("leadflow-test-reports"),
        ..Default::default()
    })
}
