//! Sequential research stages: LinkedIn identity, then website review.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

use leadflow_common::Report;
use leadflow_engine::Node;

use crate::deps::PipelineDeps;
use crate::prompts;
use crate::state::{titles, RunState, StateDelta};
use crate::structured::{extract, WebsiteIntel};

/// Resolve the lead's identity on LinkedIn: seeds the company name and
/// website, the lead's profile narrative, and the per-lead storage
/// folder. Folder creation is best-effort; a failure there never
/// aborts the lead.
pub struct LinkedInResearch;

#[async_trait]
impl Node<RunState, PipelineDeps> for LinkedInResearch {
    fn name(&self) -> &str {
        "linkedin_research"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let lead = state.lead()?;
        info!(lead = %lead.name, "Researching lead on LinkedIn");

        let identity = deps.linkedin.research_lead(&lead.name, &lead.email).await?;
        let company_narrative = deps
            .linkedin
            .research_company(&identity.company_linkedin_url)
            .await?;

        let mut company = state.company.clone();
        company.name = if identity.company_name.is_empty() {
            lead.company.clone()
        } else {
            identity.company_name.clone()
        };
        company.website = if identity.company_website.is_empty() {
            lead.website.clone()
        } else {
            identity.company_website.clone()
        };
        company.append_profile(&company_narrative);

        // Stable per-lead folder, derived from lead and company names.
        let leaf = format!("{}_{}", lead.name, company.name)
            .trim()
            .replace('/', "_");
        let folder = format!("Lead_Reports/{leaf}");
        if let Err(e) = deps.docs.ensure_folder(&folder, true).await {
            error!(folder = %folder, error = %e, "Could not create or access report folder");
        }

        Ok(vec![
            StateDelta::LeadProfileUpdated(identity.profile),
            StateDelta::CompanyUpdated(company),
            StateDelta::ReportFolder(folder),
        ])
    }
}

/// Scrape and analyze the company website, extract social links, and
/// produce the general research report. An empty scrape skips the LLM
/// analysis and falls back to empty website intel.
pub struct WebsiteReview;

#[async_trait]
impl Node<RunState, PipelineDeps> for WebsiteReview {
    fn name(&self) -> &str {
        "website_review"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let lead = state.lead()?;
        let mut company = state.company.clone();

        if !company.website.is_empty() {
            let content = match deps.scraper.scrape_markdown(&company.website).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(website = %company.website, error = %e, "Website scrape failed");
                    String::new()
                }
            };

            let intel = if content.trim().is_empty() {
                // Nothing to analyze: use empty defaults instead of
                // invoking the model on an empty page.
                WebsiteIntel::default()
            } else {
                let system =
                    prompts::WEBSITE_ANALYSIS.replace("{main_url}", &company.website);
                extract::<WebsiteIntel>(deps.llm.as_ref(), &system, &content).await?
            };

            company.social.blog = intel.blog_url;
            company.social.youtube = intel.youtube;
            company.social.twitter = intel.twitter;
            company.social.facebook = intel.facebook;
            company.append_profile(&intel.summary);
        }

        let inputs = format!(
            "# **Lead Profile:**\n\n{}\n\n# **Company Information:**\n\n{}",
            lead.profile, company.profile
        );
        let report = deps
            .llm
            .complete(prompts::LEAD_SEARCH_REPORT, &inputs)
            .await?;

        Ok(vec![
            StateDelta::CompanyUpdated(company),
            StateDelta::ReportAdded(Report::markdown(titles::GENERAL_RESEARCH, report)),
        ])
    }
}
