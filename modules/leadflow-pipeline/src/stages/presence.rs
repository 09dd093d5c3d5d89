//! Digital-presence fan-out branches and their fan-in synthesis.
//!
//! The three branches run concurrently with no data dependency between
//! them; each produces zero or one report. A failed external call inside
//! a branch substitutes a descriptive placeholder as that branch's
//! analysis input instead of aborting the fan-out.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use leadflow_common::Report;
use leadflow_engine::Node;

use crate::deps::PipelineDeps;
use crate::prompts;
use crate::state::{report_text, titles, RunState, StateDelta};

/// Months of news coverage the analysis is asked to consider.
const NEWS_WINDOW_MONTHS: u32 = 6;

fn current_date() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Analyze the company blog, if the website review found one.
pub struct BlogAnalysis;

#[async_trait]
impl Node<RunState, PipelineDeps> for BlogAnalysis {
    fn name(&self) -> &str {
        "blog_analysis"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let blog_url = &state.company.social.blog;
        if blog_url.is_empty() {
            return Ok(vec![]);
        }

        let content = match deps.scraper.scrape_markdown(blog_url).await {
            Ok(content) if !content.trim().is_empty() => content,
            Ok(_) => {
                warn!(blog_url = %blog_url, "Blog scrape returned no content");
                "Blog content could not be retrieved: page was empty.".to_string()
            }
            Err(e) => {
                warn!(blog_url = %blog_url, error = %e, "Blog scrape failed");
                format!("Blog content could not be retrieved: {e}")
            }
        };

        let system = prompts::BLOG_ANALYSIS.replace("{company_name}", &state.company.name);
        let insight = deps.llm.complete(&system, &content).await?;

        Ok(vec![StateDelta::ReportAdded(Report::markdown(
            titles::BLOG,
            insight,
        ))])
    }
}

/// Analyze social channels. Only the video platform is implemented;
/// Facebook and Twitter URLs are captured in the profile but produce no
/// report yet.
pub struct SocialMediaAnalysis;

#[async_trait]
impl Node<RunState, PipelineDeps> for SocialMediaAnalysis {
    fn name(&self) -> &str {
        "social_media_analysis"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let youtube_url = &state.company.social.youtube;
        if youtube_url.is_empty() {
            return Ok(vec![]);
        }

        let channel_data = match deps.channels.channel_digest(youtube_url).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                warn!(youtube_url = %youtube_url, "Skipping channel analysis: no data returned");
                "Skipping channel analysis: no data returned.".to_string()
            }
            Err(e) => {
                warn!(youtube_url = %youtube_url, error = %e, "Skipping channel analysis due to error");
                format!("Skipping channel analysis due to error: {e}")
            }
        };

        let system = prompts::YOUTUBE_ANALYSIS.replace("{company_name}", &state.company.name);
        let insight = deps.llm.complete(&system, &channel_data).await?;

        Ok(vec![StateDelta::ReportAdded(Report::markdown(
            titles::YOUTUBE,
            insight,
        ))])
    }
}

/// Analyze recent news. Runs unconditionally.
pub struct NewsAnalysis;

#[async_trait]
impl Node<RunState, PipelineDeps> for NewsAnalysis {
    fn name(&self) -> &str {
        "news_analysis"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let company = &state.company.name;
        let recent_news = match deps.news.recent_news(company).await {
            Ok(news) => news,
            Err(e) => {
                warn!(company = %company, error = %e, "News search failed");
                format!("Recent news could not be retrieved: {e}")
            }
        };

        let system = prompts::NEWS_ANALYSIS
            .replace("{company_name}", company)
            .replace("{date}", &current_date())
            .replace("{number_months}", &NEWS_WINDOW_MONTHS.to_string());
        let insight = deps.llm.complete(&system, &recent_news).await?;

        Ok(vec![StateDelta::ReportAdded(Report::markdown(
            titles::NEWS,
            insight,
        ))])
    }
}

/// Fan-in synthesis: combine whatever the branches produced into the
/// digital-presence report. Missing branch reports read as empty text.
pub struct DigitalPresence;

#[async_trait]
impl Node<RunState, PipelineDeps> for DigitalPresence {
    fn name(&self) -> &str {
        "digital_presence"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        info!(company = %state.company.name, "Generating digital presence report");

        let inputs = format!(
            "# **Digital Presence Data:**\n\
             ## **Blog Information:**\n\n{}\n\n\
             ## **Facebook Information:**\n\n{}\n\n\
             ## **Twitter Information:**\n\n{}\n\n\
             ## **Youtube Information:**\n\n{}\n\n\
             # **Recent News:**\n\n{}",
            report_text(&state.reports, titles::BLOG),
            report_text(&state.reports, titles::FACEBOOK),
            report_text(&state.reports, titles::TWITTER),
            report_text(&state.reports, titles::YOUTUBE),
            report_text(&state.reports, titles::NEWS),
        );

        let system = prompts::DIGITAL_PRESENCE_REPORT
            .replace("{company_name}", &state.company.name)
            .replace("{date}", &current_date());
        let synthesis = deps.llm.complete(&system, &inputs).await?;

        Ok(vec![StateDelta::ReportAdded(Report::markdown(
            titles::DIGITAL_PRESENCE,
            synthesis,
        ))])
    }
}
