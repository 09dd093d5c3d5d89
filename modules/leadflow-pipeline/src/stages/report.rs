//! Global synthesis and scoring.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use leadflow_common::Report;
use leadflow_engine::Node;

use crate::deps::PipelineDeps;
use crate::prompts;
use crate::state::{report_text, titles, RunState, StateDelta};

/// Combine the general research and digital-presence reports into the
/// global analysis report.
pub struct GlobalReport;

#[async_trait]
impl Node<RunState, PipelineDeps> for GlobalReport {
    fn name(&self) -> &str {
        "global_report"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        info!(company = %state.company.name, "Generating global lead analysis report");

        let inputs = format!(
            "# **Lead & company Information:**\n\n{}\n\n---\n\n\
             # **Digital Presence Information:**\n\n{}",
            report_text(&state.reports, titles::GENERAL_RESEARCH),
            report_text(&state.reports, titles::DIGITAL_PRESENCE),
        );

        let system = prompts::GLOBAL_LEAD_RESEARCH_REPORT
            .replace("{company_name}", &state.company.name)
            .replace("{date}", &Utc::now().format("%Y-%m-%d").to_string());
        let full_report = deps.llm.complete(&system, &inputs).await?;

        Ok(vec![StateDelta::ReportAdded(Report::markdown(
            titles::GLOBAL_ANALYSIS,
            full_report,
        ))])
    }
}

/// Score the lead from the global analysis report. The score stays a
/// trimmed string here; the qualification gate parses it.
pub struct ScoreLead;

#[async_trait]
impl Node<RunState, PipelineDeps> for ScoreLead {
    fn name(&self) -> &str {
        "score_lead"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let global_report = report_text(&state.reports, titles::GLOBAL_ANALYSIS);
        let score = deps.llm.complete(prompts::SCORE_LEAD, global_report).await?;
        let score = score.trim().to_string();
        info!(score = %score, "Lead scored");

        Ok(vec![StateDelta::Score(score)])
    }
}
