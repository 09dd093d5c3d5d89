//! Stage implementations and graph wiring.

pub mod crm;
pub mod outreach;
pub mod presence;
pub mod qualify;
pub mod report;
pub mod research;
pub mod save;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use leadflow_common::LeadRecord;
use leadflow_engine::{EdgeTarget, Graph, GraphBuildError, GraphBuilder, Node};

use crate::deps::PipelineDeps;
use crate::queue::LeadQueue;
use crate::state::{Qualification, RunState, StateDelta};

/// Route out of the loop check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopDecision {
    NextLead,
    Done,
}

/// Pull the full backlog from the lead source, once per run.
/// A fetch failure is fatal to the run.
pub struct FetchLeads;

#[async_trait]
impl Node<RunState, PipelineDeps> for FetchLeads {
    fn name(&self) -> &str {
        "fetch_leads"
    }

    async fn run(&self, _state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let rows = deps
            .leads
            .fetch(&deps.policy.status_filter)
            .await
            .map_err(|e| leadflow_common::LeadFlowError::LeadSource(e.to_string()))?;

        let leads: Vec<LeadRecord> = rows.iter().map(LeadRecord::from_row).collect();
        info!(count = leads.len(), "Fetched leads");

        Ok(vec![StateDelta::QueueLoaded(LeadQueue::from_records(leads))])
    }
}

/// Pop the next lead (if any); the conditional edge out of this node
/// routes on the remaining count.
pub struct LoopCheck;

#[async_trait]
impl Node<RunState, PipelineDeps> for LoopCheck {
    fn name(&self) -> &str {
        "check_remaining"
    }

    async fn run(&self, state: &RunState, _deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        info!(remaining = state.queue.remaining(), "Checking for remaining leads");
        Ok(vec![StateDelta::NextLeadPopped])
    }
}

/// Fan-out anchor for the outreach branches.
pub struct CreateOutreach;

#[async_trait]
impl Node<RunState, PipelineDeps> for CreateOutreach {
    fn name(&self) -> &str {
        "create_outreach"
    }

    async fn run(&self, _state: &RunState, _deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        Ok(vec![])
    }
}

/// Assemble the full workflow graph.
///
/// ```text
/// fetch_leads → check_remaining ─(done)→ END
///                    │(next lead)
///                    ▼
///            linkedin_research → website_review
///                    ┌───────────────┼────────────────┐
///             blog_analysis  social_media_analysis  news_analysis
///                    └───────────────┼────────────────┘
///              digital_presence → global_report → score_lead → qualify_lead
///                    ┌───────────────┴(qualified)     │(not qualified)
///              create_outreach                        │
///        ┌───────────┼────────────────┐               │
///  outreach_report  personalized_email  interview_script
///        └───────────┼────────────────┘               │
///              save_reports → crm_update ←────────────┘
///                                  │
///                    check_remaining (loop)
/// ```
pub fn build_graph() -> Result<Graph<RunState, PipelineDeps>, GraphBuildError> {
    GraphBuilder::new()
        .add_node(FetchLeads)
        .add_node(LoopCheck)
        .add_node(research::LinkedInResearch)
        .add_node(research::WebsiteReview)
        .add_node(presence::BlogAnalysis)
        .add_node(presence::SocialMediaAnalysis)
        .add_node(presence::NewsAnalysis)
        .add_node(presence::DigitalPresence)
        .add_node(report::GlobalReport)
        .add_node(report::ScoreLead)
        .add_node(qualify::QualifyGate)
        .add_node(CreateOutreach)
        .add_node(outreach::OutreachReport)
        .add_node(outreach::PersonalizedEmail)
        .add_node(outreach::InterviewScript)
        .add_node(save::SaveReports)
        .add_node(crm::CrmUpdate)
        .entry("fetch_leads")
        .add_edge("fetch_leads", "check_remaining")
        .add_conditional_edge(
            "check_remaining",
            |state: &RunState| {
                if state.queue.has_next() {
                    LoopDecision::NextLead
                } else {
                    LoopDecision::Done
                }
            },
            vec![
                (LoopDecision::NextLead, EdgeTarget::node("linkedin_research")),
                (LoopDecision::Done, EdgeTarget::End),
            ],
        )
        .add_edge("linkedin_research", "website_review")
        .add_fanout(
            "website_review",
            &["blog_analysis", "social_media_analysis", "news_analysis"],
            "digital_presence",
        )
        .add_edge("digital_presence", "global_report")
        .add_edge("global_report", "score_lead")
        .add_edge("score_lead", "qualify_lead")
        .add_conditional_edge(
            "qualify_lead",
            qualify::route,
            vec![
                (Qualification::Qualified, EdgeTarget::node("create_outreach")),
                (Qualification::NotQualified, EdgeTarget::node("crm_update")),
            ],
        )
        .add_fanout(
            "create_outreach",
            &["outreach_report", "personalized_email", "interview_script"],
            "save_reports",
        )
        .add_edge("save_reports", "crm_update")
        .add_edge("crm_update", "check_remaining")
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_wires_without_errors() {
        build_graph().expect("graph should build");
    }
}
