//! Outreach collateral branches, entered only for qualified leads.
//!
//! The three branches run concurrently on the same snapshot; none may
//! rely on a sibling's output being visible.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use leadflow_common::Report;
use leadflow_engine::Node;

use crate::deps::PipelineDeps;
use crate::prompts;
use crate::state::{report_text, titles, RunState, StateDelta};
use crate::structured::{extract, EmailDraft};

/// Canonical links substituted into the final outreach report. The
/// proof-read pass replaces whatever the draft invented with these.
pub const CANONICAL_LINKS: &[(&str, &str)] = &[
    ("Our website link", "https://www.leadflow.dev"),
    ("Case study link", "https://www.leadflow.dev/case-studies"),
];

/// Draft an outreach report from the research plus the closest case
/// study, proof-read it against the canonical link table, and persist it
/// to the per-lead folder immediately. Persistence failure clears both
/// recorded URLs instead of raising.
pub struct OutreachReport;

#[async_trait]
impl Node<RunState, PipelineDeps> for OutreachReport {
    fn name(&self) -> &str {
        "outreach_report"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let general_report = report_text(&state.reports, titles::GENERAL_RESEARCH);
        let global_report = report_text(&state.reports, titles::GLOBAL_ANALYSIS);

        let case_study = match deps.case_studies.similar_case_study(general_report).await {
            Ok(case_study) => case_study,
            Err(e) => {
                warn!(error = %e, "Case-study lookup failed");
                format!("Case study could not be retrieved: {e}")
            }
        };

        let inputs = format!(
            "**Research Report:**\n\n{global_report}\n\n---\n\n**Case Study:**\n\n{case_study}"
        );
        let draft = deps
            .llm
            .complete(prompts::GENERATE_OUTREACH_REPORT, &inputs)
            .await?;

        let links = CANONICAL_LINKS
            .iter()
            .map(|(label, url)| format!("** {label}**: {url}"))
            .collect::<Vec<_>>()
            .join("\n");
        let revision_inputs = format!("{draft}\n\n---\n\n**Correct Links:**\n\n{links}");
        let revised = deps
            .llm
            .complete(prompts::PROOF_READER, &revision_inputs)
            .await?;

        let stored = deps
            .docs
            .create_document(
                &revised,
                titles::OUTREACH_REPORT,
                &state.report_folder,
                true,
                true,
            )
            .await;

        let (report_url, folder_url) = match stored {
            Ok(doc) => (doc.shareable_url, doc.folder_url),
            Err(e) => {
                warn!(folder = %state.report_folder, error = %e, "Failed to persist outreach report");
                (None, None)
            }
        };

        Ok(vec![StateDelta::OutreachLinks {
            report_url,
            folder_url,
        }])
    }
}

/// Personalized email: structured subject+body, drafted in the outreach
/// mailbox, optionally sent immediately, and kept as an audit report.
pub struct PersonalizedEmail;

#[async_trait]
impl Node<RunState, PipelineDeps> for PersonalizedEmail {
    fn name(&self) -> &str {
        "personalized_email"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let lead = state.lead()?;
        info!(lead = %lead.name, "Generating personalized email");

        let inputs = format!(
            "# **Lead & company Information:**\n\n{}\n\n# Outreach report link:\n\n{}",
            report_text(&state.reports, titles::GENERAL_RESEARCH),
            state.outreach_report_url.as_deref().unwrap_or(""),
        );
        let draft: EmailDraft =
            extract(deps.llm.as_ref(), prompts::PERSONALIZE_EMAIL, &inputs).await?;

        if let Err(e) = deps
            .mailer
            .create_draft(&lead.email, &draft.subject, &draft.email)
            .await
        {
            warn!(recipient = %lead.email, error = %e, "Failed to create draft email");
        }

        if deps.policy.send_email_directly {
            if let Err(e) = deps
                .mailer
                .send_email(&lead.email, &draft.subject, &draft.email)
                .await
            {
                warn!(recipient = %lead.email, error = %e, "Failed to send email");
            }
        }

        Ok(vec![StateDelta::ReportAdded(Report::plain(
            titles::PERSONALIZED_EMAIL,
            draft.email,
        ))])
    }
}

/// Interview script: SPIN questions first, then a second pass expands
/// them into a full script.
pub struct InterviewScript;

#[async_trait]
impl Node<RunState, PipelineDeps> for InterviewScript {
    fn name(&self) -> &str {
        "interview_script"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let global_report = report_text(&state.reports, titles::GLOBAL_ANALYSIS);

        let questions = deps
            .llm
            .complete(prompts::GENERATE_SPIN_QUESTIONS, global_report)
            .await?;

        let inputs = format!(
            "# **Lead & company Information:**\n\n{global_report}\n\n# **SPIN questions:**\n\n{questions}"
        );
        let script = deps
            .llm
            .complete(prompts::WRITE_INTERVIEW_SCRIPT, &inputs)
            .await?;

        Ok(vec![StateDelta::ReportAdded(Report::markdown(
            titles::INTERVIEW_SCRIPT,
            script,
        ))])
    }
}
