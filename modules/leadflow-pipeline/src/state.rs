//! Per-run workflow state and its merge rules.
//!
//! Stages never touch `RunState` directly: each returns a list of
//! [`StateDelta`]s and the engine folds them in via [`GraphState::apply`].
//! Fan-out branches only emit append-style deltas (`ReportAdded`), which
//! commute, so branch merge order carries no meaning.

use std::collections::HashSet;

use leadflow_common::{CompanyProfile, LeadRecord, Report};
use leadflow_engine::GraphState;

use crate::queue::LeadQueue;

/// Report titles used for cross-stage lookup. A missing title reads as
/// empty text, never as an error.
pub mod titles {
    pub const GENERAL_RESEARCH: &str = "General Lead Research Report";
    pub const BLOG: &str = "Blog Analysis Report";
    pub const FACEBOOK: &str = "Facebook Analysis Report";
    pub const TWITTER: &str = "Twitter Analysis Report";
    pub const YOUTUBE: &str = "Youtube Analysis Report";
    pub const NEWS: &str = "News Analysis Report";
    pub const DIGITAL_PRESENCE: &str = "Digital Presence Report";
    pub const GLOBAL_ANALYSIS: &str = "Global Lead Analysis Report";
    pub const OUTREACH_REPORT: &str = "Outreach Report";
    pub const PERSONALIZED_EMAIL: &str = "Personalized Email";
    pub const INTERVIEW_SCRIPT: &str = "Interview Script";
}

/// Outcome of the qualification gate. A closed variant, not free text:
/// routing can only ever match one of these two arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    Qualified,
    NotQualified,
}

/// The mutable context of one run, threaded through every stage.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub queue: LeadQueue,
    /// Exactly one lead is current at any time during a traversal.
    pub current_lead: Option<LeadRecord>,
    pub company: CompanyProfile,
    /// Append-only within a lead's window; cleared when its CRM update
    /// completes.
    pub reports: Vec<Report>,
    /// Numeric-as-string until the gate parses it.
    pub lead_score: String,
    pub qualification: Option<Qualification>,
    /// Document-store folder for the current lead (`Lead_Reports/...`).
    pub report_folder: String,
    pub outreach_report_url: Option<String>,
    pub reports_folder_url: Option<String>,
    /// Folders already persisted to the store this run.
    pub saved_folders: HashSet<String>,
    pub stats: RunStats,
}

/// One state mutation emitted by a stage.
#[derive(Debug, Clone)]
pub enum StateDelta {
    QueueLoaded(LeadQueue),
    /// Pop the next lead (if any) into `current_lead` and reset all
    /// per-lead fields for its traversal.
    NextLeadPopped,
    CompanyUpdated(CompanyProfile),
    /// Append research narrative to the current lead's profile.
    LeadProfileUpdated(String),
    ReportFolder(String),
    ReportAdded(Report),
    Score(String),
    Qualified(Qualification),
    OutreachLinks {
        report_url: Option<String>,
        folder_url: Option<String>,
    },
    FolderPersisted(String),
    SaveOutcome {
        local: u32,
        mirrored: u32,
        skipped_existing: u32,
    },
    ReportsCleared,
    /// The current lead's CRM update finished: decrement remaining.
    LeadCompleted,
    /// The current lead was abandoned by a lead-scoped failure: decrement
    /// remaining without a CRM write.
    LeadAbandoned,
}

impl GraphState for RunState {
    type Update = Vec<StateDelta>;

    fn apply(&mut self, update: Vec<StateDelta>) {
        for delta in update {
            self.apply_delta(delta);
        }
    }
}

impl RunState {
    fn apply_delta(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::QueueLoaded(queue) => self.queue = queue,
            StateDelta::NextLeadPopped => {
                self.current_lead = self.queue.pop_next();
                self.company = CompanyProfile::default();
                self.lead_score = String::new();
                self.qualification = None;
                self.report_folder = String::new();
                self.outreach_report_url = None;
                self.reports_folder_url = None;
            }
            StateDelta::CompanyUpdated(company) => self.company = company,
            StateDelta::LeadProfileUpdated(profile) => {
                if let Some(lead) = self.current_lead.as_mut() {
                    lead.profile = profile;
                }
            }
            StateDelta::ReportFolder(folder) => self.report_folder = folder,
            StateDelta::ReportAdded(report) => {
                self.reports = merge_reports(std::mem::take(&mut self.reports), vec![report]);
            }
            StateDelta::Score(score) => self.lead_score = score,
            StateDelta::Qualified(q) => {
                if q == Qualification::Qualified {
                    self.stats.leads_qualified += 1;
                }
                self.qualification = Some(q);
            }
            StateDelta::OutreachLinks {
                report_url,
                folder_url,
            } => {
                self.outreach_report_url = report_url;
                self.reports_folder_url = folder_url;
            }
            StateDelta::FolderPersisted(folder) => {
                self.saved_folders.insert(folder);
            }
            StateDelta::SaveOutcome {
                local,
                mirrored,
                skipped_existing,
            } => {
                self.stats.reports_saved_locally += local;
                self.stats.reports_mirrored += mirrored;
                self.stats.reports_skipped_existing += skipped_existing;
            }
            StateDelta::ReportsCleared => self.reports.clear(),
            StateDelta::LeadCompleted => {
                self.queue.mark_completed();
                self.stats.leads_processed += 1;
                self.current_lead = None;
            }
            StateDelta::LeadAbandoned => {
                self.queue.mark_completed();
                self.stats.leads_failed += 1;
                self.current_lead = None;
            }
        }
    }

    /// The current lead, or a lead-scoped error when none is active.
    pub fn lead(&self) -> anyhow::Result<&LeadRecord> {
        self.current_lead
            .as_ref()
            .ok_or_else(|| leadflow_common::LeadFlowError::NoCurrentLead.into())
    }
}

/// Commutative report merge: append `incoming` to `existing`. Dedup is
/// deferred to the save stage so within-window accumulation stays
/// append-only.
pub fn merge_reports(mut existing: Vec<Report>, incoming: Vec<Report>) -> Vec<Report> {
    existing.extend(incoming);
    existing
}

/// Look up a report by exact title. Missing reports read as empty text.
pub fn report_text<'a>(reports: &'a [Report], title: &str) -> &'a str {
    reports
        .iter()
        .find(|r| r.title == title)
        .map(|r| r.content.as_str())
        .unwrap_or("")
}

/// First occurrence per title wins; later duplicates are dropped.
pub fn dedupe_by_title(reports: &[Report]) -> Vec<Report> {
    let mut seen = HashSet::new();
    reports
        .iter()
        .filter(|r| !r.title.is_empty() && seen.insert(r.title.clone()))
        .cloned()
        .collect()
}

/// Aggregated run metrics.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub leads_processed: u32,
    pub leads_failed: u32,
    pub leads_qualified: u32,
    pub reports_saved_locally: u32,
    pub reports_mirrored: u32,
    pub reports_skipped_existing: u32,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Outreach Run Complete ===")?;
        writeln!(f, "Leads processed:    {}", self.leads_processed)?;
        writeln!(f, "Leads failed:       {}", self.leads_failed)?;
        writeln!(f, "Leads qualified:    {}", self.leads_qualified)?;
        writeln!(f, "Reports saved:      {} (local)", self.reports_saved_locally)?;
        writeln!(f, "Reports mirrored:   {}", self.reports_mirrored)?;
        writeln!(f, "Reports skipped:    {} (already in store)", self.reports_skipped_existing)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(title: &str, content: &str) -> Report {
        Report::markdown(title, content)
    }

    #[test]
    fn merge_appends_without_replacing() {
        let merged = merge_reports(
            vec![report(titles::GENERAL_RESEARCH, "a")],
            vec![report(titles::NEWS, "b")],
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title, titles::GENERAL_RESEARCH);
    }

    #[test]
    fn missing_report_reads_as_empty() {
        let reports = vec![report(titles::NEWS, "news text")];
        assert_eq!(report_text(&reports, titles::NEWS), "news text");
        assert_eq!(report_text(&reports, titles::BLOG), "");
    }

    #[test]
    fn dedupe_keeps_first_occurrence_per_title() {
        let reports = vec![
            report(titles::NEWS, "first"),
            report(titles::BLOG, "blog"),
            report(titles::NEWS, "second"),
        ];
        let unique = dedupe_by_title(&reports);
        assert_eq!(unique.len(), 2);
        assert_eq!(report_text(&unique, titles::NEWS), "first");
    }

    #[test]
    fn popping_next_lead_resets_per_lead_fields() {
        let mut state = RunState::default();
        state.apply(vec![StateDelta::QueueLoaded(LeadQueue::from_records(vec![
            LeadRecord {
                id: "1".into(),
                ..Default::default()
            },
        ]))]);
        state.lead_score = "7".into();
        state.report_folder = "Lead_Reports/old".into();
        state.qualification = Some(Qualification::Qualified);

        state.apply(vec![StateDelta::NextLeadPopped]);
        assert_eq!(state.lead().unwrap().id, "1");
        assert!(state.lead_score.is_empty());
        assert!(state.report_folder.is_empty());
        assert!(state.qualification.is_none());
    }

    #[test]
    fn lead_completion_decrements_remaining_and_clears_current() {
        let mut state = RunState::default();
        state.apply(vec![StateDelta::QueueLoaded(LeadQueue::from_records(vec![
            LeadRecord::default(),
        ]))]);
        state.apply(vec![StateDelta::NextLeadPopped]);
        state.apply(vec![StateDelta::ReportsCleared, StateDelta::LeadCompleted]);

        assert_eq!(state.queue.remaining(), 0);
        assert!(state.current_lead.is_none());
        assert_eq!(state.stats.leads_processed, 1);
    }
}
