//! Chain tests: full pipeline runs against mocks.
//!
//! Each test follows MOCK → FUNCTION → OUTPUT: set up the fake external
//! world, run the actual pipeline, assert on what it wrote where.

use leadflow_engine::EngineError;
use leadflow_engine::GraphState;

use crate::deps::RunPolicy;
use crate::run::run_pipeline;
use crate::stages::save::SaveReports;
use crate::state::{titles, RunState, StateDelta};
use crate::testing::*;
use crate::traits::LeadIdentity;

fn policy(dir: &tempfile::TempDir) -> RunPolicy {
    RunPolicy {
        reports_dir: dir.path().to_path_buf(),
        ..Default::default()
    }
}

fn jane() -> leadflow_common::LeadRow {
    lead_row(&[("NAME", "Jane Doe"), ("EMAIL", "jane@acme.com")])
}

fn jane_identity() -> LeadIdentity {
    LeadIdentity {
        profile: "Jane Doe, CTO at Acme.".into(),
        company_name: "Acme".into(),
        company_website: "acme.com".into(),
        company_linkedin_url: "https://linkedin.com/company/acme".into(),
    }
}

const JANE_FOLDER: &str = "Lead_Reports/Jane Doe_Acme";

// ---------------------------------------------------------------------------
// Loop accounting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_leads_without_status_column_all_get_crm_updates() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![
        lead_row(&[("NAME", "Jane Doe"), ("EMAIL", "jane@acme.com")]),
        lead_row(&[("NAME", "Ken Ito"), ("EMAIL", "ken@initech.com")]),
        lead_row(&[("NAME", "Ana Ruiz"), ("EMAIL", "ana@globex.com")]),
    ]);
    let deps = world.deps(policy(&dir));

    let state = run_pipeline(&deps, 1000).await.unwrap();

    // Every lead got exactly one CRM update and the queue drained fully.
    assert_eq!(world.leads.update_count(), 3);
    assert_eq!(state.queue.remaining(), 0);
    assert_eq!(state.stats.leads_processed, 3);
    for id in ["0", "1", "2"] {
        assert_eq!(world.leads.field(id, "STATUS").as_deref(), Some("CONTACTED"));
        assert_eq!(world.leads.field(id, "LEAD_SCORE").as_deref(), Some("7.5"));
        assert_eq!(world.leads.field(id, "QUALIFIED").as_deref(), Some("YES"));
    }
}

#[tokio::test]
async fn lead_source_failure_is_fatal_to_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(Vec::new()).leads(MockLeadSource::failing());
    let deps = world.deps(policy(&dir));

    let err = run_pipeline(&deps, 1000).await.unwrap_err();
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::Node { node, .. }) => assert_eq!(node, "fetch_leads"),
        other => panic!("expected fetch_leads failure, got {other:?}"),
    }
}

#[tokio::test]
async fn step_ceiling_is_a_fatal_error_not_a_hang() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![jane()]);
    let deps = world.deps(policy(&dir));

    let err = run_pipeline(&deps, 3).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EngineError>(),
        Some(EngineError::StepCeiling { ceiling: 3, .. })
    ));
}

// ---------------------------------------------------------------------------
// Qualification routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unqualified_lead_gets_no_outreach_collateral() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![jane()]).llm(MockLlm::new().scoring("2.0"));
    let deps = world.deps(policy(&dir));

    run_pipeline(&deps, 1000).await.unwrap();

    assert_eq!(world.mailer.draft_count(), 0);
    let created = world.docs.all_created_titles();
    assert!(!created.contains(&titles::OUTREACH_REPORT.to_string()));
    assert!(!created.contains(&titles::PERSONALIZED_EMAIL.to_string()));
    assert!(!created.contains(&titles::INTERVIEW_SCRIPT.to_string()));
    assert_eq!(world.leads.field("0", "QUALIFIED").as_deref(), Some("NO"));
    // Research reports still got mirrored.
    assert!(created.contains(&titles::GENERAL_RESEARCH.to_string()));
}

#[tokio::test]
async fn qualified_lead_produces_all_three_collateral_pieces() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![jane()])
        .linkedin(MockLinkedIn::new().on_lead("Jane Doe", jane_identity()));
    let deps = world.deps(policy(&dir));

    run_pipeline(&deps, 1000).await.unwrap();

    assert_eq!(world.mailer.draft_count(), 1);
    let created = world.docs.created_titles(JANE_FOLDER);
    assert!(created.contains(&titles::OUTREACH_REPORT.to_string()));
    let lead_dir = dir.path().join("Jane Doe_Acme");
    assert!(lead_dir.join("Personalized Email.txt").exists());
    assert!(lead_dir.join("Interview Script.md").exists());
}

#[tokio::test]
async fn email_drafts_are_not_sent_unless_policy_allows() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![jane()]);
    let deps = world.deps(policy(&dir));
    run_pipeline(&deps, 1000).await.unwrap();
    assert_eq!(world.mailer.draft_count(), 1);
    assert!(world.mailer.sent.lock().unwrap().is_empty());

    let dir2 = tempfile::tempdir().unwrap();
    let world2 = MockWorld::new(vec![jane()]);
    let deps2 = world2.deps(RunPolicy {
        send_email_directly: true,
        reports_dir: dir2.path().to_path_buf(),
        ..Default::default()
    });
    run_pipeline(&deps2, 1000).await.unwrap();
    assert_eq!(world2.mailer.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn threshold_boundaries_route_and_flag_independently() {
    // 2.9999: below the 3.0 routing cutoff, so no outreach and QUALIFIED=NO.
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![jane()]).llm(MockLlm::new().scoring("2.9999"));
    run_pipeline(&world.deps(policy(&dir)), 1000).await.unwrap();
    assert_eq!(world.mailer.draft_count(), 0);
    assert_eq!(world.leads.field("0", "QUALIFIED").as_deref(), Some("NO"));

    // 5.9999: routed to outreach, but the 6.0 CRM flag still says NO.
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![jane()]).llm(MockLlm::new().scoring("5.9999"));
    run_pipeline(&world.deps(policy(&dir)), 1000).await.unwrap();
    assert_eq!(world.mailer.draft_count(), 1);
    assert_eq!(world.leads.field("0", "QUALIFIED").as_deref(), Some("NO"));

    // 6.0 exactly: outreach plus QUALIFIED=YES.
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![jane()]).llm(MockLlm::new().scoring("6.0"));
    run_pipeline(&world.deps(policy(&dir)), 1000).await.unwrap();
    assert_eq!(world.mailer.draft_count(), 1);
    assert_eq!(world.leads.field("0", "QUALIFIED").as_deref(), Some("YES"));
}

#[tokio::test]
async fn malformed_score_abandons_the_lead_but_not_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![
        lead_row(&[("NAME", "Jane Doe"), ("EMAIL", "jane@acme.com")]),
        lead_row(&[("NAME", "Ken Ito"), ("EMAIL", "ken@initech.com")]),
    ])
    .llm(MockLlm::new().scoring("not a number"));
    let deps = world.deps(policy(&dir));

    let state = run_pipeline(&deps, 1000).await.unwrap();

    assert_eq!(world.leads.update_count(), 0);
    assert_eq!(state.stats.leads_failed, 2);
    assert_eq!(state.queue.remaining(), 0);
}

// ---------------------------------------------------------------------------
// Research degradation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_website_scrape_still_produces_the_general_report() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![jane()])
        .linkedin(MockLinkedIn::new().on_lead("Jane Doe", jane_identity()))
        .scraper(MockScraper::new().on_page("acme.com", ""))
        .llm(
            MockLlm::new()
                .scoring("2.0")
                .on_complete("sales researcher", "Report built from LinkedIn data."),
        );
    let deps = world.deps(policy(&dir));

    run_pipeline(&deps, 1000).await.unwrap();

    let general = dir
        .path()
        .join("Jane Doe_Acme")
        .join("General Lead Research Report.md");
    let content = std::fs::read_to_string(general).unwrap();
    assert_eq!(content, "Report built from LinkedIn data.");
}

#[tokio::test]
async fn blog_and_channel_branches_only_run_when_links_exist() {
    let dir = tempfile::tempdir().unwrap();
    // Website analysis discovers a blog but no video channel.
    let world = MockWorld::new(vec![jane()])
        .linkedin(MockLinkedIn::new().on_lead("Jane Doe", jane_identity()))
        .scraper(
            MockScraper::new()
                .on_page("acme.com", "# Acme\nWe make anvils.")
                .on_page("https://blog.acme.com", "# Posts"),
        )
        .llm(
            MockLlm::new()
                .scoring("2.0")
                .on_extract(
                    "reviewing a company website",
                    serde_json::json!({
                        "summary": "Acme makes anvils.",
                        "blog_url": "https://blog.acme.com",
                        "youtube": "", "twitter": "", "facebook": ""
                    }),
                ),
        );
    let deps = world.deps(policy(&dir));

    run_pipeline(&deps, 1000).await.unwrap();

    let lead_dir = dir.path().join("Jane Doe_Acme");
    assert!(lead_dir.join("Blog Analysis Report.md").exists());
    assert!(!lead_dir.join("Youtube Analysis Report.md").exists());
    // News runs unconditionally even though the searcher errored.
    assert!(lead_dir.join("News Analysis Report.md").exists());
}

// ---------------------------------------------------------------------------
// Save idempotency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn existing_store_document_is_skipped_but_still_saved_locally() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![jane()])
        .linkedin(MockLinkedIn::new().on_lead("Jane Doe", jane_identity()))
        .docs(MockDocumentStore::new().with_existing(JANE_FOLDER, titles::GENERAL_RESEARCH));
    let deps = world.deps(policy(&dir));

    let state = run_pipeline(&deps, 1000).await.unwrap();

    let mirrored = world.docs.created_titles(JANE_FOLDER);
    assert!(!mirrored.contains(&titles::GENERAL_RESEARCH.to_string()));
    assert!(mirrored.contains(&titles::GLOBAL_ANALYSIS.to_string()));
    assert!(dir
        .path()
        .join("Jane Doe_Acme")
        .join("General Lead Research Report.md")
        .exists());
    assert_eq!(state.stats.reports_skipped_existing, 1);
}

#[tokio::test]
async fn duplicate_titles_are_mirrored_once() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(Vec::new());
    let deps = world.deps(policy(&dir));

    let mut state = RunState::default();
    state.report_folder = JANE_FOLDER.to_string();
    state.apply(vec![
        StateDelta::ReportAdded(leadflow_common::Report::markdown(
            titles::GENERAL_RESEARCH,
            "first",
        )),
        StateDelta::ReportAdded(leadflow_common::Report::markdown(
            titles::GENERAL_RESEARCH,
            "second",
        )),
    ]);

    use leadflow_engine::Node;
    let update = SaveReports.run(&state, &deps).await.unwrap();
    state.apply(update);

    let mirrored = world.docs.created_titles(JANE_FOLDER);
    assert_eq!(
        mirrored,
        vec![titles::GENERAL_RESEARCH.to_string()],
        "exactly one external write per title"
    );
    // First occurrence wins.
    let local = std::fs::read_to_string(
        dir.path()
            .join("Jane Doe_Acme")
            .join("General Lead Research Report.md"),
    )
    .unwrap();
    assert_eq!(local, "first");
}

#[tokio::test]
async fn failed_outreach_persist_clears_links_instead_of_raising() {
    let dir = tempfile::tempdir().unwrap();
    let world = MockWorld::new(vec![jane()]).docs(MockDocumentStore::new().failing_create());
    let deps = world.deps(policy(&dir));

    // Qualified run; every store write fails, but the run completes.
    let state = run_pipeline(&deps, 1000).await.unwrap();
    assert!(state.outreach_report_url.is_none());
    assert!(state.reports_folder_url.is_none());
    assert_eq!(world.leads.update_count(), 1);
}
