//! Save stage: local durable storage plus idempotent store mirroring.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use leadflow_common::Report;
use leadflow_engine::Node;

use crate::deps::PipelineDeps;
use crate::state::{dedupe_by_title, RunState, StateDelta};

/// Dedupe accumulated reports by title, write them all to local storage,
/// and mirror each to the document store unless a document with that
/// title already exists in the per-lead folder.
pub struct SaveReports;

#[async_trait]
impl Node<RunState, PipelineDeps> for SaveReports {
    fn name(&self) -> &str {
        "save_reports"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let folder = &state.report_folder;
        if folder.is_empty() {
            return Ok(vec![]);
        }

        let reports = dedupe_by_title(&state.reports);
        info!(folder = %folder, count = reports.len(), "Saving reports");

        // Local storage is unconditional, regardless of what the store
        // already holds.
        let local = save_reports_locally(&deps.policy.reports_dir, folder, &reports);

        let mut mirrored = 0u32;
        let mut skipped_existing = 0u32;
        if deps.policy.save_to_doc_store {
            for report in &reports {
                let exists = match deps.docs.document_exists(folder, &report.title).await {
                    Ok(exists) => exists,
                    Err(e) => {
                        warn!(title = %report.title, error = %e, "Existence check failed, treating as absent");
                        false
                    }
                };
                if exists {
                    info!(title = %report.title, folder = %folder, "Document already exists, skipping");
                    skipped_existing += 1;
                    continue;
                }

                match deps
                    .docs
                    .create_document(
                        &report.content,
                        &report.title,
                        folder,
                        report.is_markdown,
                        false,
                    )
                    .await
                {
                    Ok(_) => mirrored += 1,
                    Err(e) => {
                        warn!(title = %report.title, error = %e, "Failed to mirror report to store")
                    }
                }
            }
        }

        Ok(vec![
            StateDelta::SaveOutcome {
                local,
                mirrored,
                skipped_existing,
            },
            StateDelta::FolderPersisted(folder.clone()),
        ])
    }
}

/// Write each report under `<reports_dir>/<lead folder leaf>/`. Write
/// failures are logged and skipped; the count of successful writes is
/// returned.
fn save_reports_locally(reports_dir: &Path, folder: &str, reports: &[Report]) -> u32 {
    let leaf = folder.rsplit('/').next().unwrap_or(folder);
    let dir = reports_dir.join(sanitize_file_name(leaf));
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!(dir = %dir.display(), error = %e, "Could not create local reports directory");
        return 0;
    }

    let mut written = 0;
    for report in reports {
        let extension = if report.is_markdown { "md" } else { "txt" };
        let path = dir.join(format!("{}.{extension}", sanitize_file_name(&report.title)));
        match std::fs::write(&path, &report.content) {
            Ok(()) => written += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "Could not write report locally"),
        }
    }
    written
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(
            sanitize_file_name("Lead/Report: Acme"),
            "Lead_Report_ Acme"
        );
    }

    #[test]
    fn local_save_writes_one_file_per_report() {
        let dir = tempfile::tempdir().unwrap();
        let reports = vec![
            Report::markdown("General Lead Research Report", "a"),
            Report::plain("Personalized Email", "b"),
        ];
        let written = save_reports_locally(dir.path(), "Lead_Reports/Jane_Acme", &reports);
        assert_eq!(written, 2);
        assert!(dir
            .path()
            .join("Jane_Acme/General Lead Research Report.md")
            .exists());
        assert!(dir.path().join("Jane_Acme/Personalized Email.txt").exists());
    }
}
