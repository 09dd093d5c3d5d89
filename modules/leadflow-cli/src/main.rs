//! Process-boundary entry point: CSV in, workflow run, CSV out.
//!
//! Progress is streamed as log lines on stdout; a successful run ends
//! with a single `OUTPUT_FILE:<path>` marker line, a failed run exits
//! non-zero after printing a diagnostic. The server relies on both.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use leadflow_common::Config;
use leadflow_pipeline::loader::{LeadTable, TableLeadSource};
use leadflow_pipeline::{run_pipeline, PipelineDeps};

#[derive(Parser)]
#[command(name = "leadflow", about = "Run lead research and outreach over a CSV of leads")]
struct Args {
    /// Path to the input file (.csv)
    input: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("leadflow=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("Error during execution: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if !args.input.exists() {
        bail!("File not found at {}", args.input.display());
    }
    if args.input.extension().and_then(|e| e.to_str()) != Some("csv") {
        bail!("Invalid file format: expected a .csv file");
    }

    println!("Starting analysis for: {}", args.input.display());

    let mut table = read_table(&args.input)?;
    let added = table.normalize();
    for column in &added {
        println!("Adding missing column: {column}");
    }
    println!("Loaded {} records.", table.rows.len());

    let config = Config::from_env();
    let source = Arc::new(TableLeadSource::new(table));
    let deps = PipelineDeps::from_config(&config, source.clone());

    println!("Initializing automation graph...");
    let state = run_pipeline(&deps, config.step_ceiling).await?;
    info!(
        leads = state.stats.leads_processed,
        failed = state.stats.leads_failed,
        "Analysis complete. Generating output..."
    );

    let output_path = output_path(&args.input);
    write_table(&output_path, &source.snapshot())
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!("OUTPUT_FILE:{}", output_path.display());
    Ok(())
}

fn read_table(path: &Path) -> Result<LeadTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Input file has no header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed CSV row")?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(LeadTable::new(headers, rows))
}

/// `Processed_<name>.csv` next to the input.
fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("leads");
    input.with_file_name(format!("Processed_{stem}.csv"))
}

fn write_table(path: &Path, table: &LeadTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_lands_next_to_input() {
        assert_eq!(
            output_path(Path::new("/tmp/uploads/leads.csv")),
            Path::new("/tmp/uploads/Processed_leads.csv")
        );
    }
}
