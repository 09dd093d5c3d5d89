//! Run driver: builds the graph, runs it, and applies the error policy.

use anyhow::{Context, Result};
use tracing::{error, info};

use leadflow_common::LeadFlowError;
use leadflow_engine::{Engine, EngineError, GraphState};

use crate::deps::PipelineDeps;
use crate::stages::build_graph;
use crate::state::{RunState, StateDelta};

/// Where a traversal resumes after a lead-scoped failure.
const RESUME_NODE: &str = "check_remaining";

/// Run the full workflow to completion.
///
/// Lead-scoped failures (malformed score, missing required fields)
/// abandon that lead (remaining count still drops by one) and the run
/// resumes at the loop check. Any other escaped error terminates the
/// run. The step ceiling spans the whole run, including resumes.
pub async fn run_pipeline(deps: &PipelineDeps, step_ceiling: u64) -> Result<RunState> {
    let graph = build_graph().context("Failed to assemble workflow graph")?;
    let engine = Engine::new(graph, step_ceiling);

    let mut state = RunState::default();
    let mut start: Option<String> = None;

    loop {
        let result = match &start {
            None => engine.run(&mut state, deps).await,
            Some(node) => engine.run_from(node, &mut state, deps).await,
        };

        match result {
            Ok(()) => break,
            Err(EngineError::Node { node, source })
                if source
                    .downcast_ref::<LeadFlowError>()
                    .is_some_and(LeadFlowError::is_lead_scoped) =>
            {
                let lead = state
                    .current_lead
                    .as_ref()
                    .map(|l| l.id.clone())
                    .unwrap_or_default();
                error!(stage = %node, lead = %lead, error = %source, "Lead failed, continuing with next");
                state.apply(vec![StateDelta::ReportsCleared, StateDelta::LeadAbandoned]);
                start = Some(RESUME_NODE.to_string());
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(steps = engine.steps_executed(), "{}", state.stats);
    Ok(state)
}
