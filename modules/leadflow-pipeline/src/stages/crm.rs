//! CRM write-back: the only writer of the lead source.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use leadflow_common::LeadFlowError;
use leadflow_engine::Node;

use crate::deps::PipelineDeps;
use crate::stages::qualify::qualified_flag;
use crate::state::{RunState, StateDelta};

/// Persist score and qualification for the current lead, then close out
/// its traversal: reports cleared, remaining count decremented.
pub struct CrmUpdate;

#[async_trait]
impl Node<RunState, PipelineDeps> for CrmUpdate {
    fn name(&self) -> &str {
        "crm_update"
    }

    async fn run(&self, state: &RunState, deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let lead = state.lead()?;
        if lead.id.is_empty() {
            return Err(LeadFlowError::MissingField { field: "id" }.into());
        }

        let mut fields = vec![("STATUS".to_string(), "CONTACTED".to_string())];
        let score = state.lead_score.trim();
        if !score.is_empty() {
            fields.push(("LEAD_SCORE".to_string(), score.to_string()));
            // A score that fails to parse here was already rejected by the
            // gate for routing; the QUALIFIED field is simply left alone.
            if let Ok(parsed) = score.parse::<f64>() {
                fields.push(("QUALIFIED".to_string(), qualified_flag(parsed).to_string()));
            }
        }

        deps.leads.update(&lead.id, &fields).await?;
        info!(lead = %lead.name, id = %lead.id, "CRM record updated");

        Ok(vec![StateDelta::ReportsCleared, StateDelta::LeadCompleted])
    }
}
