//! Qualification gate: parse the score and route.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use leadflow_common::LeadFlowError;
use leadflow_engine::Node;

use crate::deps::PipelineDeps;
use crate::state::{Qualification, RunState, StateDelta};

/// Score at or above which a lead gets outreach collateral.
pub const OUTREACH_THRESHOLD: f64 = 3.0;

/// Score at or above which the persisted QUALIFIED field reads YES.
/// Deliberately distinct from [`OUTREACH_THRESHOLD`].
// TODO: confirm with product whether the 3.0/6.0 split is intentional
// before unifying these (see DESIGN.md).
pub const CRM_QUALIFIED_THRESHOLD: f64 = 6.0;

impl Qualification {
    pub fn from_score(score: f64) -> Self {
        if score >= OUTREACH_THRESHOLD {
            Qualification::Qualified
        } else {
            Qualification::NotQualified
        }
    }
}

/// QUALIFIED field text persisted by the CRM update.
pub fn qualified_flag(score: f64) -> &'static str {
    if score >= CRM_QUALIFIED_THRESHOLD {
        "YES"
    } else {
        "NO"
    }
}

/// Parse the lead score and record the routing decision. A non-numeric
/// score is fatal to this lead's traversal, never silently defaulted.
pub struct QualifyGate;

#[async_trait]
impl Node<RunState, PipelineDeps> for QualifyGate {
    fn name(&self) -> &str {
        "qualify_lead"
    }

    async fn run(&self, state: &RunState, _deps: &PipelineDeps) -> Result<Vec<StateDelta>> {
        let raw = state.lead_score.trim();
        let score: f64 = raw.parse().map_err(|_| LeadFlowError::MalformedScore {
            score: raw.to_string(),
        })?;

        let qualification = Qualification::from_score(score);
        info!(score, ?qualification, "Qualification decided");

        Ok(vec![StateDelta::Qualified(qualification)])
    }
}

/// Router for the conditional edge out of the gate.
pub fn route(state: &RunState) -> Qualification {
    state.qualification.unwrap_or(Qualification::NotQualified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_threshold_is_three() {
        assert_eq!(
            Qualification::from_score(2.9999),
            Qualification::NotQualified
        );
        assert_eq!(Qualification::from_score(3.0), Qualification::Qualified);
        assert_eq!(Qualification::from_score(5.9999), Qualification::Qualified);
    }

    #[test]
    fn crm_flag_threshold_is_six_and_independent() {
        assert_eq!(qualified_flag(5.9999), "NO");
        assert_eq!(qualified_flag(6.0), "YES");
        // Qualified for outreach but still NO in the CRM field.
        assert_eq!(Qualification::from_score(5.9999), Qualification::Qualified);
    }

    #[tokio::test]
    async fn non_numeric_score_is_a_lead_scoped_error() {
        let mut state = RunState::default();
        state.lead_score = "N/A".to_string();

        let deps = crate::testing::mock_deps();
        let err = QualifyGate.run(&state, &deps).await.unwrap_err();
        let lead_err = err.downcast_ref::<LeadFlowError>().unwrap();
        assert!(lead_err.is_lead_scoped());
    }
}
