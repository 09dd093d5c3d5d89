use thiserror::Error;

/// Workflow errors with an explicit blast radius.
///
/// Lead-scoped errors abort the current lead's traversal; the run driver
/// logs them and moves on to the next lead. Everything else that escapes a
/// stage is run-scoped and terminates the run. Degraded-continue and
/// best-effort failures never become errors at all: stages log them and
/// substitute placeholders or empty defaults.
#[derive(Debug, Error)]
pub enum LeadFlowError {
    #[error("lead score '{score}' is not numeric")]
    MalformedScore { score: String },

    #[error("lead is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("no lead is active in this traversal")]
    NoCurrentLead,

    #[error("lead source failure: {0}")]
    LeadSource(String),
}

impl LeadFlowError {
    /// Whether this error aborts only the current lead (the run continues
    /// with the next one) rather than the whole run.
    pub fn is_lead_scoped(&self) -> bool {
        matches!(
            self,
            LeadFlowError::MalformedScore { .. } | LeadFlowError::MissingField { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_and_field_errors_are_lead_scoped() {
        assert!(LeadFlowError::MalformedScore {
            score: "N/A".into()
        }
        .is_lead_scoped());
        assert!(LeadFlowError::MissingField { field: "id" }.is_lead_scoped());
        assert!(!LeadFlowError::NoCurrentLead.is_lead_scoped());
        assert!(!LeadFlowError::LeadSource("fetch failed".into()).is_lead_scoped());
    }
}
