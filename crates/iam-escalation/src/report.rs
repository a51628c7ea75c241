//! Per-principal results of a revoke request.

use iam_escalation_core::RevokeResponse;

/// What happened to one revocation ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalOutcome {
    /// The binding was removed.
    Revoked { attempts: u32 },
    /// The role was not bound to the principal. Nothing to do.
    NotGranted,
    /// Every attempt failed.
    Failed { attempts: u32, error: String },
    /// The ID came from a configuration dry run and was skipped.
    DryRun,
}

impl PrincipalOutcome {
    /// Whether the principal may still hold the role.
    pub fn is_failure(&self) -> bool {
        matches!(self, PrincipalOutcome::Failed { .. })
    }
}

/// Outcome of a revoke request, one entry per input ID in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevokeReport {
    outcomes: Vec<(String, PrincipalOutcome)>,
}

impl RevokeReport {
    pub fn new(outcomes: Vec<(String, PrincipalOutcome)>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[(String, PrincipalOutcome)] {
        &self.outcomes
    }

    /// The outcome for an ID (the first one, if the ID was repeated).
    pub fn outcome(&self, id: &str) -> Option<&PrincipalOutcome> {
        self.outcomes
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, outcome)| outcome)
    }

    /// IDs whose revocation failed after all retries.
    pub fn failures(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .map(|(id, _)| id.as_str())
    }

    /// The gateway acknowledgement: every input ID is reported as revoked,
    /// whatever its individual outcome.
    pub fn acknowledge(&self) -> RevokeResponse {
        RevokeResponse {
            revoked: self.outcomes.iter().map(|(id, _)| id.clone()).collect(),
            message: None,
        }
    }
}
