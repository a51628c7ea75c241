//! The Producer: create and revoke orchestration.
//!
//! Each call is independent. A create authenticates the caller, checks the
//! claims scope, resolves the principal and runs one grant cycle against a
//! freshly fetched policy. A revoke authenticates, then runs a bounded
//! retry loop per principal.

use iam_escalation_auth::{AuthError, Authenticator, ClaimsVerifier};
use iam_escalation_core::{
    grant, revoke, CreateRequest, CreateResponse, EscalationPayload, GrantOutcome, Principal,
    RevokeOutcome, RevokeRequest,
};
use iam_escalation_policy::{PolicyClient, PolicyClientExt};
use serde_json::Value;

use crate::config::ProducerConfig;
use crate::error::{ProducerError, Result};
use crate::report::{PrincipalOutcome, RevokeReport};

/// The escalation producer.
///
/// Holds no per-request state: the policy lives in the control plane and
/// is fetched fresh for every operation.
pub struct Producer<C, A, V> {
    policies: C,
    authenticator: A,
    verifier: V,
    config: ProducerConfig,
}

impl<C, A, V> Producer<C, A, V>
where
    C: PolicyClient,
    A: Authenticator,
    V: ClaimsVerifier,
{
    /// Create a new producer.
    pub fn new(policies: C, authenticator: A, verifier: V, config: ProducerConfig) -> Self {
        Self {
            policies,
            authenticator,
            verifier,
            config,
        }
    }

    /// Get the policy client.
    pub fn policies(&self) -> &C {
        &self.policies
    }

    /// Get the credential authenticator.
    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    /// Get the producer configuration.
    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Create
    // ─────────────────────────────────────────────────────────────────────────

    /// Handle a `/sync/create` request.
    ///
    /// `creds` is the opaque credential from the request header.
    pub async fn create(&self, request: &CreateRequest, creds: Option<&str>) -> Result<CreateResponse> {
        // Dry runs only validate the producer configuration
        if request.client_info.access_id == self.config.dry_run_access_id {
            tracing::debug!("create: received dry run, returning empty response");
            return Ok(CreateResponse::empty());
        }

        let creds = self.authenticate(creds).await?;

        let scope = self.verifier.verify(creds)?;
        tracing::debug!(item = scope.item_name(), "create: item path allowed");

        let email = request
            .client_info
            .email()
            .ok_or(ProducerError::MissingIdentityClaim)?;
        let principal = Principal::user(email);

        let payload = EscalationPayload::parse(&request.payload)?;

        let outcome = self.escalate(&payload, &principal).await?;

        let message = match outcome {
            GrantOutcome::AlreadyMember => format!(
                "{} already holds {} on {}",
                principal, payload.role, payload.resource
            ),
            GrantOutcome::BindingCreated | GrantOutcome::MemberAdded => format!(
                "escalated {} to {} on {}",
                principal, payload.role, payload.resource
            ),
        };
        tracing::info!(
            %principal,
            role = %payload.role,
            resource = %payload.resource.path(),
            ?outcome,
            "create: escalated"
        );

        Ok(CreateResponse {
            id: principal.into_string(),
            response: Value::String(message),
        })
    }

    /// Grant the payload's role to a principal. Not retried.
    pub async fn escalate(
        &self,
        payload: &EscalationPayload,
        principal: &Principal,
    ) -> Result<GrantOutcome> {
        let outcome = self
            .policies
            .read_modify_write(&payload.resource, |policy| {
                Ok(grant(policy, &payload.role, principal.as_str()))
            })
            .await?;
        Ok(outcome)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Revoke
    // ─────────────────────────────────────────────────────────────────────────

    /// Handle a `/sync/revoke` request.
    ///
    /// Fails only if the request as a whole is invalid (authentication or
    /// payload). Per-principal failures are recorded in the report.
    pub async fn revoke(&self, request: &RevokeRequest, creds: Option<&str>) -> Result<RevokeReport> {
        let live = request
            .ids
            .iter()
            .filter(|id| !self.config.is_dry_run_id(id))
            .count();

        if live == 0 {
            tracing::debug!(ids = request.ids.len(), "revoke: received dry run, returning ids as revoked");
            return Ok(RevokeReport::new(
                request
                    .ids
                    .iter()
                    .map(|id| (id.clone(), PrincipalOutcome::DryRun))
                    .collect(),
            ));
        }

        self.authenticate(creds).await?;

        let payload = EscalationPayload::parse(&request.payload)?;

        let mut outcomes = Vec::with_capacity(request.ids.len());
        for id in &request.ids {
            let outcome = if self.config.is_dry_run_id(id) {
                PrincipalOutcome::DryRun
            } else {
                self.revoke_principal(&payload, &Principal::new(id.as_str()))
                    .await
            };
            outcomes.push((id.clone(), outcome));
        }

        Ok(RevokeReport::new(outcomes))
    }

    /// Remove the payload's role from one principal, retrying transient
    /// failures according to the configured policy.
    pub async fn revoke_principal(
        &self,
        payload: &EscalationPayload,
        principal: &Principal,
    ) -> PrincipalOutcome {
        let retried = self
            .config
            .revoke_retry
            .run(
                || self.revoke_once(payload, principal),
                ProducerError::is_terminal,
            )
            .await;

        match retried.result {
            Ok(outcome) => {
                tracing::info!(
                    %principal,
                    role = %payload.role,
                    resource = %payload.resource.path(),
                    ?outcome,
                    "revoke: removed access"
                );
                PrincipalOutcome::Revoked {
                    attempts: retried.attempts,
                }
            }
            Err(ProducerError::RoleNotExist { .. }) => {
                tracing::info!(
                    %principal,
                    role = %payload.role,
                    resource = %payload.resource.path(),
                    "revoke: role not bound, nothing to do"
                );
                PrincipalOutcome::NotGranted
            }
            Err(error) => {
                tracing::error!(
                    %principal,
                    role = %payload.role,
                    resource = %payload.resource.path(),
                    attempts = retried.attempts,
                    %error,
                    "revoke: could not revoke access, giving up"
                );
                PrincipalOutcome::Failed {
                    attempts: retried.attempts,
                    error: error.to_string(),
                }
            }
        }
    }

    async fn revoke_once(
        &self,
        payload: &EscalationPayload,
        principal: &Principal,
    ) -> Result<RevokeOutcome> {
        let outcome = self
            .policies
            .read_modify_write(&payload.resource, |policy| {
                revoke(policy, &payload.role, principal.as_str())
            })
            .await?;
        Ok(outcome)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────────────────

    async fn authenticate<'a>(&self, creds: Option<&'a str>) -> Result<&'a str> {
        let creds = creds
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCredentials)?;

        self.authenticator
            .authenticate(
                creds,
                &self.config.allowed_access_id,
                self.config.allowed_item_name.as_deref(),
            )
            .await?;

        Ok(creds)
    }
}
