//! Error types for the escalation producer.

use iam_escalation_auth::AuthError;
use iam_escalation_core::CoreError;
use iam_escalation_policy::PolicyError;
use thiserror::Error;

/// Errors that can end a create or revoke request.
#[derive(Debug, Error)]
pub enum ProducerError {
    /// The credential was missing or rejected by the validation service.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The credential's claims do not allow escalation.
    #[error("permission denied: {0}")]
    AuthorizationDenied(String),

    /// The caller has no `email` sub-claim to grant the role to.
    #[error("email sub-claim is required")]
    MissingIdentityClaim,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    /// Nothing to revoke: the role is not bound to the member.
    #[error("role {role} is not bound to {member}")]
    RoleNotExist { role: String, member: String },

    /// Fetching or replacing the policy failed.
    #[error("policy backend failure: {0}")]
    Backend(PolicyError),
}

impl ProducerError {
    /// Whether retrying cannot help.
    ///
    /// During revoke only [`ProducerError::RoleNotExist`] stops the retry
    /// loop early; every other failure is retried up to the attempt bound.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProducerError::RoleNotExist { .. })
    }
}

impl From<CoreError> for ProducerError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::RoleNotExist { role, member } => ProducerError::RoleNotExist { role, member },
            CoreError::UnsupportedResourceType(kind) => ProducerError::UnsupportedResourceType(kind),
            CoreError::MalformedPayload(msg) => ProducerError::MalformedPayload(msg),
        }
    }
}

impl From<PolicyError> for ProducerError {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::Reconcile(core) => core.into(),
            other => ProducerError::Backend(other),
        }
    }
}

impl From<AuthError> for ProducerError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredentials => {
                ProducerError::AuthenticationFailed("missing credentials".into())
            }
            AuthError::AuthenticationFailed(msg) => ProducerError::AuthenticationFailed(msg),
            AuthError::AuthorizationDenied(msg) => ProducerError::AuthorizationDenied(msg),
        }
    }
}

/// Result type for producer operations.
pub type Result<T> = std::result::Result<T, ProducerError>;
