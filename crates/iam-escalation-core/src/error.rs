//! Error types for the IAM Escalation Core.

use thiserror::Error;

/// Errors raised while parsing instructions or reconciling a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The policy has no binding for the role, or the binding does not
    /// contain the member. Nothing to revoke.
    #[error("role {role} is not bound to {member}")]
    RoleNotExist { role: String, member: String },

    #[error("unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
