//! Error types for authentication and claims verification.

use thiserror::Error;

/// Errors that can occur while authenticating or scoping a caller.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("missing credentials")]
    MissingCredentials,

    /// The validation service rejected the credential, or could not be asked.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The credential is valid but not allowed to do this.
    #[error("permission denied: {0}")]
    AuthorizationDenied(String),
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
