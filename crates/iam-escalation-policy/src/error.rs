//! Error types for policy access.

use iam_escalation_core::CoreError;
use thiserror::Error;

/// Errors that can occur while fetching, reconciling or replacing a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Transport-level failure talking to the control plane.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The control plane answered with a non-success status.
    #[error("{operation} on {resource} returned {status}: {body}")]
    Status {
        operation: &'static str,
        resource: String,
        status: u16,
        body: String,
    },

    /// The policy changed between fetch and replace.
    #[error("policy for {0} was modified concurrently")]
    Conflict(String),

    /// The call did not complete within the configured timeout.
    #[error("{operation} on {resource} timed out")]
    Timeout {
        operation: &'static str,
        resource: String,
    },

    /// The response body was not a policy document.
    #[error("invalid policy document: {0}")]
    Decode(String),

    /// No bearer token could be obtained.
    #[error("access token unavailable: {0}")]
    Token(String),

    /// Reconciliation rejected the change.
    #[error(transparent)]
    Reconcile(#[from] CoreError),
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
