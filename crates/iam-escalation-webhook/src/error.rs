//! Error types for the webhook handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use iam_escalation::ProducerError;
use thiserror::Error;

/// Errors that end a webhook call.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The body is not a valid request envelope.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The producer refused or failed the request.
    #[error(transparent)]
    Producer(#[from] ProducerError),
}

impl WebhookError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Authentication failure: 401 Unauthorized
    /// - Claims outside the allowed directory: 403 Forbidden
    /// - Bad envelope, payload or missing email: 400 Bad Request
    /// - Control plane failure: 502 Bad Gateway
    /// - Anything else: 500 Internal Server Error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Producer(err) => match err {
                ProducerError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
                ProducerError::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
                ProducerError::MissingIdentityClaim
                | ProducerError::MalformedPayload(_)
                | ProducerError::UnsupportedResourceType(_) => StatusCode::BAD_REQUEST,
                ProducerError::Backend(_) => StatusCode::BAD_GATEWAY,
                ProducerError::RoleNotExist { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        // The gateway shows the body to the user, so it is the error text
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        } else {
            tracing::warn!(error = %self, %status, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
