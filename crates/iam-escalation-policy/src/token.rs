//! Bearer tokens for the control plane.

use std::fmt;

use serde::Deserialize;

use crate::error::{PolicyError, Result};

/// Default metadata-server endpoint on GCE, Cloud Run and GKE.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Where the OAuth2 access token comes from.
#[derive(Clone)]
pub enum TokenSource {
    /// A fixed token, e.g. from `gcloud auth print-access-token`.
    Static(String),

    /// The instance metadata server, queried on every call.
    MetadataServer { url: String },
}

impl TokenSource {
    /// The metadata server at its well-known address.
    pub fn metadata_server() -> Self {
        TokenSource::MetadataServer {
            url: METADATA_TOKEN_URL.to_string(),
        }
    }

    /// Obtain a token to put in the `Authorization` header.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::MetadataServer { url } => {
                #[derive(Deserialize)]
                struct MetadataToken {
                    access_token: String,
                }

                let response = client
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| PolicyError::Token(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(PolicyError::Token(format!(
                        "metadata server returned {}",
                        response.status()
                    )));
                }

                let token: MetadataToken = response
                    .json()
                    .await
                    .map_err(|e| PolicyError::Token(e.to_string()))?;
                Ok(token.access_token)
            }
        }
    }
}

impl Default for TokenSource {
    fn default() -> Self {
        Self::metadata_server()
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Static(_) => f.write_str("Static(<redacted>)"),
            TokenSource::MetadataServer { url } => f
                .debug_struct("MetadataServer")
                .field("url", url)
                .finish(),
        }
    }
}
