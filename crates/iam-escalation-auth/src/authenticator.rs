//! Credential validation against the gateway's auth service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Default credential-validation endpoint.
pub const DEFAULT_VALIDATION_URL: &str = "https://auth.akeyless.io/validate-producer-credentials";

/// Validates the credential that accompanies a webhook call.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Succeed only if `creds` were issued to `expected_access_id` and, when
    /// given, on behalf of the item `expected_item_name`.
    async fn authenticate(
        &self,
        creds: &str,
        expected_access_id: &str,
        expected_item_name: Option<&str>,
    ) -> Result<()>;
}

/// Configuration for [`ValidationServiceAuthenticator`].
#[derive(Debug, Clone)]
pub struct ValidationServiceConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for ValidationServiceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_VALIDATION_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Authenticator that asks the external validation service.
#[derive(Debug, Clone)]
pub struct ValidationServiceAuthenticator {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct ValidationRequest<'a> {
    creds: &'a str,
    expected_access_id: &'a str,
    expected_item_name: &'a str,
}

#[derive(Deserialize)]
struct ValidationResponse {
    #[serde(default)]
    access_id: Option<String>,
}

impl ValidationServiceAuthenticator {
    pub fn new(config: ValidationServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthError::AuthenticationFailed(e.to_string()))?;
        Ok(Self {
            client,
            url: config.url,
        })
    }
}

#[async_trait]
impl Authenticator for ValidationServiceAuthenticator {
    async fn authenticate(
        &self,
        creds: &str,
        expected_access_id: &str,
        expected_item_name: Option<&str>,
    ) -> Result<()> {
        if creds.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let request = ValidationRequest {
            creds,
            expected_access_id,
            expected_item_name: expected_item_name.unwrap_or_default(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::AuthenticationFailed(format!("validation request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::AuthenticationFailed(format!("can't read validation response: {e}")))?;

        if !status.is_success() {
            return Err(AuthError::AuthenticationFailed(format!(
                "unexpected validation response code {}: {}",
                status.as_u16(),
                body
            )));
        }

        let validated: ValidationResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::AuthenticationFailed(format!("can't parse validation response: {e}"))
        })?;

        if validated.access_id.as_deref() != Some(expected_access_id) {
            return Err(AuthError::AuthenticationFailed("mismatched access id".into()));
        }

        tracing::debug!(access_id = expected_access_id, "caller authenticated");
        Ok(())
    }
}
