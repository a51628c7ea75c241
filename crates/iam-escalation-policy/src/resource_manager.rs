//! Cloud Resource Manager implementation of the PolicyClient trait.
//!
//! Talks to the v3 REST surface:
//!
//! ```text
//! POST {base}/projects/{id}:getIamPolicy       {"options":{"requestedPolicyVersion":3}}
//! POST {base}/folders/{id}:setIamPolicy        {"policy": {...}}
//! POST {base}/organizations/{id}:getIamPolicy  ...
//! ```

use std::time::Duration;

use async_trait::async_trait;
use iam_escalation_core::{Policy, ResourceRef};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::client::PolicyClient;
use crate::error::{PolicyError, Result};
use crate::token::TokenSource;

/// Public endpoint of the Cloud Resource Manager v3 API.
pub const DEFAULT_BASE_URL: &str = "https://cloudresourcemanager.googleapis.com/v3";

/// Highest policy version; needed so conditional bindings round-trip.
const REQUESTED_POLICY_VERSION: i32 = 3;

/// Configuration for [`ResourceManagerClient`].
#[derive(Debug, Clone)]
pub struct ResourceManagerConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Bound on each fetch or replace call.
    pub timeout: Duration,
    /// Bearer token source.
    pub token: TokenSource,
}

impl Default for ResourceManagerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            token: TokenSource::default(),
        }
    }
}

impl ResourceManagerConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_token(mut self, token: TokenSource) -> Self {
        self.token = token;
        self
    }
}

/// Policy client backed by the Cloud Resource Manager REST API.
#[derive(Debug, Clone)]
pub struct ResourceManagerClient {
    client: reqwest::Client,
    config: ResourceManagerConfig,
}

impl ResourceManagerClient {
    /// Build a client. Fails only if the TLS backend cannot initialize.
    pub fn new(config: ResourceManagerConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, resource: &ResourceRef, operation: &str) -> String {
        format!(
            "{}/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            resource.path(),
            operation
        )
    }

    async fn call(
        &self,
        operation: &'static str,
        resource: &ResourceRef,
        body: &Value,
    ) -> Result<Policy> {
        let transport = |e: reqwest::Error| {
            if e.is_timeout() {
                PolicyError::Timeout {
                    operation,
                    resource: resource.path(),
                }
            } else {
                PolicyError::Http(e)
            }
        };

        let token = self.config.token.access_token(&self.client).await?;

        tracing::debug!(operation, resource = %resource.path(), "calling resource manager");
        let response = self
            .client
            .post(self.url(resource, operation))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(PolicyError::Conflict(resource.path()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PolicyError::Status {
                operation,
                resource: resource.path(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&bytes).map_err(|e| PolicyError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PolicyClient for ResourceManagerClient {
    async fn fetch(&self, resource: &ResourceRef) -> Result<Policy> {
        let body = json!({ "options": { "requestedPolicyVersion": REQUESTED_POLICY_VERSION } });
        self.call("getIamPolicy", resource, &body).await
    }

    async fn replace(&self, resource: &ResourceRef, policy: &Policy) -> Result<Policy> {
        let mut policy = policy.clone();
        // Conditional bindings are rejected unless the version says so
        policy.version = Some(policy.version.unwrap_or(1).max(REQUESTED_POLICY_VERSION));
        let body = json!({ "policy": policy });
        self.call("setIamPolicy", resource, &body).await
    }
}
