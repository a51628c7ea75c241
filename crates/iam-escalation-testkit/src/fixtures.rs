//! Test fixtures and fakes.
//!
//! Common setup code for producer and webhook tests: request builders,
//! throwaway gateway credentials, an authenticator with a fixed verdict and
//! a policy client that can be told to fail.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use iam_escalation_auth::{AuthError, Authenticator};
use iam_escalation_core::{ClientInfo, CreateRequest, Policy, ResourceRef, RevokeRequest};
use iam_escalation_policy::{MemoryPolicyClient, PolicyClient, PolicyError};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::json;

/// Access ID the fixtures expect the gateway to authenticate as.
pub const GATEWAY_ACCESS_ID: &str = "p-gateway";

/// An item inside the default allowed directory.
pub const ALLOWED_ITEM: &str = "/dynamic-secrets/cloud-user-access/gcp/prod-viewer";

/// Access ID of the end user in fixture requests.
pub const USER_ACCESS_ID: &str = "p-user";

/// Build a JWT whose `attaches` claim names `item_name`.
///
/// `attaches` is JSON encoded as a string, the way the gateway sends it.
/// The token is signed with a throwaway key; claims scoping never checks it.
pub fn claims_token(item_name: &str) -> String {
    let attaches = json!({ "item_name": item_name }).to_string();
    let claims = json!({ "attaches": attaches });
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(b"testkit"))
        .expect("HMAC signing of JSON claims cannot fail")
}

/// A credential for an item in the allowed directory.
pub fn allowed_creds() -> String {
    claims_token(ALLOWED_ITEM)
}

/// The payload string stored in a dynamic secret.
pub fn payload(role: &str, resource_type: &str, resource_id: &str) -> String {
    json!({
        "role": role,
        "resource_type": resource_type,
        "resource_id": resource_id,
    })
    .to_string()
}

/// A create request from a user, optionally carrying an `email` sub-claim.
pub fn create_request(payload: &str, email: Option<&str>) -> CreateRequest {
    let mut sub_claims = BTreeMap::new();
    if let Some(email) = email {
        sub_claims.insert("email".to_string(), vec![email.to_string()]);
    }
    CreateRequest {
        payload: payload.to_string(),
        client_info: ClientInfo {
            access_id: USER_ACCESS_ID.to_string(),
            sub_claims,
        },
        input: None,
    }
}

/// A create request as sent when the gateway dry-runs a producer.
pub fn dry_run_create_request(payload: &str, dry_run_access_id: &str) -> CreateRequest {
    CreateRequest {
        payload: payload.to_string(),
        client_info: ClientInfo {
            access_id: dry_run_access_id.to_string(),
            sub_claims: BTreeMap::new(),
        },
        input: None,
    }
}

pub fn revoke_request(payload: &str, ids: &[&str]) -> RevokeRequest {
    RevokeRequest {
        payload: payload.to_string(),
        ids: ids.iter().map(|id| id.to_string()).collect(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authenticator
// ─────────────────────────────────────────────────────────────────────────────

/// One recorded call to [`StaticAuthenticator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCall {
    pub creds: String,
    pub expected_access_id: String,
    pub expected_item_name: Option<String>,
}

/// Authenticator with a fixed verdict that records what it was asked.
#[derive(Debug)]
pub struct StaticAuthenticator {
    accept: bool,
    calls: Mutex<Vec<AuthCall>>,
}

impl StaticAuthenticator {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<AuthCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(
        &self,
        creds: &str,
        expected_access_id: &str,
        expected_item_name: Option<&str>,
    ) -> Result<(), AuthError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AuthCall {
                creds: creds.to_string(),
                expected_access_id: expected_access_id.to_string(),
                expected_item_name: expected_item_name.map(str::to_string),
            });

        if self.accept {
            Ok(())
        } else {
            Err(AuthError::AuthenticationFailed(
                "credentials rejected".to_string(),
            ))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policy client
// ─────────────────────────────────────────────────────────────────────────────

/// An in-memory policy client that counts calls and can fail on demand.
///
/// Injected failures hit `fetch` with a 503, the way an unavailable control
/// plane would.
#[derive(Debug, Default)]
pub struct FlakyPolicyClient {
    inner: MemoryPolicyClient,
    remaining_failures: AtomicU32,
    fetches: AtomicU32,
    replaces: AtomicU32,
}

impl FlakyPolicyClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` fetches.
    pub fn failing(n: u32) -> Self {
        let client = Self::new();
        client.fail_next(n);
        client
    }

    /// Fail every fetch.
    pub fn always_failing() -> Self {
        Self::failing(u32::MAX)
    }

    pub fn fail_next(&self, n: u32) {
        self.remaining_failures.store(n, Ordering::SeqCst);
    }

    /// Seed a resource's policy.
    pub fn insert(&self, resource: ResourceRef, policy: Policy) {
        self.inner.insert(resource, policy);
    }

    /// Current policy of a resource, if it was ever written.
    pub fn get(&self, resource: &ResourceRef) -> Option<Policy> {
        self.inner.get(resource)
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn replace_count(&self) -> u32 {
        self.replaces.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PolicyClient for FlakyPolicyClient {
    async fn fetch(&self, resource: &ResourceRef) -> Result<Policy, PolicyError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            return Err(PolicyError::Status {
                operation: "getIamPolicy",
                resource: resource.path(),
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        self.inner.fetch(resource).await
    }

    async fn replace(&self, resource: &ResourceRef, policy: &Policy) -> Result<Policy, PolicyError> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        self.inner.replace(resource, policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_escalation_auth::decode_claims;
    use iam_escalation_core::EscalationPayload;

    #[test]
    fn test_claims_token_decodes() {
        let claims = decode_claims(&allowed_creds()).unwrap();
        assert_eq!(claims.item_name.as_deref(), Some(ALLOWED_ITEM));
    }

    #[test]
    fn test_payload_parses() {
        let parsed = EscalationPayload::parse(&payload("roles/viewer", "folder", "42")).unwrap();
        assert_eq!(parsed.role, "roles/viewer");
        assert_eq!(parsed.resource.path(), "folders/42");
    }

    #[tokio::test]
    async fn test_flaky_client_recovers() {
        let client = FlakyPolicyClient::failing(2);
        let project = ResourceRef::project("1").unwrap();

        assert!(client.fetch(&project).await.is_err());
        assert!(client.fetch(&project).await.is_err());
        assert!(client.fetch(&project).await.is_ok());
        assert_eq!(client.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_static_authenticator_records_calls() {
        let auth = StaticAuthenticator::rejecting();
        let err = auth
            .authenticate("creds", GATEWAY_ACCESS_ID, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::AuthenticationFailed(_)));
        assert_eq!(auth.calls()[0].expected_access_id, GATEWAY_ACCESS_ID);
    }
}
