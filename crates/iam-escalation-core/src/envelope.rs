//! Webhook request and response envelopes.
//!
//! These mirror the custom-producer protocol spoken by the secrets gateway
//! on `/sync/create` and `/sync/revoke`. The escalation instruction itself
//! travels as a JSON string in `payload`; see [`crate::EscalationPayload`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of a `/sync/create` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRequest {
    /// The secret's payload, JSON encoded as a string.
    pub payload: String,

    pub client_info: ClientInfo,

    /// User input. Not used by this producer; may be `""`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

/// The identity of the user that asked the gateway for the secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub access_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_claims: BTreeMap<String, Vec<String>>,
}

impl ClientInfo {
    /// The first value of a sub-claim, if present and non-empty.
    pub fn sub_claim(&self, name: &str) -> Option<&str> {
        self.sub_claims
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// The caller's `email` sub-claim.
    pub fn email(&self) -> Option<&str> {
        self.sub_claim("email")
    }
}

/// Body of a `/sync/create` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateResponse {
    /// Identifier handed back on revoke. Empty for dry runs.
    pub id: String,

    pub response: Value,
}

impl CreateResponse {
    /// The empty response returned for dry runs.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Body of a `/sync/revoke` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevokeRequest {
    pub payload: String,

    /// IDs previously returned from create.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ids: Vec<String>,
}

/// Body of a `/sync/revoke` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub revoked: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
