//! Claims scoping.
//!
//! The gateway credential is a JWT whose `attaches` claim names the secret
//! item that issued the request. Only items under a reserved directory may
//! trigger escalation; anyone able to create a custom secret elsewhere must
//! not be able to forge an escalation payload.

use std::collections::HashSet;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::{AuthError, Result};

/// Default directory whose items may request escalation.
pub const DEFAULT_ALLOWED_PREFIX: &str = "/dynamic-secrets/cloud-user-access/gcp";

/// The decoded claims this crate cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Claims {
    /// `attaches.item_name`, if present.
    pub item_name: Option<String>,
}

/// A verified item path: the request came from an item inside the allowed
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemScope {
    item_name: String,
}

impl ItemScope {
    pub fn item_name(&self) -> &str {
        &self.item_name
    }
}

/// Turns a raw credential into a verified [`ItemScope`] or a denial.
pub trait ClaimsVerifier: Send + Sync {
    fn verify(&self, creds: &str) -> Result<ItemScope>;
}

/// Accepts items whose path starts with a fixed prefix.
///
/// Matching is a plain string prefix. Configure the prefix with a trailing
/// `/` to require a directory boundary.
#[derive(Debug, Clone)]
pub struct PathPrefixVerifier {
    prefix: String,
}

impl PathPrefixVerifier {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for PathPrefixVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_PREFIX)
    }
}

impl ClaimsVerifier for PathPrefixVerifier {
    fn verify(&self, creds: &str) -> Result<ItemScope> {
        let claims = decode_claims(creds)?;

        let item_name = claims.item_name.ok_or_else(|| {
            AuthError::AuthorizationDenied("attaches claim is empty, can't verify path".into())
        })?;

        if !item_name.starts_with(&self.prefix) || item_name.split('/').any(|s| s == "..") {
            return Err(AuthError::AuthorizationDenied(format!(
                "{item_name} does not match allowed folder"
            )));
        }

        Ok(ItemScope { item_name })
    }
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    attaches: Option<Attaches>,
}

/// `attaches` arrives either as an object or as a JSON-encoded string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Attaches {
    Object(AttachesBody),
    Encoded(String),
}

#[derive(Deserialize)]
struct AttachesBody {
    #[serde(default)]
    item_name: Option<String>,
}

/// Decode the claims of a JWT without checking its signature.
///
/// The validation service has already vouched for the token by the time
/// claims are read. Anything that is not a well-formed token denies the
/// request.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let deny = |reason: String| AuthError::AuthorizationDenied(format!("can't read claims: {reason}"));

    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let raw = jsonwebtoken::decode::<RawClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| deny(e.to_string()))?
        .claims;

    let body = match raw.attaches {
        None => None,
        Some(Attaches::Object(body)) => Some(body),
        Some(Attaches::Encoded(encoded)) => {
            Some(serde_json::from_str::<AttachesBody>(&encoded).map_err(|e| deny(e.to_string()))?)
        }
    };

    Ok(Claims {
        item_name: body.and_then(|b| b.item_name).filter(|name| !name.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::{json, Value};

    fn token(claims: Value) -> String {
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(b"gateway")).unwrap()
    }

    fn encoded_attaches(item: &str) -> String {
        token(json!({ "attaches": json!({ "item_name": item }).to_string() }))
    }

    #[test]
    fn test_decode_encoded_attaches() {
        let claims = decode_claims(&encoded_attaches("/dynamic-secrets/x")).unwrap();
        assert_eq!(claims.item_name.as_deref(), Some("/dynamic-secrets/x"));
    }

    #[test]
    fn test_decode_object_attaches() {
        let creds = token(json!({ "attaches": { "item_name": "/a/b" } }));
        assert_eq!(decode_claims(&creds).unwrap().item_name.as_deref(), Some("/a/b"));
    }

    #[test]
    fn test_decode_missing_attaches() {
        let creds = token(json!({ "sub": "someone" }));
        assert_eq!(decode_claims(&creds).unwrap(), Claims::default());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_claims("opaque-string"),
            Err(AuthError::AuthorizationDenied(_))
        ));
        assert!(matches!(
            decode_claims("a.!!!.c"),
            Err(AuthError::AuthorizationDenied(_))
        ));
        assert!(matches!(
            decode_claims("a.b"),
            Err(AuthError::AuthorizationDenied(_))
        ));
        let bad_inner = token(json!({ "attaches": "{not json" }));
        assert!(matches!(
            decode_claims(&bad_inner),
            Err(AuthError::AuthorizationDenied(_))
        ));
    }

    #[test]
    fn test_decode_ignores_signature_and_expiry() {
        let mut creds = token(json!({
            "exp": 1,
            "aud": "someone-else",
            "attaches": { "item_name": "/a/b" },
        }));
        creds.push_str("tampered");

        assert_eq!(decode_claims(&creds).unwrap().item_name.as_deref(), Some("/a/b"));
    }

    #[test]
    fn test_verifier_allows_prefix() {
        let verifier = PathPrefixVerifier::default();
        let scope = verifier
            .verify(&encoded_attaches("/dynamic-secrets/cloud-user-access/gcp/prod-viewer"))
            .unwrap();
        assert_eq!(
            scope.item_name(),
            "/dynamic-secrets/cloud-user-access/gcp/prod-viewer"
        );
    }

    #[test]
    fn test_verifier_denies_other_directories() {
        let verifier = PathPrefixVerifier::default();

        for item in [
            "/dynamic-secrets/my-own/gcp",
            "/personal/dynamic-secrets/cloud-user-access/gcp",
            "/dynamic-secrets/cloud-user-access/gcp/../../mine",
        ] {
            let err = verifier.verify(&encoded_attaches(item)).unwrap_err();
            assert!(matches!(err, AuthError::AuthorizationDenied(_)), "{item}");
        }
    }

    #[test]
    fn test_verifier_denies_missing_claim() {
        let verifier = PathPrefixVerifier::default();
        let err = verifier.verify(&token(json!({}))).unwrap_err();
        assert!(matches!(err, AuthError::AuthorizationDenied(msg) if msg.contains("attaches")));
    }

    #[test]
    fn test_directory_boundary_prefix() {
        let verifier = PathPrefixVerifier::new("/dynamic-secrets/cloud-user-access/gcp/");
        assert!(verifier
            .verify(&encoded_attaches("/dynamic-secrets/cloud-user-access/gcp-other"))
            .is_err());
        assert!(verifier
            .verify(&encoded_attaches("/dynamic-secrets/cloud-user-access/gcp/x"))
            .is_ok());
    }
}
