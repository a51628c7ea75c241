//! Access-control policy documents.
//!
//! A [`Policy`] is a snapshot of a resource's IAM policy as returned by the
//! control plane. Fields this crate does not interpret (`auditConfigs`,
//! binding `condition`, ...) are carried through untouched so that writing
//! the policy back never drops data.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A role and the members holding it.
///
/// Members form a set: a member appears at most once and order carries no
/// meaning. A binding with no members must not stay in a policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,

    #[serde(default)]
    pub members: BTreeSet<String>,

    /// Uninterpreted fields, e.g. `condition`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Binding {
    /// Create a binding for a role with the given members.
    pub fn new<I, M>(role: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        Self {
            role: role.into(),
            members: members.into_iter().map(Into::into).collect(),
            extra: Map::new(),
        }
    }

    /// Check whether a member holds this binding's role.
    pub fn contains(&self, member: &str) -> bool {
        self.members.contains(member)
    }

    /// Attach a `condition` (builder style).
    pub fn with_condition(mut self, condition: Value) -> Self {
        self.extra.insert("condition".to_string(), condition);
        self
    }

    /// Whether the role only applies while a `condition` holds.
    pub fn is_conditional(&self) -> bool {
        self.extra.contains_key("condition")
    }
}

/// An access-control policy: an unordered collection of bindings.
///
/// Invariant: at most one unconditional binding per role, and no binding is
/// empty. A role may additionally appear in any number of conditional
/// bindings; those belong to other actors and are never reconciled.
/// Policies fetched from the control plane are trusted to satisfy this;
/// [`Policy::is_well_formed`] checks it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,

    /// Concurrency token echoed back on replace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default)]
    pub bindings: Vec<Binding>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Policy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding (builder style).
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Find the unconditional binding for a role. Matching is exact string
    /// equality; conditional bindings are skipped.
    pub fn binding(&self, role: &str) -> Option<&Binding> {
        self.unconditional_binding_position(role)
            .map(|index| &self.bindings[index])
    }

    pub(crate) fn unconditional_binding_position(&self, role: &str) -> Option<usize> {
        self.bindings
            .iter()
            .position(|b| b.role == role && !b.is_conditional())
    }

    /// Conditional bindings for a role.
    pub fn conditional_bindings<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a Binding> {
        self.bindings
            .iter()
            .filter(move |b| b.role == role && b.is_conditional())
    }

    /// Check whether a member holds a role unconditionally.
    pub fn has_member(&self, role: &str, member: &str) -> bool {
        self.binding(role).is_some_and(|b| b.contains(member))
    }

    /// Iterate over the roles present in this policy.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.role.as_str())
    }

    /// Check the policy invariants: one unconditional binding per role, no
    /// empty bindings.
    pub fn is_well_formed(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.bindings.iter().all(|b| {
            !b.members.is_empty() && (b.is_conditional() || seen.insert(b.role.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_preserves_unknown_fields() {
        let raw = json!({
            "version": 3,
            "etag": "BwX1",
            "bindings": [{
                "role": "roles/viewer",
                "members": ["user:b@example.com", "user:a@example.com"],
                "condition": {"title": "expires", "expression": "request.time < timestamp('2030-01-01T00:00:00Z')"}
            }],
            "auditConfigs": [{"service": "allServices"}]
        });

        let policy: Policy = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(policy.version, Some(3));
        assert_eq!(policy.etag.as_deref(), Some("BwX1"));
        assert!(policy.bindings[0].extra.contains_key("condition"));
        assert!(policy.extra.contains_key("auditConfigs"));

        let back = serde_json::to_value(&policy).unwrap();
        assert_eq!(back["auditConfigs"], raw["auditConfigs"]);
        assert_eq!(back["bindings"][0]["condition"], raw["bindings"][0]["condition"]);
        assert_eq!(back["etag"], "BwX1");
    }

    #[test]
    fn test_empty_policy_json() {
        let policy: Policy = serde_json::from_str(r#"{"etag":"ACAB"}"#).unwrap();
        assert!(policy.bindings.is_empty());
        assert_eq!(
            serde_json::to_value(&policy).unwrap(),
            json!({"etag": "ACAB", "bindings": []})
        );
    }

    #[test]
    fn test_members_are_a_set() {
        let binding: Binding = serde_json::from_value(json!({
            "role": "roles/owner",
            "members": ["user:a@example.com", "user:a@example.com"]
        }))
        .unwrap();

        assert_eq!(binding.members.len(), 1);
    }

    #[test]
    fn test_well_formed() {
        let ok = Policy::new()
            .with_binding(Binding::new("roles/viewer", ["user:a@example.com"]))
            .with_binding(Binding::new("roles/editor", ["user:b@example.com"]));
        assert!(ok.is_well_formed());

        let duplicate_role = ok
            .clone()
            .with_binding(Binding::new("roles/viewer", ["user:c@example.com"]));
        assert!(!duplicate_role.is_well_formed());

        let empty = Policy::new().with_binding(Binding::new("roles/viewer", Vec::<String>::new()));
        assert!(!empty.is_well_formed());
    }

    #[test]
    fn test_conditional_bindings_are_separate() {
        let expired = json!({"title": "expired", "expression": "request.time < timestamp('2020-01-01T00:00:00Z')"});
        let policy = Policy::new()
            .with_binding(
                Binding::new("roles/viewer", ["user:a@example.com"]).with_condition(expired),
            )
            .with_binding(Binding::new("roles/viewer", ["user:b@example.com"]));

        assert!(policy.is_well_formed());
        assert_eq!(
            policy.binding("roles/viewer"),
            Some(&Binding::new("roles/viewer", ["user:b@example.com"]))
        );
        assert!(!policy.has_member("roles/viewer", "user:a@example.com"));
        assert_eq!(policy.conditional_bindings("roles/viewer").count(), 1);
    }

    #[test]
    fn test_has_member() {
        let policy =
            Policy::new().with_binding(Binding::new("roles/viewer", ["user:a@example.com"]));

        assert!(policy.has_member("roles/viewer", "user:a@example.com"));
        assert!(!policy.has_member("roles/viewer", "user:b@example.com"));
        assert!(!policy.has_member("roles/editor", "user:a@example.com"));
    }
}
