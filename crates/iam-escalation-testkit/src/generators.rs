//! Proptest generators for property-based testing.

use proptest::prelude::*;

use iam_escalation_core::{Binding, Policy, ResourceRef, ResourceType};

/// Generate a role name.
pub fn role() -> impl Strategy<Value = String> {
    "roles/[a-z]{1,8}(\\.[a-z]{1,8})?".prop_map(String::from)
}

/// Generate a user member string.
pub fn member() -> impl Strategy<Value = String> {
    "user:[a-z]{1,8}@example\\.(com|org)".prop_map(String::from)
}

/// Generate a supported resource type.
pub fn resource_type() -> impl Strategy<Value = ResourceType> {
    prop::sample::select(ResourceType::ALL.to_vec())
}

/// Generate a valid resource reference.
pub fn resource_ref() -> impl Strategy<Value = ResourceRef> {
    (resource_type(), "[a-z0-9-]{1,12}").prop_filter_map("invalid resource id", |(kind, id)| {
        ResourceRef::new(kind, id).ok()
    })
}

/// Generate a binding with one to three members.
pub fn binding() -> impl Strategy<Value = Binding> {
    (role(), prop::collection::btree_set(member(), 1..4))
        .prop_map(|(role, members)| Binding::new(role, members))
}

/// Generate a well-formed policy: unique roles, no empty bindings.
pub fn policy() -> impl Strategy<Value = Policy> {
    prop::collection::btree_map(role(), prop::collection::btree_set(member(), 1..4), 0..6)
        .prop_map(|bindings| Policy {
            bindings: bindings
                .into_iter()
                .map(|(role, members)| Binding::new(role, members))
                .collect(),
            ..Policy::default()
        })
}
