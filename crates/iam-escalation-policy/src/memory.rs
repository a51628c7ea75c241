//! In-memory implementation of the PolicyClient trait.
//!
//! This is primarily for testing. It follows the control plane's etag
//! semantics: every replace bumps the etag, and a replace carrying a stale
//! etag is rejected with [`PolicyError::Conflict`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use iam_escalation_core::{Policy, ResourceRef};

use crate::client::PolicyClient;
use crate::error::{PolicyError, Result};

/// In-memory policy client.
///
/// Resources that were never written have an empty policy.
#[derive(Debug, Default)]
pub struct MemoryPolicyClient {
    inner: RwLock<HashMap<ResourceRef, StoredPolicy>>,
}

#[derive(Debug, Clone)]
struct StoredPolicy {
    policy: Policy,
    generation: u64,
}

impl StoredPolicy {
    fn empty() -> Self {
        let mut policy = Policy::new();
        policy.etag = Some(etag(0));
        Self {
            policy,
            generation: 0,
        }
    }
}

fn etag(generation: u64) -> String {
    format!("gen-{generation}")
}

impl MemoryPolicyClient {
    /// Create an empty client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a resource's policy, overwriting whatever was there.
    pub fn insert(&self, resource: ResourceRef, mut policy: Policy) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let generation = inner.get(&resource).map_or(1, |s| s.generation + 1);
        policy.etag = Some(etag(generation));
        inner.insert(resource, StoredPolicy { policy, generation });
    }

    /// Current policy of a resource, if it was ever written.
    pub fn get(&self, resource: &ResourceRef) -> Option<Policy> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.get(resource).map(|s| s.policy.clone())
    }
}

#[async_trait]
impl PolicyClient for MemoryPolicyClient {
    async fn fetch(&self, resource: &ResourceRef) -> Result<Policy> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .get(resource)
            .cloned()
            .unwrap_or_else(StoredPolicy::empty)
            .policy)
    }

    async fn replace(&self, resource: &ResourceRef, policy: &Policy) -> Result<Policy> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let current = inner
            .get(resource)
            .cloned()
            .unwrap_or_else(StoredPolicy::empty);

        // Like the control plane, an absent etag means "overwrite blindly"
        if policy.etag.is_some() && policy.etag != current.policy.etag {
            return Err(PolicyError::Conflict(resource.path()));
        }

        let generation = current.generation + 1;
        let mut stored = policy.clone();
        stored.etag = Some(etag(generation));
        inner.insert(
            resource.clone(),
            StoredPolicy {
                policy: stored.clone(),
                generation,
            },
        );

        Ok(stored)
    }
}
