//! PolicyClient trait: the abstract interface to a resource's IAM policy.
//!
//! Implementations include the Cloud Resource Manager REST client and an
//! in-memory client for tests.

use async_trait::async_trait;
use iam_escalation_core::{Policy, ResourceRef};

use crate::error::Result;

/// Async interface for reading and writing resource policies.
///
/// Resource types are a closed set ([`iam_escalation_core::ResourceType`]),
/// so there is no "unsupported type" failure at this layer.
///
/// # Design Notes
///
/// - **No caching**: every `fetch` returns the control plane's current state.
/// - **Full replace**: `replace` overwrites the whole document, including
///   bindings the caller did not touch.
#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// Fetch the current policy of a resource.
    async fn fetch(&self, resource: &ResourceRef) -> Result<Policy>;

    /// Replace the policy of a resource. Returns the stored policy.
    async fn replace(&self, resource: &ResourceRef, policy: &Policy) -> Result<Policy>;
}

/// Extension trait for the read-modify-write cycle.
pub trait PolicyClientExt: PolicyClient {
    /// Fetch a fresh snapshot, apply `mutate`, and replace it.
    ///
    /// If `mutate` fails the policy is not written. If it leaves the policy
    /// unchanged the replace call is skipped.
    fn read_modify_write<T, F>(
        &self,
        resource: &ResourceRef,
        mutate: F,
    ) -> impl std::future::Future<Output = Result<T>> + Send
    where
        T: Send,
        F: FnOnce(&mut Policy) -> iam_escalation_core::Result<T> + Send;
}

impl<C: PolicyClient + ?Sized> PolicyClientExt for C {
    async fn read_modify_write<T, F>(&self, resource: &ResourceRef, mutate: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut Policy) -> iam_escalation_core::Result<T> + Send,
    {
        let mut policy = self.fetch(resource).await?;
        let snapshot = policy.clone();

        let value = mutate(&mut policy)?;

        if policy == snapshot {
            tracing::debug!(%resource, "policy unchanged, skipping replace");
        } else {
            self.replace(resource, &policy).await?;
        }

        Ok(value)
    }
}
