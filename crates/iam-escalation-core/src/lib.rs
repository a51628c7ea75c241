//! # IAM Escalation Core
//!
//! Pure primitives for temporary privilege escalation: access-control
//! policies, role bindings, and the reconciler that adds or removes a
//! principal from a binding.
//!
//! This crate contains no I/O, no networking, no clock. Everything here is
//! computation over a policy snapshot that some caller fetched and will
//! write back.
//!
//! ## Key Types
//!
//! - [`Policy`] - An access-control document made of [`Binding`]s
//! - [`Binding`] - A role and the set of members holding it
//! - [`ResourceType`] / [`ResourceRef`] - Which cloud resource a policy belongs to
//! - [`EscalationPayload`] - The `{role, resource_type, resource_id}` instruction
//! - [`Principal`] - The identity being granted or revoked (`user:<email>`)
//!
//! ## Reconciliation
//!
//! See the [`reconcile`] module. [`grant`] never fails; [`revoke`] fails
//! closed with [`CoreError::RoleNotExist`] when there is nothing to remove,
//! so a retrying caller can tell "already gone" from a transient failure.

pub mod envelope;
pub mod error;
pub mod policy;
pub mod reconcile;
pub mod types;

pub use envelope::{ClientInfo, CreateRequest, CreateResponse, RevokeRequest, RevokeResponse};
pub use error::{CoreError, Result};
pub use policy::{Binding, Policy};
pub use reconcile::{grant, revoke, GrantOutcome, RevokeOutcome};
pub use types::{EscalationPayload, Principal, ResourceRef, ResourceType};
