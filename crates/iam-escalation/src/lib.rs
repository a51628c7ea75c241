//! # IAM Escalation
//!
//! A custom producer that grants a temporary IAM role binding when the
//! secrets gateway creates a dynamic secret, and removes it when the
//! secret is revoked.
//!
//! ## Overview
//!
//! - **Create**: authenticate the gateway credential, check the issuing
//!   item's path, resolve the caller's email, and add `user:<email>` to the
//!   requested role on a project, folder or organization.
//! - **Revoke**: authenticate, then remove each returned ID from the role,
//!   retrying transient failures with a bounded backoff.
//! - **Dry runs**: configuration checks by the gateway short-circuit without
//!   touching any policy.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use iam_escalation::{Producer, ProducerConfig};
//! use iam_escalation::auth::{PathPrefixVerifier, ValidationServiceAuthenticator, ValidationServiceConfig};
//! use iam_escalation::core::{ClientInfo, CreateRequest};
//! use iam_escalation::policy::{ResourceManagerClient, ResourceManagerConfig};
//!
//! async fn example(creds: &str) {
//!     let producer = Producer::new(
//!         ResourceManagerClient::new(ResourceManagerConfig::default()).unwrap(),
//!         ValidationServiceAuthenticator::new(ValidationServiceConfig::default()).unwrap(),
//!         PathPrefixVerifier::default(),
//!         ProducerConfig::new("p-gateway"),
//!     );
//!
//!     let request = CreateRequest {
//!         payload: r#"{"role":"roles/viewer","resource_type":"project","resource_id":"123"}"#.into(),
//!         client_info: ClientInfo::default(),
//!         input: None,
//!     };
//!
//!     let response = producer.create(&request, Some(creds)).await.unwrap();
//!     println!("granted to {}", response.id);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `iam_escalation::core` - Policies, bindings, payloads and envelopes
//! - `iam_escalation::policy` - Policy clients
//! - `iam_escalation::auth` - Credential validation and claims scoping

pub mod config;
pub mod error;
pub mod producer;
pub mod report;
pub mod retry;

// Re-export component crates
pub use iam_escalation_auth as auth;
pub use iam_escalation_core as core;
pub use iam_escalation_policy as policy;

pub use config::{ProducerConfig, DEFAULT_DRY_RUN_ACCESS_ID, DEFAULT_DRY_RUN_ID_PREFIX};
pub use error::{ProducerError, Result};
pub use producer::Producer;
pub use report::{PrincipalOutcome, RevokeReport};
pub use retry::{Backoff, Retried, RetryPolicy};

pub use iam_escalation_core::{
    CreateRequest, CreateResponse, EscalationPayload, GrantOutcome, Principal, ResourceRef,
    ResourceType, RevokeRequest, RevokeResponse,
};
