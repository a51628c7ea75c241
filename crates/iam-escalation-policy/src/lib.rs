//! # IAM Escalation Policy
//!
//! Access to resource IAM policies behind the [`PolicyClient`] trait, so the
//! producer is independent of the control plane it talks to.
//!
//! ## Key Types
//!
//! - [`PolicyClient`] - Async `fetch` / `replace` of a resource's policy
//! - [`PolicyClientExt`] - The fetch, mutate, replace cycle built on top
//! - [`ResourceManagerClient`] - Cloud Resource Manager v3 over HTTPS
//! - [`MemoryPolicyClient`] - In-memory policies for tests
//! - [`TokenSource`] - Where the bearer token for the control plane comes from
//!
//! ## Usage
//!
//! ```rust,no_run
//! use iam_escalation_core::{grant, ResourceRef};
//! use iam_escalation_policy::{PolicyClientExt, ResourceManagerClient, ResourceManagerConfig};
//!
//! async fn example() {
//!     let client = ResourceManagerClient::new(ResourceManagerConfig::default()).unwrap();
//!     let project = ResourceRef::project("123").unwrap();
//!
//!     client
//!         .read_modify_write(&project, |policy| {
//!             Ok(grant(policy, "roles/viewer", "user:a@example.com"))
//!         })
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Full replace**: `replace` writes the whole document. Always derive it
//!   from a fresh `fetch`.
//! - **Etag echo**: the fetched etag is sent back, so a concurrent writer
//!   turns a silent lost update into [`PolicyError::Conflict`].

pub mod client;
pub mod error;
pub mod memory;
pub mod resource_manager;
pub mod token;

pub use client::{PolicyClient, PolicyClientExt};
pub use error::{PolicyError, Result};
pub use memory::MemoryPolicyClient;
pub use resource_manager::{ResourceManagerClient, ResourceManagerConfig};
pub use token::TokenSource;
