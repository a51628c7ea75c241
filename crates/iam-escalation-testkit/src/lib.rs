//! # IAM Escalation Testkit
//!
//! Testing utilities for the IAM escalation producer.
//!
//! ## Overview
//!
//! - **Fixtures**: request builders and throwaway gateway credentials
//! - **Fakes**: [`StaticAuthenticator`] and [`FlakyPolicyClient`], which
//!   record calls and can be scripted to fail
//! - **Generators**: Proptest strategies for roles, members and policies
//!
//! ## Test Fixtures
//!
//! ```rust
//! use iam_escalation_testkit::fixtures::{create_request, payload};
//!
//! let request = create_request(
//!     &payload("roles/viewer", "project", "123"),
//!     Some("a@example.com"),
//! );
//! assert_eq!(request.client_info.email(), Some("a@example.com"));
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    allowed_creds, claims_token, create_request, dry_run_create_request, payload, revoke_request,
    AuthCall, FlakyPolicyClient, StaticAuthenticator, ALLOWED_ITEM, GATEWAY_ACCESS_ID,
    USER_ACCESS_ID,
};
