//! # IAM Escalation Auth
//!
//! Everything the producer needs to decide whether to honor a request:
//!
//! - [`Authenticator`] - checks the opaque gateway credential against an
//!   external validation service, scoped to an expected access ID
//! - [`ClaimsVerifier`] - extracts the issuing item's path from the
//!   credential's claims and checks it against an allowed prefix,
//!   returning a typed [`ItemScope`]
//!
//! Authentication always runs first. The claims verifier only parses the
//! credential; it relies on the validation service for signature checks.

pub mod authenticator;
pub mod claims;
pub mod error;

pub use authenticator::{Authenticator, ValidationServiceAuthenticator, ValidationServiceConfig};
pub use claims::{decode_claims, Claims, ClaimsVerifier, ItemScope, PathPrefixVerifier};
pub use error::{AuthError, Result};
