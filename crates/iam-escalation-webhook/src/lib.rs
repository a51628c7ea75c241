//! # IAM Escalation Webhook
//!
//! The HTTP face of the escalation producer: an axum [`router`] for the
//! gateway's `/sync/create` and `/sync/revoke` calls, and the mapping from
//! [`WebhookError`] to HTTP status codes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use iam_escalation::auth::{PathPrefixVerifier, ValidationServiceAuthenticator, ValidationServiceConfig};
//! use iam_escalation::policy::{ResourceManagerClient, ResourceManagerConfig};
//! use iam_escalation::{Producer, ProducerConfig};
//!
//! async fn example() {
//!     let producer = Producer::new(
//!         ResourceManagerClient::new(ResourceManagerConfig::default()).unwrap(),
//!         ValidationServiceAuthenticator::new(ValidationServiceConfig::default()).unwrap(),
//!         PathPrefixVerifier::default(),
//!         ProducerConfig::new("p-gateway"),
//!     );
//!
//!     let app = iam_escalation_webhook::router(Arc::new(producer));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod routes;

pub use error::WebhookError;
pub use routes::{router, CREDS_HEADER};
