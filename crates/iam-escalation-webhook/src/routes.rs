//! HTTP surface of the producer.
//!
//! `POST /sync/create` and `POST /sync/revoke` speak the gateway's custom
//! producer protocol. Bodies are decoded here so a malformed envelope is a
//! 400 with the decoder's message rather than axum's generic rejection.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use iam_escalation::auth::{Authenticator, ClaimsVerifier};
use iam_escalation::policy::PolicyClient;
use iam_escalation::{CreateRequest, CreateResponse, Producer, RevokeRequest, RevokeResponse};
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::error::WebhookError;

/// Header carrying the gateway credential. Header lookup ignores case.
pub const CREDS_HEADER: &str = "akeylesscreds";

/// Build the webhook router around a shared producer.
pub fn router<C, A, V>(producer: Arc<Producer<C, A, V>>) -> Router
where
    C: PolicyClient + 'static,
    A: Authenticator + 'static,
    V: ClaimsVerifier + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/sync/create", post(create::<C, A, V>))
        .route("/sync/revoke", post(revoke::<C, A, V>))
        .with_state(producer)
}

async fn health() -> &'static str {
    "ok"
}

async fn create<C, A, V>(
    State(producer): State<Arc<Producer<C, A, V>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CreateResponse>, WebhookError>
where
    C: PolicyClient + 'static,
    A: Authenticator + 'static,
    V: ClaimsVerifier + 'static,
{
    let request: CreateRequest = decode(&body)?;
    let creds = creds(&headers);

    let span = tracing::info_span!("create", access_id = %request.client_info.access_id);
    let response = producer
        .create(&request, creds)
        .instrument(span)
        .await?;

    Ok(Json(response))
}

async fn revoke<C, A, V>(
    State(producer): State<Arc<Producer<C, A, V>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RevokeResponse>, WebhookError>
where
    C: PolicyClient + 'static,
    A: Authenticator + 'static,
    V: ClaimsVerifier + 'static,
{
    let request: RevokeRequest = decode(&body)?;
    let creds = creds(&headers);

    let span = tracing::info_span!("revoke", ids = request.ids.len());
    let report = producer
        .revoke(&request, creds)
        .instrument(span)
        .await?;

    let failed = report.failures().count();
    if failed > 0 {
        tracing::warn!(failed, "revoke: some principals may still hold the role");
    }

    Ok(Json(report.acknowledge()))
}

fn creds(headers: &HeaderMap) -> Option<&str> {
    headers.get(CREDS_HEADER).and_then(|value| value.to_str().ok())
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, WebhookError> {
    serde_json::from_slice(body).map_err(|e| WebhookError::InvalidRequest(e.to_string()))
}
