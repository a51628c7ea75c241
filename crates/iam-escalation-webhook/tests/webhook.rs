//! Drives the router the way the gateway does.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use iam_escalation::auth::PathPrefixVerifier;
use iam_escalation::core::{Binding, Policy};
use iam_escalation::{Producer, ProducerConfig, ResourceRef};
use iam_escalation_testkit::fixtures::{
    allowed_creds, claims_token, create_request, payload, revoke_request, FlakyPolicyClient,
    StaticAuthenticator, GATEWAY_ACCESS_ID,
};
use serde_json::{json, Value};
use tower::ServiceExt;

type TestProducer = Producer<FlakyPolicyClient, StaticAuthenticator, PathPrefixVerifier>;

fn setup(client: FlakyPolicyClient, auth: StaticAuthenticator) -> (Router, Arc<TestProducer>) {
    let producer = Arc::new(Producer::new(
        client,
        auth,
        PathPrefixVerifier::default(),
        ProducerConfig::new(GATEWAY_ACCESS_ID),
    ));
    (iam_escalation_webhook::router(producer.clone()), producer)
}

fn project() -> ResourceRef {
    ResourceRef::project("123").unwrap()
}

fn post(uri: &str, creds: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(creds) = creds {
        builder = builder.header("AkeylessCreds", creds);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn create_body(email: Option<&str>) -> String {
    serde_json::to_string(&create_request(
        &payload("roles/viewer", "project", "123"),
        email,
    ))
    .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup(FlakyPolicyClient::new(), StaticAuthenticator::accepting());

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_create_escalates() {
    let (app, producer) = setup(FlakyPolicyClient::new(), StaticAuthenticator::accepting());
    let creds = allowed_creds();

    let (status, body) = send(
        app,
        post("/sync/create", Some(&creds), create_body(Some("a@example.com"))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        body,
        json!({
            "id": "user:a@example.com",
            "response": "escalated user:a@example.com to roles/viewer on project 123",
        })
    );

    // The header name is matched without regard to case
    assert_eq!(producer.authenticator().calls()[0].creds, creds);
    assert!(producer
        .policies()
        .get(&project())
        .unwrap()
        .has_member("roles/viewer", "user:a@example.com"));
}

#[tokio::test]
async fn test_create_dry_run() {
    let (app, producer) = setup(FlakyPolicyClient::new(), StaticAuthenticator::rejecting());
    let body = json!({
        "payload": payload("roles/viewer", "project", "123"),
        "client_info": { "access_id": "p-custom", "sub_claims": null },
        "input": "",
    });

    let (status, body) = send(app, post("/sync/create", None, body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "id": "", "response": null }));
    assert_eq!(producer.policies().fetch_count(), 0);
}

#[tokio::test]
async fn test_create_without_credentials_is_unauthorized() {
    let (app, _) = setup(FlakyPolicyClient::new(), StaticAuthenticator::accepting());

    let (status, _) = send(app, post("/sync/create", None, create_body(Some("a@example.com")))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_outside_allowed_directory_is_forbidden() {
    let (app, producer) = setup(FlakyPolicyClient::new(), StaticAuthenticator::accepting());
    let creds = claims_token("/dynamic-secrets/elsewhere/gcp");

    let (status, _) = send(
        app,
        post("/sync/create", Some(&creds), create_body(Some("a@example.com"))),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(producer.policies().fetch_count(), 0);
}

#[tokio::test]
async fn test_create_missing_email_is_bad_request() {
    let (app, _) = setup(FlakyPolicyClient::new(), StaticAuthenticator::accepting());

    let (status, body) = send(
        app,
        post("/sync/create", Some(&allowed_creds()), create_body(None)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"email sub-claim is required");
}

#[tokio::test]
async fn test_create_unknown_field_is_bad_request() {
    let (app, _) = setup(FlakyPolicyClient::new(), StaticAuthenticator::accepting());
    let body = json!({
        "payload": payload("roles/viewer", "project", "123"),
        "client_info": { "access_id": "p-user" },
        "surprise": true,
    });

    let (status, body) = send(
        app,
        post("/sync/create", Some(&allowed_creds()), body.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8(body).unwrap().starts_with("invalid request"));
}

#[tokio::test]
async fn test_create_backend_failure_is_bad_gateway() {
    let (app, _) = setup(FlakyPolicyClient::always_failing(), StaticAuthenticator::accepting());

    let (status, _) = send(
        app,
        post("/sync/create", Some(&allowed_creds()), create_body(Some("a@example.com"))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_revoke_acknowledges_ids() {
    let client = FlakyPolicyClient::new();
    client.insert(
        project(),
        Policy::new().with_binding(Binding::new("roles/viewer", ["user:a@example.com"])),
    );
    let (app, producer) = setup(client, StaticAuthenticator::accepting());
    let body = serde_json::to_string(&revoke_request(
        &payload("roles/viewer", "project", "123"),
        &["user:a@example.com"],
    ))
    .unwrap();

    let (status, body) = send(app, post("/sync/revoke", Some(&allowed_creds()), body)).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "revoked": ["user:a@example.com"] }));
    assert!(producer
        .policies()
        .get(&project())
        .unwrap()
        .bindings
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_revoke_acknowledges_even_after_giving_up() {
    let (app, producer) = setup(FlakyPolicyClient::always_failing(), StaticAuthenticator::accepting());
    let body = serde_json::to_string(&revoke_request(
        &payload("roles/viewer", "project", "123"),
        &["user:a@example.com"],
    ))
    .unwrap();

    let (status, body) = send(app, post("/sync/revoke", Some(&allowed_creds()), body)).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "revoked": ["user:a@example.com"] }));
    assert_eq!(producer.policies().fetch_count(), 3);
}

#[tokio::test]
async fn test_revoke_dry_run() {
    let (app, producer) = setup(FlakyPolicyClient::new(), StaticAuthenticator::rejecting());
    let body = json!({
        "payload": payload("roles/viewer", "project", "123"),
        "ids": ["tmp-1a2b"],
    });

    let (status, body) = send(app, post("/sync/revoke", None, body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "revoked": ["tmp-1a2b"] }));
    assert_eq!(producer.authenticator().call_count(), 0);
}

#[tokio::test]
async fn test_revoke_rejected_credentials() {
    let (app, _) = setup(FlakyPolicyClient::new(), StaticAuthenticator::rejecting());
    let body = serde_json::to_string(&revoke_request(
        &payload("roles/viewer", "project", "123"),
        &["user:a@example.com"],
    ))
    .unwrap();

    let (status, _) = send(app, post("/sync/revoke", Some("opaque"), body)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
