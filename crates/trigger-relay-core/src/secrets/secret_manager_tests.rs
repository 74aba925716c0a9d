//! Tests for the secret-version backend against a mocked REST service.

use super::*;
use crate::secrets::StaticTokenSource;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> SecretManagerSecretStore {
    SecretManagerSecretStore::new(
        reqwest::Client::new(),
        Arc::new(StaticTokenSource::new("test-token")),
        "myproj",
    )
    .with_endpoint(server.uri())
}

fn record_body(record: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "name": "projects/myproj/secrets/owlbot/versions/3",
        "payload": { "data": BASE64.encode(record.to_string()) }
    })
}

#[tokio::test]
async fn resolve_uses_secret_field_of_latest_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/myproj/secrets/owlbot/versions/latest:access"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_body(serde_json::json!({
            "secret": "hook-secret",
            "privateKey": "pk",
            "appId": 99
        }))))
        .mount(&server)
        .await;

    let store = store_for(&server);

    let secret = store.resolve("owlbot").await.unwrap();

    assert_eq!(secret.expose_bytes(), b"hook-secret");
}

#[tokio::test]
async fn missing_secret_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/myproj/secrets/ghost/versions/latest:access"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store_for(&server);

    let error = store.resolve("ghost").await.unwrap_err();

    assert!(matches!(error, SecretError::NotFound { name } if name == "ghost"));
}

#[tokio::test]
async fn non_json_payload_maps_to_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/myproj/secrets/owlbot/versions/latest:access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "payload": { "data": BASE64.encode("not a json record") }
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);

    let error = store.resolve("owlbot").await.unwrap_err();

    assert!(matches!(error, SecretError::Malformed { .. }));
}

#[tokio::test]
async fn backend_outage_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/myproj/secrets/owlbot/versions/latest:access"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = store_for(&server);

    let error = store.resolve("owlbot").await.unwrap_err();

    assert!(error.is_transient());
}
