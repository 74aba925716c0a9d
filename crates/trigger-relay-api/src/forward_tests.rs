//! Tests for the reqwest-backed forwarder against a mocked bot.

use super::*;
use axum::http::{HeaderMap, HeaderValue, Method};
use bytes::Bytes;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn outbound_to(server: &MockServer, bot_path: &str) -> OutboundRequest {
    let mut headers = HeaderMap::new();
    headers.insert("x-hub-signature", HeaderValue::from_static("sha1=abc"));
    headers.insert("x-github-event", HeaderValue::from_static("schedule.repository"));

    OutboundRequest {
        method: Method::POST,
        url: Url::parse(&format!("{}{}", server.uri(), bot_path)).unwrap(),
        headers,
        body: Bytes::from_static(b"payload"),
        delivery_id: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn forwards_method_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/owlbot"))
        .and(header("x-hub-signature", "sha1=abc"))
        .and(header("x-github-event", "schedule.repository"))
        .and(body_bytes(b"payload".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_string("bot-ok"))
        .expect(1)
        .mount(&server)
        .await;

    let forwarder = HttpForwarder::new(reqwest::Client::new());

    let response = forwarder.forward(outbound_to(&server, "/owlbot")).await.unwrap();

    assert_eq!(response.status(), 200);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"bot-ok");
}

#[tokio::test]
async fn relays_downstream_status_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/owlbot"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-bot-reason", "no such task")
                .set_body_string("not found"),
        )
        .mount(&server)
        .await;

    let forwarder = HttpForwarder::new(reqwest::Client::new());

    let response = forwarder.forward(outbound_to(&server, "/owlbot")).await.unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(response.headers().get("x-bot-reason").unwrap(), "no such task");
}

#[tokio::test]
async fn unreachable_bot_is_an_upstream_error() {
    let forwarder = HttpForwarder::new(reqwest::Client::new());

    let request = OutboundRequest {
        method: Method::POST,
        // Reserved port with nothing listening.
        url: Url::parse("http://127.0.0.1:1/owlbot").unwrap(),
        headers: HeaderMap::new(),
        body: Bytes::new(),
        delivery_id: Uuid::new_v4(),
    };

    let error = forwarder.forward(request).await.unwrap_err();

    assert!(matches!(error, ForwardError::Upstream { .. }));
}
