//! Forwarding proxy.
//!
//! Relays a rewritten request to the target bot and hands the bot's
//! response back unaltered. Of the whole relay path, only the *request*
//! body is buffered (it had to be, for signing); the response streams
//! through without buffering.
//!
//! There is no retry logic: a failed forward fails that request, is
//! logged, and surfaces as a 502 to the trigger source.

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use tracing::{debug, instrument};

use crate::rewrite::{is_hop_by_hop, OutboundRequest};

/// Relays rewritten requests. Trait-shaped so handler tests can observe
/// forwards without a network.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Deliver `request` and return the bot's response for relay.
    async fn forward(&self, request: OutboundRequest) -> Result<Response, ForwardError>;
}

/// Forward failures.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("request to bot failed: {message}")]
    Upstream { message: String },
}

/// reqwest-backed [`Forwarder`].
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    #[instrument(skip(self, request), fields(url = %request.url, delivery_id = %request.delivery_id))]
    async fn forward(&self, request: OutboundRequest) -> Result<Response, ForwardError> {
        let upstream = self
            .client
            .request(request.method, request.url.clone())
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| ForwardError::Upstream {
                message: e.to_string(),
            })?;

        let status = upstream.status();
        debug!(status = %status, "bot responded");

        let mut headers = upstream.headers().clone();
        let hop_by_hop: Vec<_> = headers
            .keys()
            .filter(|name| is_hop_by_hop(name))
            .cloned()
            .collect();
        for name in hop_by_hop {
            headers.remove(name);
        }

        // Stream the response body straight through.
        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        Ok(response)
    }
}

#[cfg(test)]
#[path = "forward_tests.rs"]
mod tests;
