//! Request rewriting.
//!
//! Turns an inbound trigger request into the outbound request delivered to
//! the bot. The steps run in a fixed order because later ones depend on
//! earlier ones:
//!
//! 1. force the secure scheme,
//! 2. drop the inbound `user-agent` (the relay does not leak its identity)
//!    and hop-by-hop headers,
//! 3. point host (URL and `host` header) at
//!    `{botLocation}-{project}.cloudfunctions.net`,
//! 4. set the path to `/{botName}`,
//! 5. attach `x-github-event`, a fresh `x-github-delivery` id, and the
//!    `x-hub-signature` computed over the raw body.
//!
//! The body is carried through byte-for-byte; it was already used as the
//! signing input and must reach the bot unchanged.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use bytes::Bytes;
use trigger_relay_core::{EndpointKind, Trigger};
use url::Url;
use uuid::Uuid;

/// Header carrying the HMAC signature of the body.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Header carrying the per-forward delivery id.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Header naming the event kind for the receiving bot framework.
pub const EVENT_HEADER: &str = "x-github-event";

/// A fully rewritten request, ready for the forwarding proxy.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,

    /// The delivery id also present in [`DELIVERY_HEADER`]; kept here for
    /// log correlation without re-parsing headers.
    pub delivery_id: Uuid,
}

/// Rewrite failures. These indicate a target that cannot be expressed as a
/// valid URL or header value and map to a 5xx for the caller.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("cannot build target URL for bot {bot_name:?} in {bot_location:?}: {message}")]
    InvalidTarget {
        bot_name: String,
        bot_location: String,
        message: String,
    },

    #[error("cannot encode header {name}: {message}")]
    InvalidHeader { name: String, message: String },
}

/// Build the outbound request for `trigger`.
///
/// `signature` is the precomputed value of [`SIGNATURE_HEADER`]; `body`
/// must be the exact bytes the signature was computed over.
pub fn rewrite(
    method: Method,
    inbound_headers: &HeaderMap,
    kind: EndpointKind,
    trigger: &Trigger,
    signature: &str,
    project: &str,
    body: Bytes,
) -> Result<OutboundRequest, RewriteError> {
    let host = format!("{}-{}.cloudfunctions.net", trigger.bot_location(), project);

    let url = Url::parse(&format!("https://{}/{}", host, trigger.bot_name())).map_err(|e| {
        RewriteError::InvalidTarget {
            bot_name: trigger.bot_name().to_string(),
            bot_location: trigger.bot_location().to_string(),
            message: e.to_string(),
        }
    })?;

    let mut headers = HeaderMap::with_capacity(inbound_headers.len() + 4);
    for (name, value) in inbound_headers {
        if name == &header::USER_AGENT || name == &header::HOST || is_hop_by_hop(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers.insert(header::HOST, header_value(header::HOST.as_str(), &host)?);
    headers.insert(
        HeaderName::from_static(EVENT_HEADER),
        HeaderValue::from_static(kind.github_event()),
    );

    let delivery_id = Uuid::new_v4();
    headers.insert(
        HeaderName::from_static(DELIVERY_HEADER),
        header_value(DELIVERY_HEADER, &delivery_id.to_string())?,
    );
    headers.insert(
        HeaderName::from_static(SIGNATURE_HEADER),
        header_value(SIGNATURE_HEADER, signature)?,
    );

    Ok(OutboundRequest {
        method,
        url,
        headers,
        body,
        delivery_id,
    })
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, RewriteError> {
    HeaderValue::from_str(value).map_err(|e| RewriteError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Connection-scoped headers that must not travel through a proxy hop.
/// Content-framing headers are recomputed by the outbound client.
pub(crate) fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "content-length"
    )
}

#[cfg(test)]
#[path = "rewrite_tests.rs"]
mod tests;
