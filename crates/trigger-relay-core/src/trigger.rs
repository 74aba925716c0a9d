//! Trigger decoding.
//!
//! Each HTTP endpoint of the relay receives one of three body shapes:
//!
//! - `cron` — a flat JSON document `{"Name": ..., "Type": ..., "Location": ...}`
//!   produced by the scheduler,
//! - `pubsub` — a Pub/Sub push envelope whose `message.data` field is the
//!   base64 encoding of an inner JSON document `{"Name": ..., "Location": ...}`,
//! - `container-pubsub` — the same envelope shape, but the inner payload is
//!   ignored and the target bot is fixed.
//!
//! Decoding never fails: malformed or missing fields degrade to empty
//! strings so that the relay keeps the legacy permissive behavior.
//! Callers must check [`Trigger::is_routable`] before attempting a forward —
//! an empty bot name or location cannot produce a valid target host.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, warn};

// ============================================================================
// EndpointKind
// ============================================================================

/// The logical endpoint an inbound trigger arrived on.
///
/// The route selects the variant statically; no runtime inspection of the
/// body shape is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// `/v0` (legacy) and `/v0/cron` — scheduled pings.
    Cron,

    /// `/v0/pubsub` — Pub/Sub push notifications naming the target bot.
    PubSub,

    /// `/v0/container` — Pub/Sub push notifications for the container bot;
    /// the payload is ignored and the target is fixed.
    ContainerPubSub,
}

impl EndpointKind {
    /// The `x-github-event` value attached to forwards from this endpoint.
    pub fn github_event(&self) -> &'static str {
        match self {
            EndpointKind::Cron => "schedule.repository",
            EndpointKind::PubSub | EndpointKind::ContainerPubSub => "pubsub.message",
        }
    }

    /// Short name used in logs and error responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Cron => "cron",
            EndpointKind::PubSub => "pubsub",
            EndpointKind::ContainerPubSub => "container-pubsub",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Trigger
// ============================================================================

/// Bot name used for every forward from the container endpoint.
pub const CONTAINER_BOT_NAME: &str = "owl_bot";

/// Region used for every forward from the container endpoint.
pub const CONTAINER_BOT_LOCATION: &str = "us-central1";

/// A decoded instruction naming which bot to invoke and where.
///
/// One variant per inbound body shape. All variants carry the same two
/// fields; the variant records which decode path produced them, which in
/// turn determines the `x-github-event` value on the forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Decoded from a flat cron body.
    Cron { bot_name: String, bot_location: String },

    /// Decoded from a Pub/Sub envelope's inner payload.
    PubSub { bot_name: String, bot_location: String },

    /// Fixed container-bot target; the envelope payload is ignored.
    Container { bot_name: String, bot_location: String },
}

impl Trigger {
    /// Decode `raw_body` according to the endpoint that received it.
    ///
    /// Never fails: unknown shapes and missing fields yield empty strings.
    /// The body bytes are not modified or re-serialized; signing happens
    /// over the same buffer elsewhere.
    pub fn decode(kind: EndpointKind, raw_body: &[u8]) -> Self {
        match kind {
            EndpointKind::Cron => Self::decode_cron(raw_body),
            EndpointKind::PubSub => Self::decode_pubsub(raw_body),
            EndpointKind::ContainerPubSub => Self::decode_container(raw_body),
        }
    }

    fn decode_cron(raw_body: &[u8]) -> Self {
        let payload: CronPayload = serde_json::from_slice(raw_body).unwrap_or_else(|e| {
            warn!(error = %e, "failed to decode cron payload; forward will be unroutable");
            CronPayload::default()
        });

        Trigger::Cron {
            bot_name: payload.name,
            bot_location: payload.location,
        }
    }

    fn decode_pubsub(raw_body: &[u8]) -> Self {
        let envelope = PubSubEnvelope::from_slice(raw_body);
        debug!(subscription = %envelope.subscription, "handling pubsub message");

        let inner = envelope.decoded_data();
        debug!(bot_name = %inner.name, bot_location = %inner.location, "pubsub message target");

        Trigger::PubSub {
            bot_name: inner.name,
            bot_location: inner.location,
        }
    }

    fn decode_container(raw_body: &[u8]) -> Self {
        // The envelope is decoded for its subscription (log context only);
        // the inner payload does not influence the target.
        let envelope = PubSubEnvelope::from_slice(raw_body);
        debug!(
            subscription = %envelope.subscription,
            "handling container pubsub message with fixed target"
        );

        Trigger::Container {
            bot_name: CONTAINER_BOT_NAME.to_string(),
            bot_location: CONTAINER_BOT_LOCATION.to_string(),
        }
    }

    /// Name of the bot to invoke. Empty when decoding degenerated.
    pub fn bot_name(&self) -> &str {
        match self {
            Trigger::Cron { bot_name, .. }
            | Trigger::PubSub { bot_name, .. }
            | Trigger::Container { bot_name, .. } => bot_name,
        }
    }

    /// Region the bot is deployed in. Empty when decoding degenerated.
    pub fn bot_location(&self) -> &str {
        match self {
            Trigger::Cron { bot_location, .. }
            | Trigger::PubSub { bot_location, .. }
            | Trigger::Container { bot_location, .. } => bot_location,
        }
    }

    /// Whether this trigger names a complete target.
    ///
    /// A forward must not be attempted for an unroutable trigger: an empty
    /// name or location would produce a malformed target host or path.
    pub fn is_routable(&self) -> bool {
        !self.bot_name().is_empty() && !self.bot_location().is_empty()
    }
}

// ============================================================================
// Wire shapes
// ============================================================================

/// Flat scheduler payload: `{"Name": ..., "Type": ..., "Location": ...}`.
#[derive(Debug, Default, Deserialize)]
struct CronPayload {
    #[serde(rename = "Name", default)]
    name: String,

    // Present on the wire; the relay does not route on it.
    #[serde(rename = "Type", default)]
    #[allow(dead_code)]
    kind: String,

    #[serde(rename = "Location", default)]
    location: String,
}

/// Pub/Sub push envelope.
#[derive(Debug, Default, Deserialize)]
struct PubSubEnvelope {
    #[serde(default)]
    message: PubSubMessage,

    #[serde(default)]
    subscription: String,
}

#[derive(Debug, Default, Deserialize)]
struct PubSubMessage {
    /// Base64-encoded inner payload.
    #[serde(default)]
    data: String,

    #[serde(default)]
    #[allow(dead_code)]
    id: String,
}

/// Inner Pub/Sub payload naming the target bot.
#[derive(Debug, Default, Deserialize)]
struct BotRef {
    #[serde(rename = "Name", default)]
    name: String,

    #[serde(rename = "Location", default)]
    location: String,
}

impl PubSubEnvelope {
    fn from_slice(raw_body: &[u8]) -> Self {
        serde_json::from_slice(raw_body).unwrap_or_else(|e| {
            warn!(error = %e, "failed to decode pubsub envelope");
            PubSubEnvelope::default()
        })
    }

    /// Base64-decode and JSON-decode `message.data`.
    ///
    /// Both layers degrade to defaults on failure.
    fn decoded_data(&self) -> BotRef {
        let bytes = match BASE64.decode(&self.message.data) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "pubsub message data is not valid base64");
                return BotRef::default();
            }
        };

        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(error = %e, "pubsub message data is not a valid bot reference");
            BotRef::default()
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
