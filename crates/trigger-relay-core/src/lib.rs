//! # Trigger-Relay Core
//!
//! Domain logic for the Trigger Relay gateway.
//!
//! Trigger Relay accepts scheduled "cron" pings and Pub/Sub push
//! notifications addressed to independently deployed serverless bots, and
//! turns each into a signed, correctly-addressed forwarded request. This
//! crate holds the pieces with real protocol logic and no HTTP-server
//! dependencies:
//!
//! - [`trigger`] — decoding the three inbound body shapes into a bot target
//! - [`secrets`] — resolving the per-bot shared HMAC secret from one of the
//!   pluggable backends
//! - [`signature`] — computing the `x-hub-signature` value over the raw
//!   request body
//!
//! ## Architecture
//!
//! Business logic depends only on trait abstractions
//! ([`secrets::SecretStore`], [`secrets::AccessTokenSource`]); concrete
//! backends are selected once at startup and injected. Everything here is
//! request-scoped: no caches, no shared mutable state, no retries.

pub mod secrets;
pub mod signature;
pub mod trigger;

pub use secrets::{BotSecret, SecretError, SecretStore};
pub use signature::{SignatureEncoding, SignatureFormat};
pub use trigger::{EndpointKind, Trigger};
