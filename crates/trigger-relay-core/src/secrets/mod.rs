//! # Secret resolution
//!
//! Every bot shares an HMAC secret with the relay, keyed by bot name. This
//! module defines the [`SecretStore`] contract and its backends:
//!
//! | Backend | Source |
//! |---|---|
//! | [`GcsKmsSecretStore`] | Encrypted object in a storage bucket, decrypted through the key-management service |
//! | [`SecretManagerSecretStore`] | Latest version of a managed secret, JSON record |
//! | [`MemorySecretStore`] | In-process map for development and tests |
//!
//! Resolution is per-request with no caching: bot secrets rotate and the
//! trigger volume is low, so freshness wins over the few hundred
//! milliseconds a backend round trip costs.
//!
//! Secret material is never logged; [`BotSecret`] redacts its Debug output
//! and zeroizes on drop.

pub mod auth;
pub mod gcs_kms;
pub mod memory;
pub mod secret_manager;

pub use auth::{AccessTokenSource, MetadataTokenSource, StaticTokenSource};
pub use gcs_kms::GcsKmsSecretStore;
pub use memory::MemorySecretStore;
pub use secret_manager::SecretManagerSecretStore;

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use zeroize::ZeroizeOnDrop;

// ============================================================================
// BotSecret
// ============================================================================

/// Shared HMAC key bytes for one bot.
///
/// The value never appears in Debug output or logs, and the buffer is
/// zeroized when dropped.
#[derive(Clone, Default, ZeroizeOnDrop)]
pub struct BotSecret(Vec<u8>);

impl BotSecret {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Wrap a UTF-8 secret string.
    pub fn from_string(value: String) -> Self {
        Self(value.into_bytes())
    }

    /// The key bytes, for immediate use as HMAC input only.
    pub fn expose_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length without exposing content.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BotSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotSecret")
            .field("length", &self.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// BotSecretRecord
// ============================================================================

/// Structured secret record stored by the secret-version backend.
///
/// Newer deployments store a JSON document per bot; only `secret` feeds
/// request signing here. The other fields belong to the bot's own GitHub
/// App credentials and pass through untouched.
#[derive(Deserialize, ZeroizeOnDrop)]
pub struct BotSecretRecord {
    /// Webhook shared secret — the HMAC key.
    pub secret: String,

    /// GitHub App private key (unused by the relay).
    #[serde(rename = "privateKey", default)]
    pub private_key: String,

    /// GitHub App id (unused by the relay).
    #[serde(rename = "appId", default)]
    pub app_id: u64,
}

impl BotSecretRecord {
    /// The HMAC key carried by this record.
    pub fn signing_secret(&self) -> BotSecret {
        BotSecret::from_string(self.secret.clone())
    }
}

impl fmt::Debug for BotSecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotSecretRecord")
            .field("secret", &"[REDACTED]")
            .field("private_key", &"[REDACTED]")
            .field("app_id", &self.app_id)
            .finish()
    }
}

// ============================================================================
// SecretStore
// ============================================================================

/// Resolve the shared secret associated with a bot name.
///
/// Implementations are selected once at startup from configuration and
/// shared read-only across requests. A resolution is a pure read: no
/// memoization, no retries.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Resolve the HMAC key for `bot_name`.
    ///
    /// # Errors
    ///
    /// - [`SecretError::NotFound`] — no secret exists under that name
    /// - [`SecretError::AccessDenied`] — the backend rejected the caller
    /// - [`SecretError::ServiceUnavailable`] — transient backend failure
    /// - [`SecretError::InvalidName`] — the name cannot form a resource path
    async fn resolve(&self, bot_name: &str) -> Result<BotSecret, SecretError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Errors from secret resolution.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret not found for bot: {name}")]
    NotFound { name: String },

    #[error("access denied resolving secret for bot {name}: {reason}")]
    AccessDenied { name: String, reason: String },

    #[error("secret backend unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("secret payload for bot {name} is malformed: {reason}")]
    Malformed { name: String, reason: String },

    #[error("invalid bot name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("failed to obtain access token: {message}")]
    Auth { message: String },

    #[error("secret backend transport error: {message}")]
    Transport { message: String },
}

impl SecretError {
    /// Whether the failure is transient from the caller's perspective.
    ///
    /// The relay never retries, but the HTTP error mapping uses this to
    /// pick between 502 and 503 under the reject policy.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SecretError::ServiceUnavailable { .. } | SecretError::Transport { .. }
        )
    }
}

// ============================================================================
// Bot name validation
// ============================================================================

/// Maximum accepted bot-name length. Matches the tightest limit among the
/// backends' resource-name rules.
const MAX_BOT_NAME_LEN: usize = 127;

/// Validate a bot name before it is interpolated into a backend resource
/// path or target URL.
pub fn validate_bot_name(name: &str) -> Result<(), SecretError> {
    if name.is_empty() {
        return Err(SecretError::InvalidName {
            name: name.to_string(),
            reason: "bot name cannot be empty".to_string(),
        });
    }

    if name.len() > MAX_BOT_NAME_LEN {
        return Err(SecretError::InvalidName {
            name: name.to_string(),
            reason: format!("bot name exceeds {} characters", MAX_BOT_NAME_LEN),
        });
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SecretError::InvalidName {
            name: name.to_string(),
            reason: "bot name contains characters outside [A-Za-z0-9_-]".to_string(),
        });
    }

    Ok(())
}

/// Map a backend REST status to a [`SecretError`].
///
/// Shared by the cloud backends; `detail` carries the (truncated) response
/// body for diagnostics.
pub(crate) fn error_from_status(
    bot_name: &str,
    status: reqwest::StatusCode,
    detail: String,
) -> SecretError {
    use reqwest::StatusCode;

    match status {
        StatusCode::NOT_FOUND => SecretError::NotFound {
            name: bot_name.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SecretError::AccessDenied {
            name: bot_name.to_string(),
            reason: detail,
        },
        s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            SecretError::ServiceUnavailable {
                message: format!("{}: {}", s, detail),
            }
        }
        s => SecretError::Transport {
            message: format!("unexpected status {}: {}", s, detail),
        },
    }
}

/// Read a response body for error context, bounded and lossy.
pub(crate) async fn error_detail(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) => text.chars().take(256).collect(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
