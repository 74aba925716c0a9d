//! Bearer-token acquisition for the cloud secret backends.
//!
//! Both cloud backends authenticate REST calls with an OAuth2 access token.
//! In production the token comes from the instance metadata server, which
//! is reachable from any deployed workload without key files. Tests and
//! local development inject a [`StaticTokenSource`].

use super::SecretError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Default metadata-server token endpoint.
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Source of bearer tokens for backend REST calls.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Obtain a token valid for the next request.
    ///
    /// Called once per backend round trip; token caching is deliberately
    /// left to the platform (the metadata server already serves cached
    /// tokens until shortly before expiry).
    async fn access_token(&self) -> Result<String, SecretError>;
}

// ============================================================================
// MetadataTokenSource
// ============================================================================

/// Fetches tokens from the instance metadata server.
pub struct MetadataTokenSource {
    client: reqwest::Client,
    token_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,

    #[serde(default)]
    #[allow(dead_code)]
    expires_in: u64,
}

impl MetadataTokenSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            token_url: METADATA_TOKEN_URL.to_string(),
        }
    }

    /// Override the token endpoint. Test hook.
    pub fn with_token_url(client: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            client,
            token_url: token_url.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for MetadataTokenSource {
    #[instrument(skip(self))]
    async fn access_token(&self) -> Result<String, SecretError> {
        let response = self
            .client
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| SecretError::Auth {
                message: format!("metadata server unreachable: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(SecretError::Auth {
                message: format!("metadata server returned {}", response.status()),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| SecretError::Auth {
            message: format!("metadata token response malformed: {}", e),
        })?;

        debug!("obtained access token from metadata server");
        Ok(token.access_token)
    }
}

// ============================================================================
// StaticTokenSource
// ============================================================================

/// Fixed token for tests and local development.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String, SecretError> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
