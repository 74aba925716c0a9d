//! Secret-version backend.
//!
//! The newer deployment model: each bot has a managed secret whose latest
//! version holds a JSON record (see
//! [`BotSecretRecord`](super::BotSecretRecord)). Only the `secret` field
//! feeds request signing.

use super::{
    error_detail, error_from_status, validate_bot_name, AccessTokenSource, BotSecret,
    BotSecretRecord, SecretError, SecretStore,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

const SECRET_MANAGER_ENDPOINT: &str = "https://secretmanager.googleapis.com";

/// Secret store backed by the managed secret-version service.
pub struct SecretManagerSecretStore {
    client: reqwest::Client,
    tokens: Arc<dyn AccessTokenSource>,
    project: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct AccessResponse {
    #[serde(default)]
    payload: AccessPayload,
}

#[derive(Default, Deserialize)]
struct AccessPayload {
    /// Base64-encoded secret bytes.
    #[serde(default)]
    data: String,
}

impl SecretManagerSecretStore {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<dyn AccessTokenSource>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            project: project.into(),
            endpoint: SECRET_MANAGER_ENDPOINT.to_string(),
        }
    }

    /// Override the service endpoint. Test hook.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SecretStore for SecretManagerSecretStore {
    #[instrument(skip(self), fields(project = %self.project))]
    async fn resolve(&self, bot_name: &str) -> Result<BotSecret, SecretError> {
        validate_bot_name(bot_name)?;

        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/v1/projects/{}/secrets/{}/versions/latest:access",
            self.endpoint, self.project, bot_name
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| SecretError::Transport {
                message: format!("secret access request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_status(
                bot_name,
                status,
                error_detail(response).await,
            ));
        }

        let access: AccessResponse =
            response.json().await.map_err(|e| SecretError::Malformed {
                name: bot_name.to_string(),
                reason: format!("access response is not valid JSON: {}", e),
            })?;

        let payload = BASE64
            .decode(&access.payload.data)
            .map_err(|e| SecretError::Malformed {
                name: bot_name.to_string(),
                reason: format!("secret payload is not valid base64: {}", e),
            })?;

        let record: BotSecretRecord =
            serde_json::from_slice(&payload).map_err(|e| SecretError::Malformed {
                name: bot_name.to_string(),
                reason: format!("secret payload is not a valid bot record: {}", e),
            })?;

        debug!(bot_name = %bot_name, "resolved secret record");
        Ok(record.signing_secret())
    }
}

#[cfg(test)]
#[path = "secret_manager_tests.rs"]
mod tests;
