//! Encrypted-blob secret backend.
//!
//! The first-generation deployment model: each bot's HMAC key is stored as an
//! encrypted object named after the bot in a storage bucket, and decrypted
//! per request through the key-management service. The crypto key path is
//! fixed by convention:
//! `projects/{project}/locations/{keyLocation}/keyRings/{keyRing}/cryptoKeys/{botName}`.

use super::{
    error_detail, error_from_status, validate_bot_name, AccessTokenSource, BotSecret, SecretError,
    SecretStore,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

const STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";
const KMS_ENDPOINT: &str = "https://cloudkms.googleapis.com";

/// Secret store backed by an object bucket plus a key-management decrypt
/// call. The decrypted plaintext is used directly as the HMAC key bytes.
pub struct GcsKmsSecretStore {
    client: reqwest::Client,
    tokens: Arc<dyn AccessTokenSource>,
    project: String,
    bucket: String,
    key_location: String,
    key_ring: String,
    storage_endpoint: String,
    kms_endpoint: String,
}

#[derive(Serialize)]
struct DecryptRequest {
    ciphertext: String,
}

#[derive(Deserialize)]
struct DecryptResponse {
    #[serde(default)]
    plaintext: String,
}

impl GcsKmsSecretStore {
    /// Create a new store.
    ///
    /// `project`, `bucket`, `key_location` and `key_ring` are validated as
    /// non-empty by configuration before this is constructed.
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<dyn AccessTokenSource>,
        project: impl Into<String>,
        bucket: impl Into<String>,
        key_location: impl Into<String>,
        key_ring: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            project: project.into(),
            bucket: bucket.into(),
            key_location: key_location.into(),
            key_ring: key_ring.into(),
            storage_endpoint: STORAGE_ENDPOINT.to_string(),
            kms_endpoint: KMS_ENDPOINT.to_string(),
        }
    }

    /// Override both service endpoints. Test hook.
    pub fn with_endpoints(
        mut self,
        storage_endpoint: impl Into<String>,
        kms_endpoint: impl Into<String>,
    ) -> Self {
        self.storage_endpoint = storage_endpoint.into();
        self.kms_endpoint = kms_endpoint.into();
        self
    }

    /// Fetch the ciphertext object named after the bot.
    #[instrument(skip(self, token))]
    async fn fetch_ciphertext(
        &self,
        bot_name: &str,
        token: &str,
    ) -> Result<Vec<u8>, SecretError> {
        let url = format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.storage_endpoint, self.bucket, bot_name
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SecretError::Transport {
                message: format!("storage request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_status(
                bot_name,
                status,
                error_detail(response).await,
            ));
        }

        let bytes = response.bytes().await.map_err(|e| SecretError::Transport {
            message: format!("storage response read failed: {}", e),
        })?;

        debug!(bot_name = %bot_name, ciphertext_len = bytes.len(), "fetched ciphertext object");
        Ok(bytes.to_vec())
    }

    /// Decrypt the ciphertext through the bot's crypto key.
    #[instrument(skip(self, token, ciphertext))]
    async fn decrypt(
        &self,
        bot_name: &str,
        token: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, SecretError> {
        let key_path = format!(
            "projects/{}/locations/{}/keyRings/{}/cryptoKeys/{}",
            self.project, self.key_location, self.key_ring, bot_name
        );
        let url = format!("{}/v1/{}:decrypt", self.kms_endpoint, key_path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&DecryptRequest {
                ciphertext: BASE64.encode(ciphertext),
            })
            .send()
            .await
            .map_err(|e| SecretError::Transport {
                message: format!("decrypt request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_status(
                bot_name,
                status,
                error_detail(response).await,
            ));
        }

        let decrypted: DecryptResponse =
            response.json().await.map_err(|e| SecretError::Malformed {
                name: bot_name.to_string(),
                reason: format!("decrypt response is not valid JSON: {}", e),
            })?;

        BASE64
            .decode(&decrypted.plaintext)
            .map_err(|e| SecretError::Malformed {
                name: bot_name.to_string(),
                reason: format!("decrypt plaintext is not valid base64: {}", e),
            })
    }
}

#[async_trait]
impl SecretStore for GcsKmsSecretStore {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn resolve(&self, bot_name: &str) -> Result<BotSecret, SecretError> {
        validate_bot_name(bot_name)?;

        let token = self.tokens.access_token().await?;
        let ciphertext = self.fetch_ciphertext(bot_name, &token).await?;
        let plaintext = self.decrypt(bot_name, &token, &ciphertext).await?;

        Ok(BotSecret::from_bytes(plaintext))
    }
}

#[cfg(test)]
#[path = "gcs_kms_tests.rs"]
mod tests;
