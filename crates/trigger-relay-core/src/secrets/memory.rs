//! In-memory secret backend for development and tests.

use super::{validate_bot_name, BotSecret, SecretError, SecretStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::warn;

/// Map-backed [`SecretStore`].
///
/// **Development and testing only.** Secrets held in process memory come
/// from configuration and cannot rotate; construction emits a WARN so that
/// operators notice before going to production.
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, BotSecret>>,
}

impl MemorySecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        warn!(
            "MemorySecretStore is active — in-process secrets are not safe for \
             production deployments"
        );
        Self {
            secrets: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store pre-populated from `(bot_name, secret)` pairs.
    pub fn with_secrets<I, N, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut secrets = store.secrets.write().unwrap();
            for (name, secret) in entries {
                secrets.insert(name.into(), BotSecret::from_string(secret.into()));
            }
        }
        store
    }

    /// Insert or replace a secret.
    pub fn add_secret(&self, bot_name: impl Into<String>, secret: BotSecret) {
        self.secrets.write().unwrap().insert(bot_name.into(), secret);
    }

    /// Remove a secret.
    pub fn remove_secret(&self, bot_name: &str) {
        self.secrets.write().unwrap().remove(bot_name);
    }
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn resolve(&self, bot_name: &str) -> Result<BotSecret, SecretError> {
        validate_bot_name(bot_name)?;

        self.secrets
            .read()
            .unwrap()
            .get(bot_name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound {
                name: bot_name.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
