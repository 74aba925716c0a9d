//! Relay configuration.
//!
//! One [`RelayConfig`] is constructed at startup (file + environment via the
//! `config` crate in the service binary) and shared read-only with every
//! handler. There are no process-wide globals; anything a handler needs
//! travels through [`crate::AppState`].
//!
//! Missing required values are a startup error, not a runtime condition:
//! the binary validates and exits before binding the listener.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trigger_relay_core::SignatureFormat;

use crate::errors::ConfigError;

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Forward target settings.
    #[serde(default)]
    pub target: TargetConfig,

    /// Secret backend selection.
    #[serde(default)]
    pub secrets: SecretBackendConfig,

    /// Signature header format expected by the downstream receivers.
    #[serde(default)]
    pub signature: SignatureFormat,

    /// What to do when secret resolution fails for a request.
    #[serde(default)]
    pub on_secret_error: SecretFailurePolicy,
}

impl RelayConfig {
    /// Validate required values.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] for each required value left unset;
    /// [`ConfigError::Invalid`] for values that cannot work as given.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Missing {
                key: "server.port".to_string(),
            });
        }

        if self.target.project.is_empty() {
            return Err(ConfigError::Missing {
                key: "target.project".to_string(),
            });
        }

        if let Some(tls) = &self.server.tls {
            if tls.cert_path.is_empty() {
                return Err(ConfigError::Missing {
                    key: "server.tls.cert_path".to_string(),
                });
            }
            if tls.key_path.is_empty() {
                return Err(ConfigError::Missing {
                    key: "server.tls.key_path".to_string(),
                });
            }
        }

        match &self.secrets {
            SecretBackendConfig::GcsKms {
                bucket,
                key_location,
                key_ring,
            } => {
                if bucket.is_empty() {
                    return Err(ConfigError::Missing {
                        key: "secrets.bucket".to_string(),
                    });
                }
                if key_location.is_empty() {
                    return Err(ConfigError::Missing {
                        key: "secrets.key_location".to_string(),
                    });
                }
                if key_ring.is_empty() {
                    return Err(ConfigError::Missing {
                        key: "secrets.key_ring".to_string(),
                    });
                }
            }
            SecretBackendConfig::SecretManager => {}
            SecretBackendConfig::Memory { .. } => {}
        }

        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    /// Port to listen on. Required; there is no usable default.
    pub port: u16,

    /// Graceful shutdown timeout.
    pub shutdown_timeout_seconds: u64,

    /// Serve TLS when set; plaintext otherwise.
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            shutdown_timeout_seconds: 30,
            tls: None,
        }
    }
}

/// TLS material locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// PEM certificate chain path.
    pub cert_path: String,

    /// PEM private key path.
    pub key_path: String,
}

/// Forward target configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Project id: forms the `{location}-{project}.cloudfunctions.net`
    /// target host and the backend resource names. Required.
    pub project: String,
}

/// Which secret backend serves this deployment.
///
/// Selected once at startup; requests never switch backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum SecretBackendConfig {
    /// Encrypted object per bot in a storage bucket, decrypted through the
    /// key-management service.
    GcsKms {
        bucket: String,
        key_location: String,
        key_ring: String,
    },

    /// Managed secret per bot, latest version, JSON record.
    SecretManager,

    /// In-process map. Development and tests only.
    Memory {
        #[serde(default)]
        entries: HashMap<String, String>,
    },
}

impl Default for SecretBackendConfig {
    fn default() -> Self {
        SecretBackendConfig::SecretManager
    }
}

/// Behavior when a bot secret cannot be resolved.
///
/// The legacy deployments forwarded anyway, signing with an empty key and
/// relying on the downstream receiver to reject the invalid signature.
/// That stays the default for compatibility; `reject` turns resolution
/// failures into an error response without forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretFailurePolicy {
    /// Log, then forward with a deliberately invalid signature.
    ForwardUnsigned,

    /// Fail the request; nothing is forwarded.
    Reject,
}

impl Default for SecretFailurePolicy {
    fn default() -> Self {
        SecretFailurePolicy::ForwardUnsigned
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
