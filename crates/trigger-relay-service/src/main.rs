//! # Trigger-Relay Service
//!
//! Binary entry point for the Trigger Relay HTTP gateway.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Selects and constructs the secret backend
//! - Starts the HTTP server from trigger-relay-api

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trigger_relay_api::{start_server, RelayConfig, SecretBackendConfig, ServiceError};
use trigger_relay_core::secrets::{
    GcsKmsSecretStore, MemorySecretStore, MetadataTokenSource, SecretManagerSecretStore,
};
use trigger_relay_core::SecretStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "trigger_relay_service=info,trigger_relay_api=info,trigger_relay_core=info,\
                 tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Trigger Relay");

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order — later sources override earlier ones):
    //  1. /etc/trigger-relay/relay.yaml    — system-wide defaults
    //  2. ./config/relay.yaml              — deployment-local override
    //  3. Path given by RELAY_CONFIG_FILE  — operator-specified file
    //  4. Environment variables prefixed RELAY (double-underscore separator)
    //     e.g. RELAY__SERVER__PORT=8080 sets server.port = 8080
    //
    // The listening port and the target project carry no usable defaults:
    // validate() fails fast and the process exits with a descriptive
    // message rather than limping along half-configured.
    // -------------------------------------------------------------------------
    let mut config_builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/trigger-relay/relay")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/relay")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Ok(explicit_path) = std::env::var("RELAY_CONFIG_FILE") {
        if !explicit_path.is_empty() {
            config_builder = config_builder.add_source(
                config::File::with_name(&explicit_path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
            info!(path = %explicit_path, "Loading configuration from explicit path");
        }
    }

    let config = match config_builder
        .add_source(config::Environment::with_prefix("RELAY").separator("__"))
        .build()
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Failed to build configuration; aborting");
            std::process::exit(3);
        }
    };

    let relay_config: RelayConfig = match config.try_deserialize() {
        Ok(rc) => rc,
        Err(e) => {
            error!(
                error = %e,
                "Could not deserialize configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(3);
        }
    };

    if let Err(e) = relay_config.validate() {
        error!(error = %e, "Configuration is invalid; aborting");
        std::process::exit(3);
    }

    let secrets = build_secret_store(&relay_config);

    info!(
        host = %relay_config.server.host,
        port = relay_config.server.port,
        project = %relay_config.target.project,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(relay_config, secrets).await {
        error!("Failed to run server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } | ServiceError::Tls { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}

// ============================================================================
// Private helpers
// ============================================================================

/// Construct the secret backend named by configuration.
///
/// Selection happens exactly once here; request handlers only ever see the
/// `SecretStore` trait object.
fn build_secret_store(config: &RelayConfig) -> Arc<dyn SecretStore> {
    let client = reqwest::Client::new();

    match &config.secrets {
        SecretBackendConfig::GcsKms {
            bucket,
            key_location,
            key_ring,
        } => {
            info!(bucket = %bucket, key_ring = %key_ring, "Using encrypted-blob secret backend");
            Arc::new(GcsKmsSecretStore::new(
                client.clone(),
                Arc::new(MetadataTokenSource::new(client)),
                config.target.project.as_str(),
                bucket.as_str(),
                key_location.as_str(),
                key_ring.as_str(),
            ))
        }
        SecretBackendConfig::SecretManager => {
            info!("Using secret-version backend");
            Arc::new(SecretManagerSecretStore::new(
                client.clone(),
                Arc::new(MetadataTokenSource::new(client)),
                config.target.project.as_str(),
            ))
        }
        SecretBackendConfig::Memory { entries } => {
            warn!(
                "Using in-memory secret backend from configuration — \
                 not safe for production deployments"
            );
            Arc::new(MemorySecretStore::with_secrets(entries.clone()))
        }
    }
}
