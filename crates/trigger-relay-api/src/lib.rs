//! # Trigger-Relay HTTP Service
//!
//! HTTP surface for the Trigger Relay gateway.
//!
//! Four trigger endpoints feed one pipeline: decode the trigger, resolve
//! the bot's shared secret, sign the raw body, rewrite the request, and
//! relay it to the bot — streaming the bot's response back to the caller.
//!
//! | Path | Trigger kind |
//! |---|---|
//! | `POST /v0` | legacy cron (kept for backward compatibility) |
//! | `POST /v0/cron` | cron |
//! | `POST /v0/pubsub` | pubsub envelope |
//! | `POST /v0/container` | container pubsub envelope |
//!
//! Every request is handled independently: the only shared state is the
//! read-only configuration and the injected collaborators in [`AppState`].

pub mod config;
pub mod errors;
pub mod forward;
pub mod rewrite;

pub use config::{
    RelayConfig, SecretBackendConfig, SecretFailurePolicy, ServerConfig, TargetConfig, TlsConfig,
};
pub use errors::{ConfigError, RelayHandlerError, ServiceError};
pub use forward::{ForwardError, Forwarder, HttpForwarder};
pub use rewrite::{OutboundRequest, RewriteError};

use axum::{
    extract::State,
    http::{HeaderMap, Method},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use bytes::Bytes;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};
use trigger_relay_core::{BotSecret, EndpointKind, SecretStore, Trigger};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Read-only service configuration.
    pub config: Arc<RelayConfig>,

    /// Secret backend selected at startup.
    pub secrets: Arc<dyn SecretStore>,

    /// Forwarding proxy.
    pub forwarder: Arc<dyn Forwarder>,
}

impl AppState {
    pub fn new(
        config: Arc<RelayConfig>,
        secrets: Arc<dyn SecretStore>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        Self {
            config,
            secrets,
            forwarder,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v0", post(handle_cron))
        .route("/v0/cron", post(handle_cron))
        .route("/v0/pubsub", post(handle_pubsub))
        .route("/v0/container", post(handle_container))
        .route("/health", get(handle_health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Trigger Handlers
// ============================================================================

async fn handle_cron(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayHandlerError> {
    relay_trigger(state, EndpointKind::Cron, method, headers, body).await
}

async fn handle_pubsub(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayHandlerError> {
    relay_trigger(state, EndpointKind::PubSub, method, headers, body).await
}

async fn handle_container(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayHandlerError> {
    relay_trigger(state, EndpointKind::ContainerPubSub, method, headers, body).await
}

/// The relay pipeline: decode → resolve → sign → rewrite → forward.
///
/// The body arrives fully buffered (the signature is computed over the
/// exact bytes that are later replayed to the forwarder) and is never
/// re-serialized.
#[instrument(skip(state, headers, body), fields(endpoint = %kind, body_len = body.len()))]
async fn relay_trigger(
    state: AppState,
    kind: EndpointKind,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayHandlerError> {
    let trigger = Trigger::decode(kind, &body);

    if !trigger.is_routable() {
        return Err(RelayHandlerError::UnroutableTrigger {
            endpoint: kind.as_str().to_string(),
        });
    }

    info!(
        bot_name = %trigger.bot_name(),
        bot_location = %trigger.bot_location(),
        "decoded trigger"
    );

    let key = match state.secrets.resolve(trigger.bot_name()).await {
        Ok(secret) => secret,
        Err(e) => {
            error!(
                bot_name = %trigger.bot_name(),
                error = %e,
                "failed to resolve bot secret"
            );
            match state.config.on_secret_error {
                SecretFailurePolicy::Reject => return Err(RelayHandlerError::SecretResolution(e)),
                SecretFailurePolicy::ForwardUnsigned => {
                    // Legacy behavior: forward anyway with an empty key.
                    // The signature will not verify downstream.
                    warn!(
                        bot_name = %trigger.bot_name(),
                        "forwarding with invalid signature"
                    );
                    BotSecret::default()
                }
            }
        }
    };

    let signature = state.config.signature.sign(&body, key.expose_bytes());

    let outbound = rewrite::rewrite(
        method,
        &headers,
        kind,
        &trigger,
        &signature,
        &state.config.target.project,
        body,
    )?;

    info!(
        url = %outbound.url,
        delivery_id = %outbound.delivery_id,
        "rewrote trigger into signed forward"
    );

    let response = state.forwarder.forward(outbound).await?;
    Ok(response)
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Liveness endpoint. The relay holds no per-process state worth a deep
/// check; reachability is the signal.
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Server
// ============================================================================

/// Start the HTTP server and block until shutdown.
///
/// Serves TLS when `server.tls` is configured, plaintext otherwise. Both
/// paths install SIGINT/SIGTERM graceful shutdown.
pub async fn start_server(
    config: RelayConfig,
    secrets: Arc<dyn SecretStore>,
) -> Result<(), ServiceError> {
    let host: IpAddr = config
        .server
        .host
        .parse()
        .map_err(|_| ConfigError::Invalid {
            message: format!("server.host {:?} is not an IP address", config.server.host),
        })
        .map_err(ServiceError::Configuration)?;
    let addr = SocketAddr::new(host, config.server.port);

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let tls = config.server.tls.clone();

    let forwarder = Arc::new(HttpForwarder::new(reqwest::Client::new()));
    let state = AppState::new(Arc::new(config), secrets, forwarder);
    let app = create_router(state);

    match tls {
        Some(tls) => {
            info!(%addr, "starting HTTPS server");

            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .map_err(|e| ServiceError::Tls {
                    message: format!(
                        "failed to load cert {:?} / key {:?}: {}",
                        tls.cert_path, tls.key_path, e
                    ),
                })?;

            let handle = axum_server::Handle::new();
            tokio::spawn({
                let handle = handle.clone();
                async move {
                    shutdown_signal().await;
                    handle.graceful_shutdown(Some(shutdown_timeout));
                }
            });

            axum_server::bind_rustls(addr, rustls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .map_err(|e| ServiceError::ServerFailed {
                    message: e.to_string(),
                })?;
        }
        None => {
            info!(%addr, "starting HTTP server");

            let listener =
                tokio::net::TcpListener::bind(addr)
                    .await
                    .map_err(|e| ServiceError::BindFailed {
                        address: addr.to_string(),
                        message: e.to_string(),
                    })?;

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .map_err(|e| ServiceError::ServerFailed {
                    message: e.to_string(),
                })?;
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolve when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received SIGINT, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("received SIGTERM, initiating graceful shutdown");
        },
    }
}
