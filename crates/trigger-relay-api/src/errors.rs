//! Error types for the HTTP service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};
use trigger_relay_core::SecretError;

use crate::forward::ForwardError;
use crate::rewrite::RewriteError;

/// Per-request relay failures with HTTP status mapping.
///
/// Status conventions:
///
/// - `400 Bad Request` — the inbound trigger could not name a target
/// - `502 Bad Gateway` — the forward could not be completed or (under the
///   reject policy) could never carry a valid signature
/// - `503 Service Unavailable` — a transient secret-backend failure under
///   the reject policy; the trigger source may redeliver
/// - `500 Internal Server Error` — the outbound request could not be
///   constructed
///
/// Every variant is confined to its request: nothing here panics or takes
/// the process down.
#[derive(Debug, thiserror::Error)]
pub enum RelayHandlerError {
    /// Decoding degenerated to an empty bot identity; no target host or
    /// path can be formed.
    #[error("trigger on {endpoint} endpoint does not name a bot")]
    UnroutableTrigger { endpoint: String },

    /// Secret resolution failed and the reject policy is active.
    #[error("secret resolution failed: {0}")]
    SecretResolution(#[from] SecretError),

    /// The outbound request could not be constructed.
    #[error("forward could not be constructed: {0}")]
    RewriteFailed(#[from] RewriteError),

    /// The relay to the bot failed.
    #[error("forward failed: {0}")]
    ForwardFailed(#[from] ForwardError),
}

impl IntoResponse for RelayHandlerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::UnroutableTrigger { endpoint } => {
                warn!(endpoint = %endpoint, "rejecting unroutable trigger");
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::SecretResolution(e) => {
                let status = if e.is_transient() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (status, self.to_string())
            }
            Self::RewriteFailed(e) => {
                error!(error = %e, "could not construct outbound request");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            Self::ForwardFailed(e) => {
                error!(error = %e, "forward to bot failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors. Each maps to a process exit code in the binary.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("server failed: {message}")]
    ServerFailed { message: String },

    #[error("TLS setup failed: {message}")]
    Tls { message: String },

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {key}")]
    Missing { key: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}
