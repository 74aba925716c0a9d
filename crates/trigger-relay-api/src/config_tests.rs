//! Tests for configuration parsing and validation.

use super::*;

fn valid_config() -> RelayConfig {
    RelayConfig {
        server: ServerConfig {
            port: 8080,
            ..ServerConfig::default()
        },
        target: TargetConfig {
            project: "myproj".to_string(),
        },
        ..RelayConfig::default()
    }
}

#[test]
fn valid_config_passes_validation() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn missing_port_fails_validation() {
    let config = RelayConfig {
        target: TargetConfig {
            project: "myproj".to_string(),
        },
        ..RelayConfig::default()
    };

    let error = config.validate().unwrap_err();

    assert!(matches!(error, ConfigError::Missing { key } if key == "server.port"));
}

#[test]
fn missing_project_fails_validation() {
    let config = RelayConfig {
        server: ServerConfig {
            port: 8080,
            ..ServerConfig::default()
        },
        ..RelayConfig::default()
    };

    let error = config.validate().unwrap_err();

    assert!(matches!(error, ConfigError::Missing { key } if key == "target.project"));
}

#[test]
fn gcs_kms_backend_requires_bucket_and_key_names() {
    let mut config = valid_config();
    config.secrets = SecretBackendConfig::GcsKms {
        bucket: String::new(),
        key_location: "global".to_string(),
        key_ring: "bot-keys".to_string(),
    };

    let error = config.validate().unwrap_err();

    assert!(matches!(error, ConfigError::Missing { key } if key == "secrets.bucket"));
}

#[test]
fn tls_requires_both_paths() {
    let mut config = valid_config();
    config.server.tls = Some(TlsConfig {
        cert_path: "/etc/relay/tls.crt".to_string(),
        key_path: String::new(),
    });

    let error = config.validate().unwrap_err();

    assert!(matches!(error, ConfigError::Missing { key } if key == "server.tls.key_path"));
}

#[test]
fn defaults_use_secret_manager_backend_and_legacy_failure_policy() {
    let config = RelayConfig::default();

    assert!(matches!(
        config.secrets,
        SecretBackendConfig::SecretManager
    ));
    assert_eq!(config.on_secret_error, SecretFailurePolicy::ForwardUnsigned);
}

#[test]
fn secret_backend_deserializes_from_tagged_form() {
    let config: RelayConfig = serde_json::from_value(serde_json::json!({
        "server": { "port": 8080 },
        "target": { "project": "myproj" },
        "secrets": {
            "backend": "gcs_kms",
            "bucket": "bot-secrets",
            "key_location": "global",
            "key_ring": "bot-keys"
        },
        "signature": { "encoding": "base64", "prefixed": false },
        "on_secret_error": "reject"
    }))
    .unwrap();

    assert!(config.validate().is_ok());
    assert!(matches!(
        config.secrets,
        SecretBackendConfig::GcsKms { ref bucket, .. } if bucket == "bot-secrets"
    ));
    assert_eq!(config.on_secret_error, SecretFailurePolicy::Reject);
    assert!(!config.signature.prefixed);
}

#[test]
fn memory_backend_deserializes_entries() {
    let config: RelayConfig = serde_json::from_value(serde_json::json!({
        "server": { "port": 8080 },
        "target": { "project": "myproj" },
        "secrets": {
            "backend": "memory",
            "entries": { "owlbot": "k" }
        }
    }))
    .unwrap();

    match config.secrets {
        SecretBackendConfig::Memory { entries } => {
            assert_eq!(entries.get("owlbot").map(String::as_str), Some("k"));
        }
        other => panic!("expected memory backend, got {:?}", other),
    }
}
