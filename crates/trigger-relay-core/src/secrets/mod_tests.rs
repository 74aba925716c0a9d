//! Tests for secret types, name validation, and error classification.

use super::*;

#[test]
fn bot_secret_debug_redacts_value() {
    let secret = BotSecret::from_string("sensitive-key".to_string());

    let debug_output = format!("{:?}", secret);

    assert!(!debug_output.contains("sensitive-key"));
    assert!(debug_output.contains("[REDACTED]"));
    assert!(debug_output.contains("13"));
}

#[test]
fn bot_secret_exposes_bytes() {
    let secret = BotSecret::from_bytes(vec![1, 2, 3]);

    assert_eq!(secret.expose_bytes(), &[1, 2, 3]);
    assert_eq!(secret.len(), 3);
    assert!(!secret.is_empty());
}

#[test]
fn bot_secret_record_parses_deployment_shape() {
    let json = r#"{"privateKey":"-----BEGIN RSA-----","appId":12345,"secret":"hook-secret"}"#;

    let record: BotSecretRecord = serde_json::from_str(json).unwrap();

    assert_eq!(record.secret, "hook-secret");
    assert_eq!(record.private_key, "-----BEGIN RSA-----");
    assert_eq!(record.app_id, 12345);
    assert_eq!(record.signing_secret().expose_bytes(), b"hook-secret");
}

#[test]
fn bot_secret_record_requires_secret_field() {
    let json = r#"{"privateKey":"pk","appId":1}"#;

    let result: Result<BotSecretRecord, _> = serde_json::from_str(json);

    assert!(result.is_err());
}

#[test]
fn bot_secret_record_debug_redacts_credentials() {
    let record: BotSecretRecord =
        serde_json::from_str(r#"{"secret":"s3cr3t","privateKey":"pk-bytes","appId":7}"#).unwrap();

    let debug_output = format!("{:?}", record);

    assert!(!debug_output.contains("s3cr3t"));
    assert!(!debug_output.contains("pk-bytes"));
}

#[test]
fn bot_name_validation_accepts_deployed_names() {
    assert!(validate_bot_name("owl_bot").is_ok());
    assert!(validate_bot_name("merge-on-green").is_ok());
    assert!(validate_bot_name("bot123").is_ok());
}

#[test]
fn bot_name_validation_rejects_empty_and_path_characters() {
    assert!(matches!(
        validate_bot_name(""),
        Err(SecretError::InvalidName { .. })
    ));
    assert!(matches!(
        validate_bot_name("../escape"),
        Err(SecretError::InvalidName { .. })
    ));
    assert!(matches!(
        validate_bot_name("bot name"),
        Err(SecretError::InvalidName { .. })
    ));
    assert!(matches!(
        validate_bot_name(&"a".repeat(128)),
        Err(SecretError::InvalidName { .. })
    ));
}

#[test]
fn status_mapping_classifies_backend_responses() {
    use reqwest::StatusCode;

    assert!(matches!(
        error_from_status("b", StatusCode::NOT_FOUND, String::new()),
        SecretError::NotFound { .. }
    ));
    assert!(matches!(
        error_from_status("b", StatusCode::FORBIDDEN, String::new()),
        SecretError::AccessDenied { .. }
    ));
    assert!(matches!(
        error_from_status("b", StatusCode::UNAUTHORIZED, String::new()),
        SecretError::AccessDenied { .. }
    ));
    assert!(matches!(
        error_from_status("b", StatusCode::SERVICE_UNAVAILABLE, String::new()),
        SecretError::ServiceUnavailable { .. }
    ));
    assert!(matches!(
        error_from_status("b", StatusCode::TOO_MANY_REQUESTS, String::new()),
        SecretError::ServiceUnavailable { .. }
    ));
    assert!(matches!(
        error_from_status("b", StatusCode::IM_A_TEAPOT, String::new()),
        SecretError::Transport { .. }
    ));
}

#[test]
fn transient_classification_covers_backend_outages_only() {
    assert!(SecretError::ServiceUnavailable {
        message: "x".to_string()
    }
    .is_transient());
    assert!(SecretError::Transport {
        message: "x".to_string()
    }
    .is_transient());

    assert!(!SecretError::NotFound {
        name: "b".to_string()
    }
    .is_transient());
    assert!(!SecretError::Malformed {
        name: "b".to_string(),
        reason: "x".to_string()
    }
    .is_transient());
}
