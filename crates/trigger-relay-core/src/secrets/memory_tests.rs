//! Tests for the in-memory secret store.

use super::*;

#[tokio::test]
async fn resolve_returns_stored_secret() {
    let store = MemorySecretStore::with_secrets([("owlbot", "k")]);

    let secret = store.resolve("owlbot").await.unwrap();

    assert_eq!(secret.expose_bytes(), b"k");
}

#[tokio::test]
async fn resolve_unknown_bot_is_not_found() {
    let store = MemorySecretStore::new();

    let error = store.resolve("missing-bot").await.unwrap_err();

    assert!(matches!(error, SecretError::NotFound { name } if name == "missing-bot"));
}

#[tokio::test]
async fn resolve_rejects_invalid_names() {
    let store = MemorySecretStore::with_secrets([("owlbot", "k")]);

    let error = store.resolve("").await.unwrap_err();

    assert!(matches!(error, SecretError::InvalidName { .. }));
}

#[tokio::test]
async fn add_and_remove_secret() {
    let store = MemorySecretStore::new();
    store.add_secret("bot-a", BotSecret::from_string("v1".to_string()));

    assert_eq!(store.resolve("bot-a").await.unwrap().expose_bytes(), b"v1");

    store.remove_secret("bot-a");

    assert!(store.resolve("bot-a").await.is_err());
}
